// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration, linking and policy broadcast across three plugins.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn registration_and_broadcast() {
    let fabric = Fabric::new();
    let agent = fabric.agent();
    let update = fabric.plugin("UpdatePlugin");
    let update_two = fabric.plugin("UpdatePluginTwo");
    let sav = fabric.plugin("SAVPlugin");

    agent.link_appid_plugin("ALC", "UpdatePlugin").unwrap();
    agent.link_appid_plugin("ALC", "UpdatePluginTwo").unwrap();
    agent.link_appid_plugin("SAV", "SAVPlugin").unwrap();

    let names: BTreeSet<String> = agent.get_registered_plugins().unwrap().into_iter().collect();
    let expected: BTreeSet<String> =
        strings(&["UpdatePlugin", "UpdatePluginTwo", "SAVPlugin"]).into_iter().collect();
    assert_eq!(names, expected);

    assert_eq!(agent.apply_policy("ALC", "Example ALC policy").unwrap(), Reply::Ack);
    assert_eq!(update.get_policy("ALC").unwrap().as_deref(), Some("Example ALC policy"));
    assert_eq!(update_two.get_policy("ALC").unwrap().as_deref(), Some("Example ALC policy"));
    // SAVPlugin is not linked to ALC, so it has nothing to report for it.
    assert!(matches!(sav.get_policy("ALC"), Err(PeerError::Precondition(_))));

    assert_eq!(agent.do_action("ALC", "UpdatePlugin", "ACL Action").unwrap(), Reply::Ack);
    assert_eq!(update.get_action("ALC").unwrap().as_deref(), Some("ACL Action"));
    assert_eq!(update_two.get_action("ALC").unwrap(), None);
}

#[test]
fn named_plugin_on_an_unlinked_app_id_is_not_contacted() {
    let fabric = Fabric::new();
    let agent = fabric.agent();
    let sav = fabric.plugin("SAVPlugin");
    agent.link_appid_plugin("SAV", "SAVPlugin").unwrap();

    let reply = agent.do_action("MCS", "SAVPlugin", "<action/>").unwrap();
    assert!(reply.error_message().is_some_and(|m| m.contains("MCS")), "{reply:?}");
    assert!(matches!(sav.get_action("MCS"), Err(PeerError::Precondition(_))));
}

#[test]
fn agent_refuses_work_after_stop() {
    let fabric = Fabric::new();
    let mut agent = fabric.agent();
    agent.stop();
    assert!(matches!(agent.apply_policy("ALC", "p"), Err(PeerError::NotRunning)));
}
