// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn status_round_trip() {
    let fabric = Fabric::new();
    let agent = fabric.agent();
    let sav = fabric.plugin("SAVPlugin");
    agent.link_appid_plugin("SAV", "SAVPlugin").unwrap();

    assert_eq!(sav.send_status("SAV", "StatusXML", "StatusWithoutXML").unwrap(), Reply::Ack);

    let records = agent.registered_plugins().unwrap();
    let record = records.iter().find(|r| r.name == "SAVPlugin").unwrap();
    assert_eq!(
        record.get_statuses("SAV")[0].to_contents(),
        strings(&["StatusXML", "StatusWithoutXML"])
    );

    // The plugin also answers the agent's own status request.
    assert_eq!(
        agent.request_status("SAV", "").unwrap(),
        Reply::Content(strings(&["StatusXML", "StatusWithoutXML"]))
    );
}
