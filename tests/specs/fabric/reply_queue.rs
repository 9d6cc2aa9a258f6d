// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn queued_replies_are_served_first_in_first_out() {
    let fabric = Fabric::new();
    let agent = fabric.agent();
    let sav = fabric.plugin("SAVPlugin");

    for payload in [&["policy1"][..], &["policy2"], &["ERROR", "no policy for you"]] {
        assert_eq!(
            agent.queue_reply(Command::RequestPolicy, "SAV", strings(payload)).unwrap(),
            Reply::Ack
        );
    }

    assert_eq!(sav.request_policy("SAV").unwrap(), Reply::Content(strings(&["policy1"])));
    assert_eq!(sav.request_policy("SAV").unwrap(), Reply::Content(strings(&["policy2"])));
    assert_eq!(sav.request_policy("SAV").unwrap(), Reply::Error("no policy for you".to_string()));
}

#[test]
fn exhausted_queue_falls_back_to_default_behaviour() {
    let fabric = Fabric::new();
    let agent = fabric.agent();
    let sav = fabric.plugin("SAVPlugin");

    agent.queue_reply(Command::SendEvent, "SAV", strings(&["ERROR", "busy"])).unwrap();
    assert_eq!(sav.send_event("SAV", "<event/>").unwrap(), Reply::Error("busy".to_string()));
    assert_eq!(sav.send_event("SAV", "<event/>").unwrap(), Reply::Ack);

    assert_eq!(
        sav.request_policy("SAV").unwrap(),
        Reply::Error("No policy available for SAV".to_string())
    );
}
