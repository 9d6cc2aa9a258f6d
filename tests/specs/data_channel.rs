// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publisher handshake and subscriber queue semantics.

use mf_peers::pubsub::{DataChannelProxy, PubSubError, Publisher, Subscriber};

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn publisher_construction_proves_delivery() {
    let fabric = Fabric::new();
    let _proxy = DataChannelProxy::start(&fabric.config).unwrap();

    let publisher = Publisher::start("EventJournaler", &fabric.config).unwrap();
    assert!(publisher.startup_witness().received_first_message());
}

#[test]
fn unused_channel_is_distinct_from_empty_channel() {
    let fabric = Fabric::new();
    let _proxy = DataChannelProxy::start(&fabric.config).unwrap();
    let mut subscriber =
        Subscriber::new("reader", vec!["Detections".to_string()], &fabric.config);
    subscriber.start().unwrap();
    let mut publisher = Publisher::start("writer", &fabric.config).unwrap();

    // Keep publishing until the subscriber is known to be attached.
    let mut first = None;
    for _ in 0..50 {
        publisher.send_text("Detections", "threat").unwrap();
        if let Ok(message) = subscriber.get_next_text("Detections", Duration::from_millis(100)) {
            first = Some(message);
            break;
        }
    }
    assert_eq!(first.as_deref(), Some("threat"));
    publisher.close_socket().unwrap();
    while subscriber.get_next_message("Detections", Duration::from_millis(100)).is_ok() {}

    let unused = subscriber.get_next_message("unused-channel", Duration::from_secs(1));
    assert!(matches!(unused, Err(PubSubError::NoQueueAvailable(_))));

    let empty = subscriber.get_next_message("Detections", Duration::from_secs(1));
    assert!(matches!(empty, Err(PubSubError::QueueEmpty { .. })));
}
