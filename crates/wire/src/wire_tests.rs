// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format tests: length-prefix framing and JSON encoding.

use super::*;
use crate::{Payload, Reply};

#[test]
fn encode_returns_json_without_length_prefix() {
    let message = Message::request("p", Command::Registration, "", vec![]);
    let encoded = encode(&message).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {}", json_str);
}

#[test]
fn write_frame_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_frame(&mut buffer, data).expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[test]
fn send_recv_message_roundtrip() {
    let message = Message::request("UpdatePlugin", Command::DoAction, "ALC", vec!["go".into()])
        .with_correlation_id("abc");

    let mut buffer = Vec::new();
    send_message(&mut buffer, &message).expect("write failed");

    let mut cursor = std::io::Cursor::new(buffer);
    assert_eq!(recv_message(&mut cursor).expect("read failed"), message);
}

#[test]
fn empty_reader_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    assert!(matches!(read_frame(&mut cursor), Err(ProtocolError::ConnectionClosed)));
}

#[test]
fn oversized_prefix_is_rejected() {
    let mut cursor = std::io::Cursor::new(u32::MAX.to_be_bytes().to_vec());
    assert!(matches!(read_frame(&mut cursor), Err(ProtocolError::FrameTooLarge(_))));
}

#[test]
fn garbled_bytes_fail_to_decode() {
    assert!(matches!(decode(b"\x00\x01not json"), Err(ProtocolError::Decode(_))));
    assert!(matches!(decode(br#"{"plugin_name":"p"}"#), Err(ProtocolError::Decode(_))));
}

#[test]
fn unknown_command_is_distinguished() {
    let json = br#"{"plugin_name":"p","command":"PluginSelfDestruct","app_id":"","correlation_id":"","payload":{"type":"Request","contents":[]}}"#;
    match decode(json) {
        Err(ProtocolError::UnknownCommand(name)) => assert_eq!(name, "PluginSelfDestruct"),
        other => panic!("expected UnknownCommand, got {other:?}"),
    }
}

#[test]
fn missing_optional_fields_default() {
    let json = br#"{"command":"Registration","payload":{"type":"Request"}}"#;
    let message = decode(json).unwrap();
    assert_eq!(message.plugin_name, "");
    assert_eq!(message.app_id, "");
    assert_eq!(message.payload, Payload::Request { contents: vec![] });
}

#[test]
fn empty_content_reply_is_not_an_ack() {
    let request = Message::request("p", Command::RequestTelemetry, "", vec![]);
    let reply = request.reply(Reply::Content(vec![]));
    let decoded = decode(&encode(&reply).unwrap()).unwrap();
    assert_eq!(decoded.into_reply().unwrap(), Reply::Content(vec![]));
}
