// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::TcpListener;

use super::*;
use crate::test_support::{eventually, SseServer};

const WAIT: Duration = Duration::from_secs(3);

fn bodies(commands: Vec<PushCommand>) -> Vec<String> {
    commands.into_iter().map(|c| c.body).collect()
}

/// Wait for the pipe, then drain.
fn receive(client: &PushClient) -> Vec<String> {
    assert!(client.wait_for_commands(WAIT), "no wakeup");
    bodies(client.pending_commands())
}

#[test]
fn command_wakes_pipe_and_is_drained_once() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    assert!(client.ensure_push_server_is_connected(&server.settings()));
    assert_eq!(client.state(), PushState::Connected);

    server.push("hello");
    assert_eq!(receive(&client), ["hello"]);
    assert!(client.pending_commands().is_empty());
    assert!(!client.wait_for_commands(Duration::from_millis(100)));
}

#[test]
fn pings_do_not_produce_commands() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    assert!(client.ensure_push_server_is_connected(&server.settings()));

    server.ping();
    assert!(!client.wait_for_commands(Duration::from_millis(300)));
    assert!(client.pending_commands().is_empty());

    server.push("after ping");
    assert_eq!(receive(&client), ["after ping"]);
}

#[test]
fn commands_keep_arrival_order() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    assert!(client.ensure_push_server_is_connected(&server.settings()));

    for body in ["first", "second", "third"] {
        server.push(body);
    }
    let deadline = std::time::Instant::now() + WAIT;
    let mut received = Vec::new();
    while received.len() < 3 && std::time::Instant::now() < deadline {
        if client.wait_for_commands(Duration::from_millis(100)) {
            received.extend(bodies(client.pending_commands()));
        }
    }
    assert_eq!(received, ["first", "second", "third"]);
}

#[test]
fn unchanged_settings_connect_once() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    let settings = server.settings();

    assert!(client.ensure_push_server_is_connected(&settings));
    assert!(client.ensure_push_server_is_connected(&settings));
    assert_eq!(client.connect_count(), 1);
    assert_eq!(server.connections(), 1);
}

#[test]
fn changed_settings_reconnect() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    let settings = server.settings();
    let slower = PushSettings { ping_timeout: Duration::from_secs(20), ..settings.clone() };

    assert!(client.ensure_push_server_is_connected(&settings));
    assert!(client.ensure_push_server_is_connected(&slower));
    assert_eq!(client.connect_count(), 2);
    assert_eq!(client.settings(), Some(&slower));
}

#[test]
fn restart_delivers_again() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    assert!(client.ensure_push_server_is_connected(&server.settings()));

    server.push("hello");
    assert_eq!(receive(&client), ["hello"]);

    client.stop();
    client.stop();
    assert_eq!(client.state(), PushState::Stopped);

    client.start().unwrap();
    server.push("another");
    assert_eq!(receive(&client), ["another"]);
}

#[test]
fn connect_failure_returns_false() {
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let settings = PushSettings::new(
        format!("http://127.0.0.1:{port}/push/endpoint/MCS-1"),
        Duration::from_secs(1),
        None,
    );
    let mut client = PushClient::new().unwrap();

    assert!(!client.ensure_push_server_is_connected(&settings));
    assert_eq!(client.state(), PushState::Stopped);
    assert_eq!(client.connect_count(), 0);
}

#[test]
fn missing_certificate_fails_to_connect() {
    let server = SseServer::start();
    let settings = PushSettings { cert_path: Some("/nonexistent/ca.pem".into()), ..server.settings() };
    let mut client = PushClient::new().unwrap();

    assert!(!client.ensure_push_server_is_connected(&settings));
    assert_eq!(server.connections(), 0);
}

#[test]
fn server_hangup_disconnects_until_ensured_again() {
    let server = SseServer::start();
    let mut client = PushClient::new().unwrap();
    let settings = server.settings();
    assert!(client.ensure_push_server_is_connected(&settings));

    server.drop_clients();
    assert!(eventually(WAIT, || client.state() == PushState::Disconnected));

    assert!(client.ensure_push_server_is_connected(&settings));
    assert_eq!(client.connect_count(), 2);
    server.push("back");
    assert_eq!(receive(&client), ["back"]);
}

#[test]
fn silence_past_ping_timeout_disconnects() {
    let server = SseServer::start();
    let settings = PushSettings { ping_timeout: Duration::from_millis(200), ..server.settings() };
    let mut client = PushClient::new().unwrap();
    assert!(client.ensure_push_server_is_connected(&settings));

    assert!(eventually(WAIT, || client.state() == PushState::Disconnected));
}

#[test]
fn start_without_settings_is_an_error() {
    let mut client = PushClient::new().unwrap();
    assert!(matches!(client.start(), Err(PushError::NotConfigured)));
}
