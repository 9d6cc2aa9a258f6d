// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{Read, Write};
use std::time::Instant;

use super::*;
use tempfile::tempdir;

fn fast_config(dir: &Path) -> IpcConfig {
    IpcConfig {
        connect_retries: 3,
        retry_interval: Duration::from_millis(10),
        ..IpcConfig::new(dir)
    }
}

#[test]
fn connect_fails_after_bounded_retries() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let endpoint = config.agent_endpoint();

    let started = Instant::now();
    let err = get_socket(&config, &endpoint, SocketMode::Request).unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    match err {
        TransportError::SocketUnavailable { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected SocketUnavailable, got {other:?}"),
    }
}

#[test]
fn connect_waits_for_late_binder() {
    let dir = tempdir().unwrap();
    let config = IpcConfig {
        connect_retries: 50,
        retry_interval: Duration::from_millis(20),
        ..IpcConfig::new(dir.path())
    };
    let endpoint = config.plugin_endpoint("Late");

    let binder = {
        let config = config.clone();
        let endpoint = endpoint.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            let listener = bind(&config, &endpoint).unwrap();
            let mut stream = listener.accept_timeout(Duration::from_secs(5)).unwrap().unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            buf
        })
    };

    let mut stream = connect(&config, &endpoint).unwrap();
    stream.write_all(b"ping").unwrap();
    assert_eq!(&binder.join().unwrap(), b"ping");
}

#[test]
fn bind_replaces_stale_socket_file_and_creates_dir() {
    let dir = tempdir().unwrap();
    let config = fast_config(&dir.path().join("nested"));
    let endpoint = config.agent_endpoint();

    let first = bind(&config, &endpoint).unwrap();
    std::mem::forget(first);
    assert!(endpoint.path().exists());

    let second = get_socket(&config, &endpoint, SocketMode::Reply).unwrap().into_listener();
    assert!(second.is_some());
}

#[test]
fn dropping_listener_removes_socket_file() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let endpoint = config.agent_endpoint();

    let listener = bind(&config, &endpoint).unwrap();
    assert!(listener.path().exists());
    drop(listener);
    assert!(!endpoint.path().exists());
}

#[test]
fn accept_timeout_returns_none_when_idle() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let listener = bind(&config, &config.agent_endpoint()).unwrap();

    let accepted = listener.accept_timeout(Duration::from_millis(50)).unwrap();
    assert!(accepted.is_none());
}
