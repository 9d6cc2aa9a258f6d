// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration taken from `MF_*` variables.

use serial_test::serial;

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
#[serial]
fn ipc_dir_comes_from_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("MF_IPC_DIR", dir.path());
    std::env::set_var("MF_CONNECT_RETRIES", "7");
    let config = IpcConfig::from_env();
    std::env::remove_var("MF_IPC_DIR");
    std::env::remove_var("MF_CONNECT_RETRIES");

    assert_eq!(config.connect_retries, 7);
    let agent = Agent::start(&config).unwrap();
    assert!(dir.path().join("fake_management_controller.ipc").exists());
    assert_eq!(agent.endpoint().path(), dir.path().join("fake_management_controller.ipc"));
}
