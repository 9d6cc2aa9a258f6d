// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for peer tests.

use std::time::Duration;

use mf_core::IpcConfig;
use tempfile::TempDir;

/// A private IPC directory with short timeouts, removed on drop.
pub(crate) struct TestIpc {
    pub config: IpcConfig,
    _dir: TempDir,
}

impl TestIpc {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = IpcConfig {
            connect_retries: 20,
            retry_interval: Duration::from_millis(20),
            ipc_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(20),
            ..IpcConfig::new(dir.path())
        };
        Self { config, _dir: dir }
    }
}
