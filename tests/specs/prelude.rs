// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared setup for specs.

pub use std::collections::BTreeSet;
pub use std::time::Duration;

pub use mf_core::IpcConfig;
pub use mf_peers::{Agent, PeerError, Plugin, StatusRecord};
pub use mf_wire::{Command, Reply};
pub use similar_asserts::assert_eq;

use tempfile::TempDir;

/// A private IPC directory with quick retries.
pub struct Fabric {
    pub config: IpcConfig,
    _dir: TempDir,
}

impl Fabric {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = IpcConfig {
            connect_retries: 20,
            retry_interval: Duration::from_millis(20),
            poll_interval: Duration::from_millis(20),
            ..IpcConfig::new(dir.path())
        };
        Self { config, _dir: dir }
    }

    pub fn agent(&self) -> Agent {
        Agent::start(&self.config).unwrap()
    }

    /// Start a plugin and register it with the agent.
    pub fn plugin(&self, name: &str) -> Plugin {
        let plugin = Plugin::start(name, &self.config).unwrap();
        assert_eq!(plugin.register().unwrap(), Reply::Ack);
        plugin
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
