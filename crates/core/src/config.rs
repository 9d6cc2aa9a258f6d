// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized IPC configuration and environment variable access.

use std::path::PathBuf;
use std::time::Duration;

use crate::endpoint::{self, Endpoint};

/// Attempts made while a rendezvous socket does not exist yet.
pub const DEFAULT_CONNECT_RETRIES: u32 = 50;

/// Sleep between connect/bind attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Budget for one request/reply round trip.
pub const DEFAULT_IPC_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a reply loop blocks in poll before re-checking its stop flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Every timing constant and path used by the IPC fabric.
///
/// Passed explicitly to every peer constructor; nothing in the fabric reads
/// process-wide state after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcConfig {
    /// Directory holding every `*.ipc` rendezvous file
    pub ipc_dir: PathBuf,
    pub connect_retries: u32,
    pub retry_interval: Duration,
    pub ipc_timeout: Duration,
    pub poll_interval: Duration,
}

impl IpcConfig {
    pub fn new(ipc_dir: impl Into<PathBuf>) -> Self {
        Self {
            ipc_dir: ipc_dir.into(),
            connect_retries: DEFAULT_CONNECT_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            ipc_timeout: DEFAULT_IPC_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build a configuration from `MF_*` environment variables, falling back
    /// to the defaults above.
    pub fn from_env() -> Self {
        Self {
            ipc_dir: ipc_dir(),
            connect_retries: connect_retries(),
            ipc_timeout: ipc_timeout(),
            ..Self::new(PathBuf::new())
        }
    }

    pub fn with_connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }

    pub fn with_ipc_timeout(mut self, timeout: Duration) -> Self {
        self.ipc_timeout = timeout;
        self
    }

    /// `ipc://{IPC_DIR}/fake_management_controller.ipc`
    pub fn agent_endpoint(&self) -> Endpoint {
        Endpoint::from_path(self.ipc_dir.join(endpoint::AGENT_SOCKET))
    }

    /// `ipc://{IPC_DIR}/fake_plugin_controller_{plugin_name}.ipc`
    pub fn plugin_endpoint(&self, plugin_name: &str) -> Endpoint {
        Endpoint::from_path(self.ipc_dir.join(endpoint::plugin_socket_name(plugin_name)))
    }

    /// Rendezvous publishers connect to.
    pub fn publisher_endpoint(&self) -> Endpoint {
        Endpoint::from_path(self.ipc_dir.join(endpoint::PUBLISHER_SOCKET))
    }

    /// Rendezvous subscribers connect to.
    pub fn subscriber_endpoint(&self) -> Endpoint {
        Endpoint::from_path(self.ipc_dir.join(endpoint::SUBSCRIBER_SOCKET))
    }
}

/// Resolve the IPC directory: MF_IPC_DIR > $TMPDIR/mf-ipc
pub fn ipc_dir() -> PathBuf {
    match std::env::var("MF_IPC_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("mf-ipc"),
    }
}

/// Request/reply timeout override (`MF_IPC_TIMEOUT_MS`)
pub fn ipc_timeout() -> Duration {
    std::env::var("MF_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_IPC_TIMEOUT)
}

/// Connect retry override (`MF_CONNECT_RETRIES`)
pub fn connect_retries() -> u32 {
    std::env::var("MF_CONNECT_RETRIES")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_CONNECT_RETRIES)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
