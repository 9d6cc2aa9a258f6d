// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ipc://` endpoint addresses.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::transport::TransportError;

pub const IPC_SCHEME: &str = "ipc://";

pub const AGENT_SOCKET: &str = "fake_management_controller.ipc";
pub const PUBLISHER_SOCKET: &str = "publisherdatachannel.ipc";
pub const SUBSCRIBER_SOCKET: &str = "subscriberdatachannel.ipc";

pub fn plugin_socket_name(plugin_name: &str) -> String {
    format!("fake_plugin_controller_{plugin_name}.ipc")
}

/// A filesystem-backed socket address, written `ipc://{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: PathBuf,
}

impl Endpoint {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse an `ipc://` address. Other transports are not supported.
    pub fn parse(address: &str) -> Result<Self, TransportError> {
        match address.strip_prefix(IPC_SCHEME) {
            Some(path) if !path.is_empty() => Ok(Self::from_path(path)),
            _ => Err(TransportError::InvalidAddress(address.to_string())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", IPC_SCHEME, self.path.display())
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
