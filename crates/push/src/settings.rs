// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection settings for the push client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{McsConfig, PushError};

/// Longest silence tolerated on the stream when the config does not say.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);

const PUSH_SERVER_KEY: &str = "pushServer1";
const DEVICE_ID_KEY: &str = "MCSID";
const PING_TIMEOUT_KEY: &str = "pushPingTimeout";

/// Snapshot of everything a connection depends on. Equal settings mean an
/// established connection can be kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
    pub url: String,
    pub ping_timeout: Duration,
    /// PEM root certificate trusted for the push server
    pub cert_path: Option<PathBuf>,
}

impl PushSettings {
    pub fn new(url: impl Into<String>, ping_timeout: Duration, cert_path: Option<PathBuf>) -> Self {
        Self { url: url.into(), ping_timeout, cert_path }
    }

    /// `{pushServer1}/push/endpoint/{MCSID}`, with `pushPingTimeout` seconds.
    pub fn from_config(config: &McsConfig, cert_path: Option<&Path>) -> Result<Self, PushError> {
        let base = config.require(PUSH_SERVER_KEY)?;
        let device_id = config.require(DEVICE_ID_KEY)?;
        let ping_timeout = match config.get_int(PING_TIMEOUT_KEY)? {
            Some(0) | None => DEFAULT_PING_TIMEOUT,
            Some(seconds) => Duration::from_secs(seconds),
        };
        Ok(Self {
            url: format!("{}/push/endpoint/{device_id}", base.trim_end_matches('/')),
            ping_timeout,
            cert_path: cert_path.map(Path::to_path_buf),
        })
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
