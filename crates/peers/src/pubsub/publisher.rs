// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-channel publisher.
//!
//! Publishing is fire-and-forget, so a new publisher proves it is attached
//! before it is returned: it starts a throwaway subscriber on
//! `{name}-StartUp` and repeats a marker there until the subscriber has seen
//! one. Closing repeats the exchange on `{name}-ShutDown` so the last real
//! message is known to be through before the socket goes away.

use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use mf_core::{transport, IpcConfig, SocketMode};
use tracing::{debug, info, warn};

use super::frame::{write_data, DataMessage};
use super::subscriber::Subscriber;
use super::PubSubError;

pub const STARTUP_TAG: &str = "StartUp";
pub const SHUTDOWN_TAG: &str = "ShutDown";
pub const HANDSHAKE_MARKER: &[u8] = b"handshake";

pub const DEFAULT_HANDSHAKE_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Gap between markers
    pub interval: Duration,
    /// Overall budget before giving up
    pub timeout: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_HANDSHAKE_INTERVAL, timeout: DEFAULT_HANDSHAKE_TIMEOUT }
    }
}

pub struct Publisher {
    name: String,
    config: IpcConfig,
    handshake: HandshakeConfig,
    stream: Option<UnixStream>,
    startup: Subscriber,
}

impl Publisher {
    /// Connect and complete the start-up handshake.
    pub fn start(name: impl Into<String>, config: &IpcConfig) -> Result<Self, PubSubError> {
        Self::start_with(name, config, HandshakeConfig::default())
    }

    pub fn start_with(
        name: impl Into<String>,
        config: &IpcConfig,
        handshake: HandshakeConfig,
    ) -> Result<Self, PubSubError> {
        let name = name.into();
        let endpoint = config.publisher_endpoint();
        let socket = transport::get_socket(config, &endpoint, SocketMode::Publish)?;
        let Some(mut stream) = socket.into_stream() else {
            return Err(PubSubError::Closed(name));
        };
        let startup = prove_attached(&mut stream, &name, STARTUP_TAG, config, &handshake)?;
        info!(publisher = %name, "publisher ready");
        Ok(Self { name, config: config.clone(), handshake, stream: Some(stream), startup })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The throwaway subscriber used for the start-up handshake.
    pub fn startup_witness(&self) -> &Subscriber {
        &self.startup
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), PubSubError> {
        let stream = self.stream.as_mut().ok_or_else(|| PubSubError::Closed(self.name.clone()))?;
        write_data(stream, &DataMessage::new(topic, payload))?;
        debug!(publisher = %self.name, topic, bytes = payload.len(), "published");
        Ok(())
    }

    pub fn send_text(&mut self, topic: &str, text: &str) -> Result<(), PubSubError> {
        self.send(topic, text.as_bytes())
    }

    /// Flush with the shut-down handshake, then close. Idempotent.
    pub fn close_socket(&mut self) -> Result<(), PubSubError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        let result =
            prove_attached(&mut stream, &self.name, SHUTDOWN_TAG, &self.config, &self.handshake);
        self.startup.stop();
        let mut witness = result?;
        witness.stop();
        info!(publisher = %self.name, "publisher closed");
        Ok(())
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        if self.stream.is_some() {
            if let Err(e) = self.close_socket() {
                warn!(publisher = %self.name, error = %e, "publisher closed without handshake");
            }
        }
    }
}

/// Send markers on `{name}-{tag}` until a fresh subscriber to that channel
/// has received one. The subscriber is returned still listening.
fn prove_attached(
    stream: &mut UnixStream,
    name: &str,
    tag: &str,
    config: &IpcConfig,
    handshake: &HandshakeConfig,
) -> Result<Subscriber, PubSubError> {
    let channel = format!("{name}-{tag}");
    let mut witness = Subscriber::new(format!("{channel}-witness"), vec![channel.clone()], config);
    witness.start()?;

    let deadline = Instant::now() + handshake.timeout;
    let mut attempts = 0u32;
    loop {
        write_data(stream, &DataMessage::new(channel.as_str(), HANDSHAKE_MARKER))?;
        attempts += 1;
        if witness.wait_for_first_message(handshake.interval) {
            debug!(%channel, attempts, "handshake proven");
            return Ok(witness);
        }
        if Instant::now() >= deadline {
            warn!(%channel, attempts, "handshake timed out");
            witness.stop();
            return Err(PubSubError::HandshakeTimeout { channel, attempts });
        }
    }
}
