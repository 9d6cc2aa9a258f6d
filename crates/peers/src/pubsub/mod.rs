// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic-based data channel.
//!
//! Publishers connect to `publisherdatachannel.ipc`, subscribers to
//! `subscriberdatachannel.ipc`, and a [`DataChannelProxy`] bound on both
//! forwards every message to the subscribers whose prefixes match its topic.
//! Delivery is fire-and-forget; a [`Publisher`] proves it is attached with a
//! handshake before it is handed out.

mod frame;
mod proxy;
mod publisher;
mod subscriber;

use std::io;
use std::time::Duration;

use mf_core::TransportError;
use mf_wire::ProtocolError;
use thiserror::Error;

pub use frame::DataMessage;
pub use proxy::DataChannelProxy;
pub use publisher::{HandshakeConfig, Publisher, HANDSHAKE_MARKER, SHUTDOWN_TAG, STARTUP_TAG};
pub use subscriber::{ScopeMarker, Subscriber, SubscriberConfig, SubscriberState};

#[derive(Debug, Error)]
pub enum PubSubError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Nothing was ever received on the channel
    #[error("no queue available for channel {0}")]
    NoQueueAvailable(String),

    /// The channel has been seen, but no new message arrived in time
    #[error("no new message on channel {channel} within {timeout:?}")]
    QueueEmpty { channel: String, timeout: Duration },

    #[error("handshake on {channel} not proven after {attempts} markers")]
    HandshakeTimeout { channel: String, attempts: u32 },

    #[error("{0} is closed")]
    Closed(String),

    #[error("failed to start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
#[path = "pubsub_tests.rs"]
mod tests;
