// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;

use mf_core::TransportError;
use mf_wire::{Command, ProtocolError};
use thiserror::Error;

/// Errors raised locally by a peer. Failures on the remote side come back
/// as `Reply::Error` instead.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Bad arguments, detected before any I/O
    #[error("{0}")]
    Precondition(String),

    #[error("agent is not running")]
    NotRunning,

    #[error("reply correlation id {got:?} does not match request {expected:?}")]
    CorrelationMismatch { expected: String, got: String },

    #[error("{command} reply is not usable: {reply}")]
    UnexpectedReply { command: Command, reply: String },

    #[error("failed to start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },
}
