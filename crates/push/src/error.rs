// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    /// Missing or malformed MCS configuration
    #[error("{0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),

    #[error("push client has no settings")]
    NotConfigured,

    #[error("notification pipe failed: {0}")]
    Pipe(#[source] io::Error),

    #[error("failed to start push reader: {0}")]
    Spawn(#[source] io::Error),

    #[error("push reader exited before connecting")]
    ReaderGone,
}
