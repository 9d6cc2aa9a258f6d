// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mf-push: client for the MCS server-sent-events push endpoint.
//!
//! A reader thread keeps one streaming connection open, turns every
//! non-empty event into a [`PushCommand`], and wakes consumers through a
//! [`PipeChannel`] so they can multiplex it with other descriptors.

mod client;
mod config;
mod error;
mod pipe;
mod settings;
mod sse;

#[cfg(test)]
mod test_support;

pub use client::{PushClient, PushCommand, PushState, CONNECT_TIMEOUT};
pub use config::McsConfig;
pub use error::PushError;
pub use pipe::PipeChannel;
pub use settings::{PushSettings, DEFAULT_PING_TIMEOUT};
pub use sse::{SseDecoder, SseEvent};
