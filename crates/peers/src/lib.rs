// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mf-peers: test doubles for the management agent and its plugins, plus the
//! pub/sub data channel they share.
//!
//! Each peer serves its reply socket from a dedicated thread. Requests are
//! half-duplex: one outstanding request per call, answered with an ack, an
//! error, or content.

pub mod agent;
mod client;
mod error;
pub mod plugin;
pub mod pubsub;
mod record;
mod server;

#[cfg(test)]
mod test_support;

pub use agent::{Agent, AgentClient};
pub use error::PeerError;
pub use plugin::{Plugin, PluginClient};
pub use record::{PluginRecord, StatusRecord};
