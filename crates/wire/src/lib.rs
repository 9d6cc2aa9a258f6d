// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin-management IPC protocol.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod command;
mod message;
mod wire;

pub use command::Command;
pub use message::{Message, Payload, Reply, ACK_SENTINEL, ERROR_SENTINEL};
pub use wire::{decode, encode, read_frame, recv_message, send_message, write_frame};
pub use wire::{ProtocolError, MAX_FRAME_LEN};
