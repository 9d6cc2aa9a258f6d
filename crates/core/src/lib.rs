// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mf-core: IPC configuration, endpoint addressing and the transport socket
//! helper shared by the fake management agent, fake plugins and the
//! pub/sub data channel.

pub mod config;
pub mod endpoint;
pub mod transport;

pub use config::IpcConfig;
pub use endpoint::Endpoint;
pub use transport::{get_socket, BoundListener, Socket, SocketMode, TransportError};
