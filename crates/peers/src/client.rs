// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request side of a request/reply exchange.

use mf_core::{transport, Endpoint, IpcConfig};
use mf_wire::{recv_message, send_message, Message, Reply};
use tracing::debug;
use uuid::Uuid;

use crate::PeerError;

/// Send one request to `endpoint` and wait for its reply.
///
/// A correlation id is generated when the caller did not set one, and the
/// reply must echo it.
pub(crate) fn round_trip(
    config: &IpcConfig,
    endpoint: &Endpoint,
    mut request: Message,
) -> Result<Reply, PeerError> {
    if request.correlation_id.is_empty() {
        request.correlation_id = Uuid::new_v4().to_string();
    }
    let mut stream = transport::connect(config, endpoint)?;
    send_message(&mut stream, &request)?;
    let reply = recv_message(&mut stream)?;
    debug!(
        %endpoint,
        command = %request.command,
        app_id = %request.app_id,
        correlation_id = %request.correlation_id,
        "reply received"
    );
    if reply.correlation_id != request.correlation_id {
        return Err(PeerError::CorrelationMismatch {
            expected: request.correlation_id,
            got: reply.correlation_id,
        });
    }
    Ok(reply.into_reply()?)
}
