// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply loop shared by the agent and plugin peers.
//!
//! The loop owns the bound reply socket and runs on its own thread. It polls
//! the listener with a bounded timeout so a stop request is observed
//! promptly, serves one request per connection, and never lets a malformed
//! frame take it down.

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use mf_core::{transport, BoundListener, Endpoint, IpcConfig};
use mf_wire::{decode, read_frame, send_message, Message, ProtocolError};
use tracing::{debug, error, info, warn};

use crate::PeerError;

/// Whether the loop keeps serving after a reply is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Services requests arriving on a reply socket.
pub(crate) trait Handler: Send + 'static {
    fn handle(&mut self, request: Message) -> (Message, Flow);
}

/// A running reply loop. Stopped and joined on drop.
pub(crate) struct ReplyLoop {
    endpoint: Endpoint,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReplyLoop {
    /// Bind `endpoint` and start serving it with `handler`.
    ///
    /// Binding happens on the caller's thread so a bad endpoint fails here.
    pub fn spawn<H: Handler>(
        name: &str,
        config: &IpcConfig,
        endpoint: Endpoint,
        handler: H,
    ) -> Result<Self, PeerError> {
        let listener = transport::bind(config, &endpoint)?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            let config = config.clone();
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || serve(listener, handler, &config, &stop))
                .map_err(|source| PeerError::Spawn { name: name.to_string(), source })?
        };
        info!(%endpoint, name, "reply loop started");
        Ok(Self { endpoint, stop, thread: Some(thread) })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// True until the loop thread has exited, whether by `stop()` or by a
    /// handler returning `Flow::Stop`.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Ask the loop to stop and wait for it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(endpoint = %self.endpoint, "reply loop panicked");
            }
            debug!(endpoint = %self.endpoint, "reply loop joined");
        }
    }
}

impl Drop for ReplyLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve<H: Handler>(listener: BoundListener, mut handler: H, config: &IpcConfig, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept_timeout(config.poll_interval) {
            Ok(None) => continue,
            Ok(Some(stream)) => {
                if serve_connection(stream, &mut handler, config) == Flow::Stop {
                    info!(path = %listener.path().display(), "reply loop stopping on request");
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "accept failed");
                thread::sleep(config.poll_interval);
            }
        }
    }
}

fn serve_connection<H: Handler>(
    mut stream: UnixStream,
    handler: &mut H,
    config: &IpcConfig,
) -> Flow {
    if let Err(e) = transport::set_timeouts(&stream, config.ipc_timeout) {
        warn!(error = %e, "failed to set socket timeouts");
    }

    let frame = match read_frame(&mut stream) {
        Ok(frame) => frame,
        Err(ProtocolError::ConnectionClosed) => {
            debug!("requester disconnected");
            return Flow::Continue;
        }
        Err(e) => {
            warn!(error = %e, "failed to read request");
            return Flow::Continue;
        }
    };

    let (reply, flow) = match decode(&frame) {
        Ok(request) if request.is_request() => handler.handle(request),
        Ok(other) => {
            warn!(command = %other.command, "received a reply where a request was expected");
            (other.reply(mf_wire::Reply::Error("expected a request".to_string())), Flow::Continue)
        }
        Err(e) => {
            warn!(error = %e, "rejecting malformed request");
            let mut rejection = Message::rejection(e.to_string());
            rejection.correlation_id = correlation_id_of(&frame);
            (rejection, Flow::Continue)
        }
    };

    if let Err(e) = send_message(&mut stream, &reply) {
        warn!(error = %e, command = %reply.command, "failed to write reply");
    }
    flow
}

/// Best-effort recovery of the correlation id from an undecodable frame, so
/// the requester can still match the rejection to its request.
fn correlation_id_of(frame: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(frame)
        .ok()
        .and_then(|v| v.get("correlation_id").and_then(|c| c.as_str()).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
