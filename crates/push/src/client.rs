// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push client state machine.
//!
//! `Stopped -> Starting -> Connected -> Disconnected`, back to `Stopped` on
//! `stop()`. The reader thread owns a current-thread tokio runtime and the
//! streaming response; the consumer only sees the pending-command list and
//! the notification pipe, which are always updated together.

use std::os::fd::{AsFd, BorrowedFd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{PipeChannel, PushError, PushSettings, SseDecoder, SseEvent};

/// Budget for establishing the stream, TLS and response headers included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    Stopped,
    Starting,
    Connected,
    /// The stream failed, ended or went silent; reconnect with
    /// `ensure_push_server_is_connected`.
    Disconnected,
}

/// A non-ping event waiting for the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCommand {
    pub event: Option<String>,
    pub id: Option<String>,
    pub body: String,
}

impl From<SseEvent> for PushCommand {
    fn from(event: SseEvent) -> Self {
        Self { event: event.event, id: event.id, body: event.data }
    }
}

#[derive(Debug)]
struct Shared {
    commands: Mutex<Vec<PushCommand>>,
    pipe: PipeChannel,
    state: Mutex<PushState>,
    connects: AtomicUsize,
}

impl Shared {
    fn set_state(&self, state: PushState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!(from = ?*current, to = ?state, "push state");
            *current = state;
        }
    }

    fn deliver(&self, event: SseEvent) {
        if event.is_ping() {
            debug!("push ping");
            return;
        }
        let mut commands = self.commands.lock();
        debug!(event = ?event.event, id = ?event.id, bytes = event.data.len(), "push command");
        commands.push(PushCommand::from(event));
        if let Err(e) = self.pipe.notify() {
            warn!(error = %e, "failed to signal push pipe");
        }
    }
}

pub struct PushClient {
    settings: Option<PushSettings>,
    shared: Arc<Shared>,
    cancel: Option<CancellationToken>,
    reader: Option<JoinHandle<()>>,
}

impl PushClient {
    pub fn new() -> Result<Self, PushError> {
        let shared = Shared {
            commands: Mutex::new(Vec::new()),
            pipe: PipeChannel::new().map_err(PushError::Pipe)?,
            state: Mutex::new(PushState::Stopped),
            connects: AtomicUsize::new(0),
        };
        Ok(Self { settings: None, shared: Arc::new(shared), cancel: None, reader: None })
    }

    /// Make sure a stream to `settings` is up.
    ///
    /// A no-op while connected with equal settings. Changed settings, or a
    /// dropped stream, reconnect. Connection failures are logged and
    /// reported as `false`.
    pub fn ensure_push_server_is_connected(&mut self, settings: &PushSettings) -> bool {
        if self.settings.as_ref() == Some(settings) && self.state() == PushState::Connected {
            debug!(url = %settings.url, "push server already connected");
            return true;
        }
        if self.settings.as_ref().is_some_and(|current| current != settings) {
            info!(url = %settings.url, "push settings changed, reconnecting");
        }
        self.settings = Some(settings.clone());
        match self.start() {
            Ok(()) => true,
            Err(e) => {
                warn!(url = %settings.url, error = %e, "push server connection failed");
                false
            }
        }
    }

    /// (Re)connect with the current settings. Any running reader is stopped
    /// first.
    pub fn start(&mut self) -> Result<(), PushError> {
        let settings = self.settings.clone().ok_or(PushError::NotConfigured)?;
        self.stop();
        self.shared.set_state(PushState::Starting);

        let cancel = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let reader = {
            let shared = Arc::clone(&self.shared);
            let cancel = cancel.clone();
            thread::Builder::new()
                .name("push-reader".to_string())
                .spawn(move || run_reader(settings, shared, cancel, ready_tx))
                .map_err(|e| {
                    self.shared.set_state(PushState::Stopped);
                    PushError::Spawn(e)
                })?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.cancel = Some(cancel);
                self.reader = Some(reader);
                Ok(())
            }
            Ok(Err(e)) => {
                join(reader);
                self.shared.set_state(PushState::Stopped);
                Err(e)
            }
            Err(_) => {
                join(reader);
                self.shared.set_state(PushState::Stopped);
                Err(PushError::ReaderGone)
            }
        }
    }

    /// Close the stream and join the reader. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(reader) = self.reader.take() {
            join(reader);
            info!("push client stopped");
        }
        self.shared.set_state(PushState::Stopped);
    }

    pub fn state(&self) -> PushState {
        *self.shared.state.lock()
    }

    pub fn settings(&self) -> Option<&PushSettings> {
        self.settings.as_ref()
    }

    /// Streams successfully opened over this client's lifetime.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Take every command received so far, oldest first, and clear the
    /// notification pipe.
    pub fn pending_commands(&self) -> Vec<PushCommand> {
        let mut commands = self.shared.commands.lock();
        if let Err(e) = self.shared.pipe.clear() {
            warn!(error = %e, "failed to clear push pipe");
        }
        std::mem::take(&mut *commands)
    }

    /// Descriptor that polls readable while commands are pending.
    pub fn notify_fd(&self) -> BorrowedFd<'_> {
        self.shared.pipe.as_fd()
    }

    /// Block up to `timeout` for pending commands.
    pub fn wait_for_commands(&self, timeout: Duration) -> bool {
        match self.shared.pipe.wait_readable(timeout) {
            Ok(ready) => ready,
            Err(e) => {
                warn!(error = %e, "push pipe poll failed");
                false
            }
        }
    }
}

impl Drop for PushClient {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join(reader: JoinHandle<()>) {
    if reader.join().is_err() {
        error!("push reader panicked");
    }
}

fn run_reader(
    settings: PushSettings,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    ready: SyncSender<Result<(), PushError>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready.send(Err(PushError::Spawn(e)));
            return;
        }
    };
    runtime.block_on(read_stream(&settings, &shared, &cancel, ready));
}

async fn connect(settings: &PushSettings) -> Result<reqwest::Response, PushError> {
    let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT).no_proxy();
    if let Some(path) = &settings.cert_path {
        let pem = tokio::fs::read(path)
            .await
            .map_err(|source| PushError::ReadFile { path: path.display().to_string(), source })?;
        builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
    }
    let client = builder.build()?;
    let request = client
        .get(&settings.url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send();
    let response = tokio::time::timeout(CONNECT_TIMEOUT, request)
        .await
        .map_err(|_| PushError::ConnectTimeout(settings.url.clone()))??;
    Ok(response.error_for_status()?)
}

async fn read_stream(
    settings: &PushSettings,
    shared: &Shared,
    cancel: &CancellationToken,
    ready: SyncSender<Result<(), PushError>>,
) {
    let response = match connect(settings).await {
        Ok(response) => response,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    shared.connects.fetch_add(1, Ordering::SeqCst);
    shared.set_state(PushState::Connected);
    info!(url = %settings.url, "push stream connected");
    let _ = ready.send(Ok(()));

    let mut stream = std::pin::pin!(response.bytes_stream());
    let mut decoder = SseDecoder::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("push reader cancelled");
                return;
            }
            next = tokio::time::timeout(settings.ping_timeout, stream.next()) => match next {
                Ok(Some(Ok(chunk))) => {
                    for event in decoder.feed(&chunk) {
                        shared.deliver(event);
                    }
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "push stream failed");
                    break;
                }
                Ok(None) => {
                    info!("push stream closed by server");
                    break;
                }
                Err(_) => {
                    warn!(timeout = ?settings.ping_timeout, "no push traffic within ping timeout");
                    break;
                }
            }
        }
    }
    shared.set_state(PushState::Disconnected);
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
