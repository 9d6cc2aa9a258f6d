// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-channel subscriber.
//!
//! A background thread polls the subscriber socket and appends every
//! message to a FIFO queue keyed by its topic. Queues are created lazily on
//! the first message for a topic, which is what lets `get_next_message`
//! tell "never seen" apart from "nothing new".

use std::collections::{HashMap, VecDeque};
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mf_core::{transport, IpcConfig, SocketMode};
use mf_wire::ProtocolError;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::frame::{read_data, write_subscription, DataMessage};
use super::PubSubError;

/// Bounded wait of the listening loop between stop-flag checks.
pub const DEFAULT_LISTEN_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    pub listen_poll: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self { listen_poll: DEFAULT_LISTEN_POLL }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Created,
    Starting,
    Listening,
    Stopped,
}

/// Names the scope (usually the running test) a subscriber belongs to.
///
/// The listening thread captures the value at start and stops itself if the
/// marker later changes, so a subscriber never outlives its scope.
#[derive(Debug, Clone, Default)]
pub struct ScopeMarker(Arc<RwLock<String>>);

impl ScopeMarker {
    pub fn new(scope: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(scope.into())))
    }

    pub fn set(&self, scope: impl Into<String>) {
        *self.0.write() = scope.into();
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }
}

#[derive(Debug)]
struct Inbox {
    state: SubscriberState,
    queues: HashMap<String, VecDeque<Vec<u8>>>,
    received_first: bool,
}

#[derive(Debug)]
struct Shared {
    inbox: Mutex<Inbox>,
    arrived: Condvar,
}

impl Shared {
    fn set_state(&self, state: SubscriberState) {
        self.inbox.lock().state = state;
        self.arrived.notify_all();
    }

    fn push(&self, message: DataMessage) {
        let mut inbox = self.inbox.lock();
        inbox.queues.entry(message.topic).or_default().push_back(message.payload);
        inbox.received_first = true;
        drop(inbox);
        self.arrived.notify_all();
    }
}

pub struct Subscriber {
    name: String,
    topics: Vec<String>,
    config: IpcConfig,
    subscriber_config: SubscriberConfig,
    marker: Option<ScopeMarker>,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Subscriber {
    /// A subscriber to `topics` (prefixes; `""` is everything). Nothing is
    /// connected until [`Subscriber::start`].
    pub fn new(name: impl Into<String>, topics: Vec<String>, config: &IpcConfig) -> Self {
        Self {
            name: name.into(),
            topics,
            config: config.clone(),
            subscriber_config: SubscriberConfig::default(),
            marker: None,
            shared: Arc::new(Shared {
                inbox: Mutex::new(Inbox {
                    state: SubscriberState::Created,
                    queues: HashMap::new(),
                    received_first: false,
                }),
                arrived: Condvar::new(),
            }),
            stop: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    pub fn with_config(mut self, subscriber_config: SubscriberConfig) -> Self {
        self.subscriber_config = subscriber_config;
        self
    }

    pub fn with_marker(mut self, marker: ScopeMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SubscriberState {
        self.shared.inbox.lock().state
    }

    /// Connect, send the subscriptions and launch the listening thread. A
    /// listener that already exited (scope change, closed channel) is joined
    /// and replaced; a live one is left alone.
    pub fn start(&mut self) -> Result<(), PubSubError> {
        match self.thread.take() {
            Some(thread) if !thread.is_finished() => {
                self.thread = Some(thread);
                return Ok(());
            }
            Some(thread) => {
                if thread.join().is_err() {
                    error!(subscriber = %self.name, "subscriber thread panicked");
                }
                debug!(subscriber = %self.name, "restarting exited listener");
            }
            None => {}
        }
        let endpoint = self.config.subscriber_endpoint();
        let socket = transport::get_socket(&self.config, &endpoint, SocketMode::Subscribe)?;
        let Some(mut stream) = socket.into_stream() else {
            return Err(PubSubError::Closed(self.name.clone()));
        };
        for topic in &self.topics {
            write_subscription(&mut stream, topic)?;
        }

        self.shared.set_state(SubscriberState::Starting);
        self.stop.store(false, Ordering::SeqCst);
        let listener = Listener {
            name: self.name.clone(),
            stream,
            shared: Arc::clone(&self.shared),
            stop: Arc::clone(&self.stop),
            poll: self.subscriber_config.listen_poll,
            scope: self.marker.as_ref().map(|m| (m.clone(), m.get())),
        };
        let thread = thread::Builder::new()
            .name(format!("subscriber-{}", self.name))
            .spawn(move || listener.run())
            .map_err(|source| PubSubError::Spawn { name: self.name.clone(), source })?;
        self.thread = Some(thread);
        info!(subscriber = %self.name, topics = ?self.topics, "subscriber started");
        Ok(())
    }

    pub fn received_first_message(&self) -> bool {
        self.shared.inbox.lock().received_first
    }

    /// Block up to `timeout` for the first message on any topic.
    pub fn wait_for_first_message(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inbox = self.shared.inbox.lock();
        while !inbox.received_first {
            if self.shared.arrived.wait_until(&mut inbox, deadline).timed_out() {
                break;
            }
        }
        inbox.received_first
    }

    /// Topics that have received at least one message.
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<_> = self.shared.inbox.lock().queues.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Next message on `channel`, waiting up to `timeout`.
    ///
    /// Fails with `NoQueueAvailable` if the channel was never seen, and
    /// `QueueEmpty` if it was seen but nothing new arrived in time.
    pub fn get_next_message(
        &self,
        channel: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, PubSubError> {
        let deadline = Instant::now() + timeout;
        let mut inbox = self.shared.inbox.lock();
        loop {
            if let Some(payload) = inbox.queues.get_mut(channel).and_then(VecDeque::pop_front) {
                return Ok(payload);
            }
            if self.shared.arrived.wait_until(&mut inbox, deadline).timed_out() {
                return match inbox.queues.get_mut(channel) {
                    Some(queue) => queue.pop_front().ok_or_else(|| PubSubError::QueueEmpty {
                        channel: channel.to_string(),
                        timeout,
                    }),
                    None => Err(PubSubError::NoQueueAvailable(channel.to_string())),
                };
            }
        }
    }

    /// Like [`Subscriber::get_next_message`], decoded as UTF-8 text.
    pub fn get_next_text(&self, channel: &str, timeout: Duration) -> Result<String, PubSubError> {
        let payload = self.get_next_message(channel, timeout)?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    /// Stop the listening thread and disconnect. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(subscriber = %self.name, "subscriber thread panicked");
            }
            debug!(subscriber = %self.name, "subscriber joined");
        }
        if self.state() != SubscriberState::Created {
            self.shared.set_state(SubscriberState::Stopped);
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Listener {
    name: String,
    stream: UnixStream,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    poll: Duration,
    /// Marker and the scope captured at start
    scope: Option<(ScopeMarker, String)>,
}

impl Listener {
    fn run(mut self) {
        self.shared.set_state(SubscriberState::Listening);
        while !self.stop.load(Ordering::SeqCst) {
            if let Some((marker, started_in)) = &self.scope {
                let current = marker.get();
                if current != *started_in {
                    warn!(
                        subscriber = %self.name,
                        started_in = %started_in,
                        current = %current,
                        "scope changed under a listening subscriber, stopping"
                    );
                    break;
                }
            }

            match transport::wait_readable(self.stream.as_fd(), self.poll) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!(subscriber = %self.name, error = %e, "subscriber poll failed");
                    break;
                }
            }
            match read_data(&mut self.stream) {
                Ok(message) => {
                    debug!(subscriber = %self.name, topic = %message.topic, "received");
                    self.shared.push(message);
                }
                Err(ProtocolError::ConnectionClosed) => {
                    info!(subscriber = %self.name, "data channel closed");
                    break;
                }
                Err(e) => {
                    warn!(subscriber = %self.name, error = %e, "bad data frame");
                    break;
                }
            }
        }
        self.shared.set_state(SubscriberState::Stopped);
    }
}
