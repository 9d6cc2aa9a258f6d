// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendezvous between publishers and subscribers.

use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mf_core::{transport, BoundListener, Endpoint, IpcConfig};
use mf_wire::ProtocolError;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::frame::{matches, read_data, read_subscription, write_data};
use super::PubSubError;

/// A connected subscriber and the topic prefixes it asked for.
struct Route {
    id: u64,
    writer: UnixStream,
    prefixes: Vec<String>,
}

#[derive(Clone)]
struct Shared {
    stop: Arc<AtomicBool>,
    routes: Arc<Mutex<Vec<Route>>>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    poll_interval: Duration,
    ipc_timeout: Duration,
}

impl Shared {
    fn spawn_worker(&self, name: &str, work: impl FnOnce(Shared) + Send + 'static) {
        let shared = self.clone();
        match thread::Builder::new().name(name.to_string()).spawn(move || work(shared)) {
            Ok(handle) => self.workers.lock().push(handle),
            Err(e) => error!(name, error = %e, "failed to spawn proxy worker"),
        }
    }

    /// Join workers whose connection already ended.
    fn reap_workers(&self) {
        let finished: Vec<_> = {
            let mut workers = self.workers.lock();
            let (done, live) = workers.drain(..).partition(|w: &JoinHandle<()>| w.is_finished());
            *workers = live;
            done
        };
        for worker in finished {
            if worker.join().is_err() {
                error!("data channel worker panicked");
            }
        }
    }
}

/// Binds both data-channel rendezvous points and fans publications out to
/// matching subscribers. Stopped and joined on drop.
pub struct DataChannelProxy {
    publisher_endpoint: Endpoint,
    subscriber_endpoint: Endpoint,
    shared: Shared,
    acceptor: Option<JoinHandle<()>>,
}

impl DataChannelProxy {
    pub fn start(config: &IpcConfig) -> Result<Self, PubSubError> {
        let publisher_endpoint = config.publisher_endpoint();
        let subscriber_endpoint = config.subscriber_endpoint();
        let publishers = transport::bind(config, &publisher_endpoint)?;
        let subscribers = transport::bind(config, &subscriber_endpoint)?;

        let shared = Shared {
            stop: Arc::new(AtomicBool::new(false)),
            routes: Arc::new(Mutex::new(Vec::new())),
            workers: Arc::new(Mutex::new(Vec::new())),
            poll_interval: config.poll_interval,
            ipc_timeout: config.ipc_timeout,
        };
        let acceptor = {
            let shared = shared.clone();
            thread::Builder::new()
                .name("pubsub-proxy".to_string())
                .spawn(move || accept_loop(publishers, subscribers, shared))
                .map_err(|source| PubSubError::Spawn { name: "pubsub-proxy".to_string(), source })?
        };
        info!(publishers = %publisher_endpoint, subscribers = %subscriber_endpoint, "data channel proxy started");
        Ok(Self { publisher_endpoint, subscriber_endpoint, shared, acceptor: Some(acceptor) })
    }

    pub fn publisher_endpoint(&self) -> &Endpoint {
        &self.publisher_endpoint
    }

    pub fn subscriber_endpoint(&self) -> &Endpoint {
        &self.subscriber_endpoint
    }

    pub fn is_running(&self) -> bool {
        self.acceptor.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Number of subscribers currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.shared.routes.lock().len()
    }

    /// Connection workers not yet reaped.
    pub(crate) fn worker_count(&self) -> usize {
        self.shared.workers.lock().len()
    }

    /// Stop accepting, disconnect everyone, and join every worker.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        let Some(acceptor) = self.acceptor.take() else {
            return;
        };
        if acceptor.join().is_err() {
            error!("data channel acceptor panicked");
        }
        let workers: Vec<_> = self.shared.workers.lock().drain(..).collect();
        for worker in workers {
            if worker.join().is_err() {
                error!("data channel worker panicked");
            }
        }
        self.shared.routes.lock().clear();
        info!("data channel proxy stopped");
    }
}

impl Drop for DataChannelProxy {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(publishers: BoundListener, subscribers: BoundListener, shared: Shared) {
    let slice = shared.poll_interval / 2;
    let mut next_id = 0u64;
    while !shared.stop.load(Ordering::SeqCst) {
        shared.reap_workers();
        match publishers.accept_timeout(slice) {
            Ok(Some(stream)) => {
                debug!("publisher attached");
                prepare(&stream, &shared);
                shared.spawn_worker("pubsub-publisher", move |shared| forward(stream, &shared));
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "publisher accept failed"),
        }

        match subscribers.accept_timeout(slice) {
            Ok(Some(stream)) => {
                prepare(&stream, &shared);
                let writer = match stream.try_clone() {
                    Ok(writer) => writer,
                    Err(e) => {
                        warn!(error = %e, "cannot clone subscriber stream");
                        continue;
                    }
                };
                next_id += 1;
                let id = next_id;
                shared.routes.lock().push(Route { id, writer, prefixes: Vec::new() });
                debug!(id, "subscriber attached");
                shared.spawn_worker("pubsub-subscriber", move |shared| {
                    subscriptions(stream, id, &shared)
                });
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "subscriber accept failed"),
        }
    }
}

fn prepare(stream: &UnixStream, shared: &Shared) {
    if let Err(e) = transport::set_timeouts(stream, shared.ipc_timeout) {
        warn!(error = %e, "failed to set data channel timeouts");
    }
}

/// Relay one publisher's messages, in order, until it disconnects.
fn forward(mut stream: UnixStream, shared: &Shared) {
    while !shared.stop.load(Ordering::SeqCst) {
        match transport::wait_readable(stream.as_fd(), shared.poll_interval) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "publisher poll failed");
                return;
            }
        }
        let message = match read_data(&mut stream) {
            Ok(message) => message,
            Err(ProtocolError::ConnectionClosed) => {
                debug!("publisher detached");
                return;
            }
            Err(e) => {
                warn!(error = %e, "dropping publisher after bad frame");
                return;
            }
        };

        let mut routes = shared.routes.lock();
        let mut delivered = 0usize;
        routes.retain_mut(|route| {
            if !matches(&route.prefixes, &message.topic) {
                return true;
            }
            match write_data(&mut route.writer, &message) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(e) => {
                    debug!(id = route.id, error = %e, "dropping unreachable subscriber");
                    false
                }
            }
        });
        debug!(topic = %message.topic, bytes = message.payload.len(), delivered, "forwarded");
    }
}

/// Collect one subscriber's subscription frames until it disconnects.
fn subscriptions(mut stream: UnixStream, id: u64, shared: &Shared) {
    while !shared.stop.load(Ordering::SeqCst) {
        match transport::wait_readable(stream.as_fd(), shared.poll_interval) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(id, error = %e, "subscriber poll failed");
                break;
            }
        }
        match read_subscription(&mut stream) {
            Ok(prefix) => {
                debug!(id, prefix = %prefix, "subscribed");
                if let Some(route) = shared.routes.lock().iter_mut().find(|r| r.id == id) {
                    route.prefixes.push(prefix);
                }
            }
            Err(ProtocolError::ConnectionClosed) => {
                debug!(id, "subscriber detached");
                break;
            }
            Err(e) => {
                warn!(id, error = %e, "dropping subscriber after bad frame");
                break;
            }
        }
    }
    shared.routes.lock().retain(|r| r.id != id);
}
