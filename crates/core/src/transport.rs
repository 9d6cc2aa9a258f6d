// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport socket helper.
//!
//! Opens the Unix socket behind an `ipc://` endpoint. A peer frequently
//! starts before the process that owns its rendezvous file, so binding and
//! connecting are retried a bounded number of times while the socket file
//! is missing or nobody is listening on it yet.

use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::IpcConfig;
use crate::endpoint::Endpoint;

/// Errors from opening or using a transport socket.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid address {0:?}: expected ipc://<path>")]
    InvalidAddress(String),

    #[error("socket {endpoint} unavailable after {attempts} attempts: {source}")]
    SocketUnavailable {
        endpoint: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {endpoint}: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

/// Role of the socket being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketMode {
    /// Bind and serve requests
    Reply,
    /// Connect and issue one request at a time
    Request,
    /// Connect to the publisher side of the data channel
    Publish,
    /// Connect to the subscriber side of the data channel
    Subscribe,
}

/// An opened socket: a bound listener for `Reply`, a stream otherwise.
#[derive(Debug)]
pub enum Socket {
    Bound(BoundListener),
    Connected(UnixStream),
}

impl Socket {
    pub fn into_listener(self) -> Option<BoundListener> {
        match self {
            Socket::Bound(listener) => Some(listener),
            Socket::Connected(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<UnixStream> {
        match self {
            Socket::Connected(stream) => Some(stream),
            Socket::Bound(_) => None,
        }
    }
}

/// Open the socket for `endpoint` in the given mode.
pub fn get_socket(
    config: &IpcConfig,
    endpoint: &Endpoint,
    mode: SocketMode,
) -> Result<Socket, TransportError> {
    match mode {
        SocketMode::Reply => bind(config, endpoint).map(Socket::Bound),
        SocketMode::Request | SocketMode::Publish | SocketMode::Subscribe => {
            connect(config, endpoint).map(Socket::Connected)
        }
    }
}

/// Bind a listener at `endpoint`, replacing any stale socket file.
pub fn bind(config: &IpcConfig, endpoint: &Endpoint) -> Result<BoundListener, TransportError> {
    let path = endpoint.path();
    retry(config, endpoint, || {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        remove_stale(path)?;
        UnixListener::bind(path)
    })
    .map(|listener| {
        debug!(%endpoint, "bound reply socket");
        BoundListener { listener, path: path.to_path_buf() }
    })
}

/// Connect to `endpoint` with read/write timeouts set to the IPC timeout.
pub fn connect(config: &IpcConfig, endpoint: &Endpoint) -> Result<UnixStream, TransportError> {
    let stream = retry(config, endpoint, || UnixStream::connect(endpoint.path()))?;
    set_timeouts(&stream, config.ipc_timeout).map_err(|source| TransportError::Io {
        endpoint: endpoint.to_string(),
        source,
    })?;
    Ok(stream)
}

/// Apply the same timeout to both directions of a stream.
pub fn set_timeouts(stream: &UnixStream, timeout: Duration) -> io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))
}

fn retry<T>(
    config: &IpcConfig,
    endpoint: &Endpoint,
    mut attempt: impl FnMut() -> io::Result<T>,
) -> Result<T, TransportError> {
    let attempts = config.connect_retries.max(1);
    let mut last_error = None;
    for n in 1..=attempts {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if is_not_ready(&e) => {
                debug!(%endpoint, attempt = n, error = %e, "rendezvous not ready");
                last_error = Some(e);
                if n < attempts {
                    thread::sleep(config.retry_interval);
                }
            }
            Err(source) => {
                return Err(TransportError::Io { endpoint: endpoint.to_string(), source })
            }
        }
    }
    warn!(%endpoint, attempts, "giving up on socket");
    Err(TransportError::SocketUnavailable {
        endpoint: endpoint.to_string(),
        attempts,
        source: last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)),
    })
}

/// The rendezvous point does not exist yet, or nobody is listening on it.
fn is_not_ready(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable
    )
}

fn remove_stale(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// A listening socket that removes its rendezvous file when dropped.
#[derive(Debug)]
pub struct BoundListener {
    listener: UnixListener,
    path: PathBuf,
}

impl BoundListener {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait up to `timeout` for a connection. `Ok(None)` when none arrived.
    pub fn accept_timeout(&self, timeout: Duration) -> io::Result<Option<UnixStream>> {
        if !wait_readable(self.listener.as_fd(), timeout)? {
            return Ok(None);
        }
        match self.listener.accept() {
            Ok((stream, _)) => Ok(Some(stream)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for BoundListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Block up to `timeout` until `fd` is readable.
pub fn wait_readable(fd: BorrowedFd<'_>, timeout: Duration) -> io::Result<bool> {
    let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    match poll(&mut fds, PollTimeout::from(millis)) {
        Ok(0) | Err(Errno::EINTR) => Ok(false),
        Ok(_) => Ok(true),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
