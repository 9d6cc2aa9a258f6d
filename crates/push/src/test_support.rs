// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process SSE server for push client tests.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::PushSettings;

const HEADERS: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Connection: close\r\n\r\n";

pub(crate) struct SseServer {
    addr: SocketAddr,
    clients: Arc<Mutex<Vec<TcpStream>>>,
    connections: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SseServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let clients = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let clients = Arc::clone(&clients);
            let connections = Arc::clone(&connections);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    match listener.accept() {
                        Ok((stream, _)) => {
                            stream.set_nonblocking(false).unwrap();
                            accept_client(stream, &clients, &connections);
                        }
                        Err(_) => thread::sleep(Duration::from_millis(5)),
                    }
                }
            })
        };
        Self { addr, clients, connections, stop, thread: Some(thread) }
    }

    pub fn url(&self) -> String {
        format!("http://{}/push/endpoint/MCS-1", self.addr)
    }

    pub fn settings(&self) -> PushSettings {
        PushSettings::new(self.url(), Duration::from_secs(10), None)
    }

    /// Send one event to every connected client; `""` sends a ping.
    pub fn push(&self, data: &str) {
        let mut frame = String::new();
        if data.is_empty() {
            frame.push_str("data:\n");
        }
        for line in data.lines() {
            frame.push_str(&format!("data: {line}\n"));
        }
        frame.push('\n');
        self.clients.lock().retain_mut(|client| client.write_all(frame.as_bytes()).is_ok());
    }

    pub fn ping(&self) {
        self.push("");
    }

    /// Requests accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Hang up on every client.
    pub fn drop_clients(&self) {
        for client in self.clients.lock().drain(..) {
            let _ = client.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for SseServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.drop_clients();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn accept_client(stream: TcpStream, clients: &Mutex<Vec<TcpStream>>, connections: &AtomicUsize) {
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => {}
        }
    }
    connections.fetch_add(1, Ordering::SeqCst);
    // Registered under the lock that writes the headers, so a client that
    // has seen the headers is guaranteed to receive the next push.
    let mut clients = clients.lock();
    let mut stream = stream;
    if stream.write_all(HEADERS.as_bytes()).is_ok() {
        clients.push(stream);
    }
}

/// Poll `check` until it holds or `timeout` passes.
pub(crate) fn eventually(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}
