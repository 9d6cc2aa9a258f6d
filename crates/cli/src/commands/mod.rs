// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod agent;
pub mod plugin;

use std::thread;
use std::time::Duration;

use mf_wire::Command;

/// clap parser for wire command names such as `RequestPolicy`.
pub(crate) fn parse_command(name: &str) -> Result<Command, String> {
    name.parse().map_err(|e: mf_wire::ProtocolError| e.to_string())
}

/// Block until `running` turns false, checking every `interval`.
pub(crate) fn wait_while(interval: Duration, running: impl Fn() -> bool) {
    while running() {
        thread::sleep(interval);
    }
}
