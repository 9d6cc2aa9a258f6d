// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use mf_cli::commands::agent::{self, AgentCli};

fn main() {
    mf_cli::logging::init();
    let code = match agent::run(AgentCli::parse()) {
        Ok(()) => 0,
        Err(e) => mf_cli::exit_error::report(&e),
    };
    std::process::exit(code);
}
