// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use mf_cli::commands::plugin::{self, PluginCli};

fn main() {
    mf_cli::logging::init();
    let code = match plugin::run(PluginCli::parse()) {
        Ok(()) => 0,
        Err(e) => mf_cli::exit_error::report(&e),
    };
    std::process::exit(code);
}
