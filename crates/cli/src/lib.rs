// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Command-line front ends for the fake agent and fake plugin peers.

pub mod commands;
pub mod exit_error;
pub mod logging;
pub mod output;

use std::path::PathBuf;

use mf_core::IpcConfig;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MF_BUILD_GIT_HASH"), ")");

/// IPC settings from the environment, with `--ipc-dir` taking precedence.
pub fn ipc_config(ipc_dir: Option<PathBuf>) -> IpcConfig {
    let config = IpcConfig::from_env();
    match ipc_dir {
        Some(ipc_dir) => IpcConfig { ipc_dir, ..config },
        None => config,
    }
}
