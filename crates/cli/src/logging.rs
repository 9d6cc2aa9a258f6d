// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup for the fake peer binaries.

use tracing_subscriber::EnvFilter;

/// Variable holding the log filter, e.g. `MF_LOG=mf_peers=debug`.
pub const LOG_ENV: &str = "MF_LOG";

const DEFAULT_FILTER: &str = "info";

/// Install a stderr subscriber filtered by `MF_LOG`. Stdout stays reserved
/// for command output.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
