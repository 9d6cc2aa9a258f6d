// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

/// A peer answered, but with an error reply.
pub const EXIT_ERROR_REPLY: i32 = 1;

/// The peer could not be reached or the request could not be made.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Print `error` to stderr and pick the process exit code for it.
pub fn report(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ExitError>() {
        Some(exit) => {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            exit.code
        }
        None => {
            eprintln!("error: {error:#}");
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
