// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use mf_wire::{Payload, Reply};

use crate::exit_error::{ExitError, EXIT_ERROR_REPLY};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a reply for stdout.
pub fn format_reply(reply: &Reply, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => reply.to_string(),
        OutputFormat::Json => serde_json::to_string(&Payload::from(reply.clone()))?,
    })
}

/// Print a reply; error replies become a non-zero exit after printing.
pub fn print_reply(reply: Reply, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", format_reply(&reply, format)?);
    match reply {
        Reply::Error(message) => Err(ExitError::new(EXIT_ERROR_REPLY, message).into()),
        _ => Ok(()),
    }
}

/// Print one item per line, or a JSON array.
pub fn print_list(items: &[String], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{item}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(items)?),
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
