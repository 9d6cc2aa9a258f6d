// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCS configuration files: `key=value` lines, `#` comments.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::PushError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McsConfig {
    values: BTreeMap<String, String>,
}

impl McsConfig {
    /// Parse config text. Blank lines, comments and lines without `=` are
    /// skipped; later keys override earlier ones.
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    values.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => debug!(line = number + 1, "skipping config line without '='"),
            }
        }
        Self { values }
    }

    pub fn load(path: &Path) -> Result<Self, PushError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| PushError::ReadFile { path: path.display().to_string(), source })?;
        Ok(Self::parse(&text))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Integer value of `key`; `Ok(None)` when absent.
    pub fn get_int(&self, key: &str) -> Result<Option<u64>, PushError> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| PushError::Config(format!("{key}={value} is not an integer")))
            })
            .transpose()
    }

    /// Value of `key`, or a config error naming it.
    pub fn require(&self, key: &str) -> Result<&str, PushError> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(PushError::Config(format!("missing MCS config key {key}"))),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
