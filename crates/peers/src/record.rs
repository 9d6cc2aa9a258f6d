// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What the agent remembers about each registered plugin.

use std::collections::BTreeMap;

use mf_wire::Message;
use serde::{Deserialize, Serialize};

/// A status report: the full XML and its XML-less summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status_xml: String,
    pub status_without_xml: String,
}

impl StatusRecord {
    pub fn new(status_xml: impl Into<String>, status_without_xml: impl Into<String>) -> Self {
        Self { status_xml: status_xml.into(), status_without_xml: status_without_xml.into() }
    }

    /// Wire form: `[statusXml, statusWithoutXml]`
    pub fn to_contents(&self) -> Vec<String> {
        vec![self.status_xml.clone(), self.status_without_xml.clone()]
    }

    /// Parse the wire form; `None` unless exactly two segments are present.
    pub fn from_contents(contents: &[String]) -> Option<Self> {
        match contents {
            [xml, without] => Some(Self::new(xml.clone(), without.clone())),
            _ => None,
        }
    }
}

/// Directory entry for a registered plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub name: String,
    #[serde(default)]
    pub events: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub statuses: BTreeMap<String, Vec<StatusRecord>>,
    #[serde(default)]
    pub telemetry: Option<String>,
    #[serde(default)]
    pub custom_messages: Vec<Message>,
}

impl PluginRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn get_events(&self, app_id: &str) -> &[String] {
        self.events.get(app_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get_statuses(&self, app_id: &str) -> &[StatusRecord] {
        self.statuses.get(app_id).map(Vec::as_slice).unwrap_or_default()
    }
}
