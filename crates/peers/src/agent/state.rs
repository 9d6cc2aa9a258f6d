// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-side directory, plugin records, canned replies and policies.
//!
//! Owned exclusively by the agent's reply-loop thread.

use std::collections::{BTreeMap, HashMap, VecDeque};

use mf_wire::{Command, Message, Reply};

use crate::{PluginRecord, StatusRecord};

#[derive(Debug, Default)]
pub(super) struct AgentState {
    records: BTreeMap<String, PluginRecord>,
    /// appId -> plugin names, in link order
    links: BTreeMap<String, Vec<String>>,
    policies: HashMap<String, String>,
    queued: HashMap<(Command, String), VecDeque<Reply>>,
}

/// Who should receive an agent-originated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Addressing {
    /// Every plugin linked to the appId
    Broadcast,
    /// Exactly one plugin
    Single,
}

impl AgentState {
    /// Add or overwrite the record for `name`.
    pub fn register(&mut self, name: &str) {
        self.records.insert(name.to_string(), PluginRecord::new(name));
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn record(&self, name: &str) -> Option<&PluginRecord> {
        self.records.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &PluginRecord> {
        self.records.values()
    }

    /// Record for a sender, created on first contact if it never registered.
    fn record_mut(&mut self, name: &str) -> &mut PluginRecord {
        self.records.entry(name.to_string()).or_insert_with(|| PluginRecord::new(name))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn link(&mut self, app_id: &str, plugin_name: &str) {
        let linked = self.links.entry(app_id.to_string()).or_default();
        if !linked.iter().any(|p| p == plugin_name) {
            linked.push(plugin_name.to_string());
        }
    }

    pub fn deregister_all(&mut self) {
        self.records.clear();
        self.links.clear();
    }

    pub fn set_policy(&mut self, app_id: &str, policy: &str) {
        self.policies.insert(app_id.to_string(), policy.to_string());
    }

    pub fn policy(&self, app_id: &str) -> Option<&str> {
        self.policies.get(app_id).map(String::as_str)
    }

    pub fn queue_reply(&mut self, command: Command, app_id: &str, reply: Reply) {
        self.queued.entry((command, app_id.to_string())).or_default().push_back(reply);
    }

    /// Next canned reply for `(command, app_id)`, oldest first.
    pub fn take_queued(&mut self, command: Command, app_id: &str) -> Option<Reply> {
        self.queued.get_mut(&(command, app_id.to_string())).and_then(VecDeque::pop_front)
    }

    pub fn record_event(&mut self, plugin_name: &str, app_id: &str, event: &str) {
        self.record_mut(plugin_name)
            .events
            .entry(app_id.to_string())
            .or_default()
            .push(event.to_string());
    }

    pub fn record_status(&mut self, plugin_name: &str, app_id: &str, status: StatusRecord) {
        self.record_mut(plugin_name).statuses.entry(app_id.to_string()).or_default().push(status);
    }

    pub fn record_telemetry(&mut self, plugin_name: &str, telemetry: &str) {
        self.record_mut(plugin_name).telemetry = Some(telemetry.to_string());
    }

    pub fn record_custom(&mut self, message: &Message) {
        self.record_mut(&message.plugin_name).custom_messages.push(message.clone());
    }

    /// Resolve the plugins an agent-originated message goes to.
    ///
    /// With an appId, the target must be linked to it: a named plugin must
    /// be one of the linked ones, and without a name only broadcasts may fan
    /// out to several plugins. Without an appId (telemetry) a named plugin
    /// only has to be known.
    pub fn route(
        &self,
        app_id: &str,
        plugin_name: &str,
        addressing: Addressing,
    ) -> Result<Vec<String>, String> {
        if app_id.is_empty() {
            let linked = self.links.values().any(|names| names.iter().any(|n| n == plugin_name));
            if plugin_name.is_empty() || (!self.is_registered(plugin_name) && !linked) {
                return Err(format!("Plugin {plugin_name} is not registered"));
            }
            return Ok(vec![plugin_name.to_string()]);
        }

        let linked = match self.links.get(app_id) {
            Some(names) if !names.is_empty() => names,
            _ => return Err(format!("No plugin linked to appId {app_id}")),
        };
        if !plugin_name.is_empty() {
            if !linked.iter().any(|n| n == plugin_name) {
                return Err(format!("Plugin {plugin_name} is not linked to appId {app_id}"));
            }
            return Ok(vec![plugin_name.to_string()]);
        }
        if addressing == Addressing::Single && linked.len() > 1 {
            return Err(format!(
                "appId {app_id} is linked to {} plugins; name the target plugin",
                linked.len()
            ));
        }
        Ok(linked.clone())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
