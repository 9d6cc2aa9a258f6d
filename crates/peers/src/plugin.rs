// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake plugin peer.
//!
//! Stands in for a product plugin: serves agent-initiated requests on
//! `fake_plugin_controller_{name}.ipc` and originates requests to the agent.
//! Policies and actions pushed by the agent are stored and acknowledged,
//! never executed; tests read them back with `get_policy`/`get_action`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mf_core::{Endpoint, IpcConfig};
use mf_wire::{Command, Message, Reply};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::client::round_trip;
use crate::server::{Flow, Handler, ReplyLoop};
use crate::{PeerError, StatusRecord};

#[derive(Debug, Default)]
struct PluginState {
    /// appIds this plugin serves; reads for any other appId are refused
    linked: HashSet<String>,
    policies: HashMap<String, String>,
    actions: HashMap<String, String>,
    statuses: HashMap<String, Vec<StatusRecord>>,
    events: HashMap<String, Vec<String>>,
    telemetry: Option<String>,
    custom_messages: Vec<Message>,
}

struct PluginService {
    name: String,
    state: Arc<Mutex<PluginState>>,
}

impl Handler for PluginService {
    fn handle(&mut self, request: Message) -> (Message, Flow) {
        let app_id = request.app_id.clone();
        let mut state = self.state.lock();
        let reply = match request.command {
            Command::ApplyPolicy => match request.contents().first() {
                Some(policy) => {
                    info!(plugin = %self.name, %app_id, "policy applied");
                    state.linked.insert(app_id.clone());
                    state.policies.insert(app_id, policy.clone());
                    Reply::Ack
                }
                None => Reply::Error("ApplyPolicy carried no policy".to_string()),
            },
            Command::DoAction => match request.contents().first() {
                Some(action) => {
                    info!(plugin = %self.name, %app_id, "action received");
                    state.linked.insert(app_id.clone());
                    state.actions.insert(app_id, action.clone());
                    Reply::Ack
                }
                None => Reply::Error("DoAction carried no action".to_string()),
            },
            Command::RequestStatus => match state.statuses.get(&app_id).and_then(|s| s.last()) {
                Some(status) => Reply::Content(status.to_contents()),
                None => Reply::Error(format!("No status set for {app_id}")),
            },
            Command::RequestTelemetry => match &state.telemetry {
                Some(telemetry) => Reply::Content(vec![telemetry.clone()]),
                None => Reply::Error("No telemetry set".to_string()),
            },
            Command::CustomMessage => {
                debug!(plugin = %self.name, %app_id, "custom message received");
                state.custom_messages.push(request.clone());
                Reply::Ack
            }
            Command::Stop => return (request.reply(Reply::Ack), Flow::Stop),
            other => Reply::Error(format!("{other} is not handled by a plugin")),
        };
        (request.reply(reply), Flow::Continue)
    }
}

/// Originates plugin requests to the agent. Holds no state of its own, so it
/// can be used from a process other than the one serving the plugin socket.
#[derive(Debug, Clone)]
pub struct PluginClient {
    name: String,
    config: IpcConfig,
}

impl PluginClient {
    pub fn new(name: impl Into<String>, config: &IpcConfig) -> Self {
        Self { name: name.into(), config: config.clone() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, command: Command, app_id: &str, contents: Vec<String>) -> Result<Reply, PeerError> {
        let request = Message::request(&self.name, command, app_id, contents);
        round_trip(&self.config, &self.config.agent_endpoint(), request)
    }

    pub fn register(&self) -> Result<Reply, PeerError> {
        self.call(Command::Registration, "", vec![])
    }

    pub fn request_policy(&self, app_id: &str) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::RequestPolicy)?;
        self.call(Command::RequestPolicy, app_id, vec![])
    }

    pub fn send_event(&self, app_id: &str, event_xml: &str) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::SendEvent)?;
        self.call(Command::SendEvent, app_id, vec![event_xml.to_string()])
    }

    pub fn send_status(
        &self,
        app_id: &str,
        status_xml: &str,
        status_without_xml: &str,
    ) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::SendStatus)?;
        let status = StatusRecord::new(status_xml, status_without_xml);
        self.call(Command::SendStatus, app_id, status.to_contents())
    }

    pub fn send_telemetry(&self, telemetry_json: &str) -> Result<Reply, PeerError> {
        self.call(Command::SendTelemetry, "", vec![telemetry_json.to_string()])
    }

    /// Send an arbitrary verb and payload, addressed as `plugin_name`.
    pub fn send_custom_message(
        &self,
        app_id: &str,
        plugin_name: &str,
        command: Command,
        payload: Vec<String>,
    ) -> Result<Reply, PeerError> {
        let request = Message::request(plugin_name, command, app_id, payload);
        round_trip(&self.config, &self.config.agent_endpoint(), request)
    }
}

/// A running fake plugin. The reply loop is stopped when dropped.
pub struct Plugin {
    client: PluginClient,
    state: Arc<Mutex<PluginState>>,
    server: ReplyLoop,
}

impl Plugin {
    /// Bind the plugin's reply socket and start serving it.
    pub fn start(name: impl Into<String>, config: &IpcConfig) -> Result<Self, PeerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PeerError::Precondition("plugin name must not be empty".to_string()));
        }
        let state = Arc::new(Mutex::new(PluginState::default()));
        let service = PluginService { name: name.clone(), state: Arc::clone(&state) };
        let server = ReplyLoop::spawn(
            &format!("plugin-{name}"),
            config,
            config.plugin_endpoint(&name),
            service,
        )?;
        Ok(Self { client: PluginClient::new(name, config), state, server })
    }

    pub fn name(&self) -> &str {
        self.client.name()
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.server.endpoint()
    }

    pub fn client(&self) -> &PluginClient {
        &self.client
    }

    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    pub fn register(&self) -> Result<Reply, PeerError> {
        self.client.register()
    }

    /// Ask the agent for the policy of `app_id`. Content replies are kept as
    /// the plugin's current policy.
    pub fn request_policy(&self, app_id: &str) -> Result<Reply, PeerError> {
        let reply = self.client.request_policy(app_id)?;
        if let Some(policy) = reply.first() {
            let mut state = self.state.lock();
            state.linked.insert(app_id.to_string());
            state.policies.insert(app_id.to_string(), policy.to_string());
        }
        Ok(reply)
    }

    pub fn send_event(&self, app_id: &str, event_xml: &str) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::SendEvent)?;
        self.state
            .lock()
            .events
            .entry(app_id.to_string())
            .or_default()
            .push(event_xml.to_string());
        self.client.send_event(app_id, event_xml)
    }

    pub fn send_status(
        &self,
        app_id: &str,
        status_xml: &str,
        status_without_xml: &str,
    ) -> Result<Reply, PeerError> {
        self.set_status(app_id, status_xml, status_without_xml)?;
        self.client.send_status(app_id, status_xml, status_without_xml)
    }

    /// Record a status that the agent will receive on its next
    /// `RequestStatus`. Nothing is sent.
    pub fn set_status(
        &self,
        app_id: &str,
        status_xml: &str,
        status_without_xml: &str,
    ) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::SendStatus)?;
        self.state
            .lock()
            .statuses
            .entry(app_id.to_string())
            .or_default()
            .push(StatusRecord::new(status_xml, status_without_xml));
        Ok(Reply::Ack)
    }

    /// Record telemetry for the agent's next `RequestTelemetry`.
    pub fn set_telemetry(&self, telemetry_json: &str) -> Result<Reply, PeerError> {
        self.state.lock().telemetry = Some(telemetry_json.to_string());
        Ok(Reply::Ack)
    }

    pub fn send_telemetry(&self, telemetry_json: &str) -> Result<Reply, PeerError> {
        self.set_telemetry(telemetry_json)?;
        self.client.send_telemetry(telemetry_json)
    }

    pub fn send_custom_message(
        &self,
        app_id: &str,
        plugin_name: &str,
        command: Command,
        payload: Vec<String>,
    ) -> Result<Reply, PeerError> {
        self.client.send_custom_message(app_id, plugin_name, command, payload)
    }

    /// Mark `app_id` as served by this plugin. Policies and actions the
    /// agent delivers link their appId as well.
    pub fn link_app_id(&self, app_id: &str) -> Result<(), PeerError> {
        require_app_id(app_id, Command::LinkAppId)?;
        self.state.lock().linked.insert(app_id.to_string());
        Ok(())
    }

    pub fn linked_app_ids(&self) -> Vec<String> {
        let mut linked: Vec<_> = self.state.lock().linked.iter().cloned().collect();
        linked.sort();
        linked
    }

    /// Last action the agent sent for `app_id`.
    pub fn get_action(&self, app_id: &str) -> Result<Option<String>, PeerError> {
        let state = self.state.lock();
        require_linked(&state, app_id, Command::DoAction)?;
        Ok(state.actions.get(app_id).cloned())
    }

    /// Last policy received for `app_id`.
    pub fn get_policy(&self, app_id: &str) -> Result<Option<String>, PeerError> {
        let state = self.state.lock();
        require_linked(&state, app_id, Command::ApplyPolicy)?;
        Ok(state.policies.get(app_id).cloned())
    }

    pub fn get_events(&self, app_id: &str) -> Vec<String> {
        self.state.lock().events.get(app_id).cloned().unwrap_or_default()
    }

    pub fn get_statuses(&self, app_id: &str) -> Vec<StatusRecord> {
        self.state.lock().statuses.get(app_id).cloned().unwrap_or_default()
    }

    pub fn custom_messages(&self) -> Vec<Message> {
        self.state.lock().custom_messages.clone()
    }

    pub fn stop(&mut self) {
        self.server.stop();
    }
}

fn require_app_id(app_id: &str, command: Command) -> Result<(), PeerError> {
    if app_id.is_empty() {
        return Err(PeerError::Precondition(format!("{command} requires an appId")));
    }
    Ok(())
}

fn require_linked(state: &PluginState, app_id: &str, command: Command) -> Result<(), PeerError> {
    require_app_id(app_id, command)?;
    if !state.linked.contains(app_id) {
        return Err(PeerError::Precondition(format!(
            "{command} read for appId {app_id} before it was linked"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
