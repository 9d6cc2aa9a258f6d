// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake management agent.
//!
//! Serves plugin-originated requests on `fake_management_controller.ipc` and
//! originates policy, action, status and telemetry requests to plugins. All
//! agent state lives on the reply-loop thread; the handle drives every
//! operation by sending a request to its own socket.

mod service;
mod state;

use std::path::Path;

use mf_core::{Endpoint, IpcConfig};
use mf_wire::{Command, Message, Reply};
use tracing::debug;

use crate::client::round_trip;
use crate::server::ReplyLoop;
use crate::{PeerError, PluginRecord};

use service::AgentService;

/// Talks to a running agent over its reply socket. Usable from any process
/// that shares the IPC directory.
#[derive(Debug, Clone)]
pub struct AgentClient {
    config: IpcConfig,
}

impl AgentClient {
    pub fn new(config: &IpcConfig) -> Self {
        Self { config: config.clone() }
    }

    fn call(
        &self,
        command: Command,
        app_id: &str,
        plugin_name: &str,
        contents: Vec<String>,
    ) -> Result<Reply, PeerError> {
        let request = Message::request(plugin_name, command, app_id, contents);
        round_trip(&self.config, &self.config.agent_endpoint(), request)
    }

    fn content(command: Command, reply: Reply) -> Result<Vec<String>, PeerError> {
        match reply {
            Reply::Content(contents) => Ok(contents),
            other => Err(PeerError::UnexpectedReply { command, reply: other.to_string() }),
        }
    }

    /// Names of every plugin that registered, sorted.
    pub fn get_registered_plugins(&self) -> Result<Vec<String>, PeerError> {
        let reply = self.call(Command::ListPlugins, "", "", vec![])?;
        Self::content(Command::ListPlugins, reply)
    }

    /// Everything recorded for every plugin.
    pub fn registered_plugins(&self) -> Result<Vec<PluginRecord>, PeerError> {
        let reply = self.call(Command::QueryPlugin, "", "", vec![])?;
        Self::content(Command::QueryPlugin, reply)?.iter().map(|json| decode_record(json)).collect()
    }

    /// Everything recorded for one plugin, `None` if it never registered.
    pub fn registered_plugin(&self, plugin_name: &str) -> Result<Option<PluginRecord>, PeerError> {
        match self.call(Command::QueryPlugin, "", plugin_name, vec![])? {
            Reply::Content(contents) => match contents.first() {
                Some(json) => decode_record(json).map(Some),
                None => Ok(None),
            },
            Reply::Error(_) => Ok(None),
            other => Err(PeerError::UnexpectedReply {
                command: Command::QueryPlugin,
                reply: other.to_string(),
            }),
        }
    }

    pub fn link_appid_plugin(&self, app_id: &str, plugin_name: &str) -> Result<Reply, PeerError> {
        if app_id.is_empty() || plugin_name.is_empty() {
            return Err(PeerError::Precondition(
                "linking requires an appId and a plugin name".to_string(),
            ));
        }
        self.call(Command::LinkAppId, app_id, plugin_name, vec![])
    }

    /// Broadcast a policy to every plugin linked to `app_id`. The first
    /// plugin's reply is returned.
    pub fn apply_policy(&self, app_id: &str, policy_xml: &str) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::ApplyPolicy)?;
        self.call(Command::ApplyPolicy, app_id, "", vec![policy_xml.to_string()])
    }

    /// Send an action to one plugin. `plugin_name` may be empty when exactly
    /// one plugin is linked to `app_id`.
    pub fn do_action(
        &self,
        app_id: &str,
        plugin_name: &str,
        action_xml: &str,
    ) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::DoAction)?;
        self.call(Command::DoAction, app_id, plugin_name, vec![action_xml.to_string()])
    }

    pub fn request_status(&self, app_id: &str, plugin_name: &str) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::RequestStatus)?;
        self.call(Command::RequestStatus, app_id, plugin_name, vec![])
    }

    pub fn request_telemetry(&self, plugin_name: &str) -> Result<Reply, PeerError> {
        if plugin_name.is_empty() {
            return Err(PeerError::Precondition(
                "RequestTelemetry requires a plugin name".to_string(),
            ));
        }
        self.call(Command::RequestTelemetry, "", plugin_name, vec![])
    }

    /// Store the policy answered to plugins' `RequestPolicy` for `app_id`.
    pub fn set_policy(&self, app_id: &str, policy_xml: &str) -> Result<Reply, PeerError> {
        require_app_id(app_id, Command::SetPolicy)?;
        self.call(Command::SetPolicy, app_id, "", vec![policy_xml.to_string()])
    }

    pub fn set_policy_file(&self, app_id: &str, path: &Path) -> Result<Reply, PeerError> {
        let policy = std::fs::read_to_string(path)
            .map_err(|source| PeerError::ReadFile { path: path.display().to_string(), source })?;
        self.set_policy(app_id, &policy)
    }

    /// Queue a canned reply for the next plugin request of `command` on
    /// `app_id`. `payload` follows the canned-reply convention: empty or
    /// `["ACK"]` acknowledges, `["ERROR", ...]` fails, anything else is content.
    pub fn queue_reply(
        &self,
        command: Command,
        app_id: &str,
        payload: Vec<String>,
    ) -> Result<Reply, PeerError> {
        let mut contents = Vec::with_capacity(payload.len() + 1);
        contents.push(command.as_str().to_string());
        contents.extend(payload);
        self.call(Command::QueueReply, app_id, "", contents)
    }

    pub fn deregister_plugins(&self) -> Result<Reply, PeerError> {
        self.call(Command::DeregisterPlugins, "", "", vec![])
    }

    /// Forward an arbitrary verb and payload to one plugin.
    pub fn send_custom_message(
        &self,
        app_id: &str,
        plugin_name: &str,
        command: Command,
        payload: Vec<String>,
    ) -> Result<Reply, PeerError> {
        let mut contents = Vec::with_capacity(payload.len() + 1);
        contents.push(command.as_str().to_string());
        contents.extend(payload);
        self.call(Command::Forward, app_id, plugin_name, contents)
    }

    /// Ask the agent's reply loop to exit.
    pub fn stop_agent(&self) -> Result<Reply, PeerError> {
        self.call(Command::Stop, "", "", vec![])
    }
}

/// A running fake agent. The reply loop is stopped when dropped.
pub struct Agent {
    client: AgentClient,
    server: ReplyLoop,
}

impl Agent {
    /// Bind the agent socket and start serving it.
    pub fn start(config: &IpcConfig) -> Result<Self, PeerError> {
        let server = ReplyLoop::spawn(
            "agent",
            config,
            config.agent_endpoint(),
            AgentService::new(config),
        )?;
        Ok(Self { client: AgentClient::new(config), server })
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.server.endpoint()
    }

    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    fn live(&self) -> Result<&AgentClient, PeerError> {
        if self.server.is_running() {
            Ok(&self.client)
        } else {
            Err(PeerError::NotRunning)
        }
    }

    pub fn get_registered_plugins(&self) -> Result<Vec<String>, PeerError> {
        self.live()?.get_registered_plugins()
    }

    pub fn registered_plugins(&self) -> Result<Vec<PluginRecord>, PeerError> {
        self.live()?.registered_plugins()
    }

    pub fn registered_plugin(&self, plugin_name: &str) -> Result<Option<PluginRecord>, PeerError> {
        self.live()?.registered_plugin(plugin_name)
    }

    pub fn link_appid_plugin(&self, app_id: &str, plugin_name: &str) -> Result<Reply, PeerError> {
        self.live()?.link_appid_plugin(app_id, plugin_name)
    }

    pub fn apply_policy(&self, app_id: &str, policy_xml: &str) -> Result<Reply, PeerError> {
        self.live()?.apply_policy(app_id, policy_xml)
    }

    pub fn do_action(
        &self,
        app_id: &str,
        plugin_name: &str,
        action_xml: &str,
    ) -> Result<Reply, PeerError> {
        self.live()?.do_action(app_id, plugin_name, action_xml)
    }

    pub fn request_status(&self, app_id: &str, plugin_name: &str) -> Result<Reply, PeerError> {
        self.live()?.request_status(app_id, plugin_name)
    }

    pub fn request_telemetry(&self, plugin_name: &str) -> Result<Reply, PeerError> {
        self.live()?.request_telemetry(plugin_name)
    }

    pub fn set_policy(&self, app_id: &str, policy_xml: &str) -> Result<Reply, PeerError> {
        self.live()?.set_policy(app_id, policy_xml)
    }

    pub fn set_policy_file(&self, app_id: &str, path: &Path) -> Result<Reply, PeerError> {
        self.live()?.set_policy_file(app_id, path)
    }

    pub fn queue_reply(
        &self,
        command: Command,
        app_id: &str,
        payload: Vec<String>,
    ) -> Result<Reply, PeerError> {
        self.live()?.queue_reply(command, app_id, payload)
    }

    pub fn deregister_plugins(&self) -> Result<Reply, PeerError> {
        self.live()?.deregister_plugins()
    }

    pub fn send_custom_message(
        &self,
        app_id: &str,
        plugin_name: &str,
        command: Command,
        payload: Vec<String>,
    ) -> Result<Reply, PeerError> {
        self.live()?.send_custom_message(app_id, plugin_name, command, payload)
    }

    /// Stop the reply loop and remove the socket file. Idempotent.
    pub fn stop(&mut self) {
        if self.server.is_running() {
            if let Err(e) = self.client.stop_agent() {
                debug!(error = %e, "stop request not delivered, stopping directly");
            }
        }
        self.server.stop();
    }
}

fn decode_record(json: &str) -> Result<PluginRecord, PeerError> {
    serde_json::from_str(json).map_err(|e| PeerError::UnexpectedReply {
        command: Command::QueryPlugin,
        reply: format!("undecodable plugin record: {e}"),
    })
}

fn require_app_id(app_id: &str, command: Command) -> Result<(), PeerError> {
    if app_id.is_empty() {
        return Err(PeerError::Precondition(format!("{command} requires an appId")));
    }
    Ok(())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
