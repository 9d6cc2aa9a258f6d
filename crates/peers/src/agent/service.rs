// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handling on the agent's reply socket.

use mf_core::IpcConfig;
use mf_wire::{Command, Message, Reply};
use tracing::{debug, info, warn};

use super::state::{Addressing, AgentState};
use crate::client::round_trip;
use crate::server::{Flow, Handler};
use crate::StatusRecord;

/// Connect attempts when the agent reaches out to a plugin socket. Kept well
/// under the requester's own timeout so a dead plugin is reported as an
/// error reply rather than a timed-out request.
const FORWARD_CONNECT_RETRIES: u32 = 10;

pub(super) struct AgentService {
    state: AgentState,
    forward_config: IpcConfig,
}

impl AgentService {
    pub fn new(config: &IpcConfig) -> Self {
        Self {
            state: AgentState::default(),
            forward_config: config.clone().with_connect_retries(FORWARD_CONNECT_RETRIES),
        }
    }

    fn dispatch(&mut self, request: &Message) -> Reply {
        let app_id = request.app_id.as_str();
        let plugin_name = request.plugin_name.as_str();
        let contents = request.contents();

        match request.command {
            Command::Registration => {
                if plugin_name.is_empty() {
                    return Reply::Error("Registration requires a plugin name".to_string());
                }
                self.state.register(plugin_name);
                info!(plugin = plugin_name, "plugin registered");
                Reply::Ack
            }
            Command::SendEvent => {
                let Some(event) = contents.first() else {
                    return Reply::Error("SendEvent carried no event".to_string());
                };
                self.state.record_event(plugin_name, app_id, event);
                self.answer(request)
            }
            Command::SendStatus => {
                let Some(status) = StatusRecord::from_contents(contents) else {
                    return Reply::Error(
                        "SendStatus expects [statusXml, statusWithoutXml]".to_string(),
                    );
                };
                self.state.record_status(plugin_name, app_id, status);
                self.answer(request)
            }
            Command::SendTelemetry => {
                let Some(telemetry) = contents.first() else {
                    return Reply::Error("SendTelemetry carried no telemetry".to_string());
                };
                self.state.record_telemetry(plugin_name, telemetry);
                self.answer(request)
            }
            Command::CustomMessage => {
                self.state.record_custom(request);
                self.answer(request)
            }
            Command::RequestPolicy => self.policy_reply(app_id),
            Command::ApplyPolicy => self.apply_policy(request),
            Command::DoAction | Command::RequestStatus | Command::RequestTelemetry => {
                self.forward(request, request.command, contents.to_vec())
            }
            Command::Forward => match contents.split_first() {
                Some((verb, payload)) => match verb.parse::<Command>() {
                    Ok(command) => self.forward(request, command, payload.to_vec()),
                    Err(e) => Reply::Error(e.to_string()),
                },
                None => Reply::Error("Forward requires a command".to_string()),
            },
            Command::QueueReply => match contents.split_first() {
                Some((verb, payload)) => match verb.parse::<Command>() {
                    Ok(command) => {
                        let reply = Reply::from_canned(payload.to_vec());
                        debug!(%command, app_id, ?reply, "reply queued");
                        self.state.queue_reply(command, app_id, reply);
                        Reply::Ack
                    }
                    Err(e) => Reply::Error(e.to_string()),
                },
                None => Reply::Error("QueueReply requires a command".to_string()),
            },
            Command::LinkAppId => {
                if app_id.is_empty() || plugin_name.is_empty() {
                    return Reply::Error("LinkAppId requires an appId and a plugin name".to_string());
                }
                self.state.link(app_id, plugin_name);
                info!(app_id, plugin = plugin_name, "appId linked");
                Reply::Ack
            }
            Command::SetPolicy => match contents.first() {
                Some(policy) => {
                    self.state.set_policy(app_id, policy);
                    Reply::Ack
                }
                None => Reply::Error("SetPolicy carried no policy".to_string()),
            },
            Command::ListPlugins => Reply::Content(self.state.plugin_names()),
            Command::QueryPlugin => self.query_plugins(plugin_name),
            Command::DeregisterPlugins => {
                self.state.deregister_all();
                info!("all plugins deregistered");
                Reply::Ack
            }
            Command::Stop => Reply::Ack,
        }
    }

    /// Reply to a plugin-originated message: the next canned reply for
    /// `(command, appId)` if one was queued, otherwise an ACK.
    fn answer(&mut self, request: &Message) -> Reply {
        match self.state.take_queued(request.command, &request.app_id) {
            Some(reply) => {
                debug!(command = %request.command, app_id = %request.app_id, queued = true, "answering");
                reply
            }
            None => {
                debug!(command = %request.command, app_id = %request.app_id, queued = false, "answering");
                Reply::Ack
            }
        }
    }

    fn policy_reply(&mut self, app_id: &str) -> Reply {
        if let Some(reply) = self.state.take_queued(Command::RequestPolicy, app_id) {
            debug!(app_id, queued = true, "policy requested");
            return reply;
        }
        debug!(app_id, queued = false, "policy requested");
        match self.state.policy(app_id) {
            Some(policy) => Reply::Content(vec![policy.to_string()]),
            None => Reply::Error(format!("No policy available for {app_id}")),
        }
    }

    fn apply_policy(&mut self, request: &Message) -> Reply {
        let Some(policy) = request.contents().first().cloned() else {
            return Reply::Error("ApplyPolicy carried no policy".to_string());
        };
        let targets =
            match self.state.route(&request.app_id, &request.plugin_name, Addressing::Broadcast) {
                Ok(targets) => targets,
                Err(e) => {
                    warn!(app_id = %request.app_id, error = %e, "cannot route policy");
                    return Reply::Error(e);
                }
            };
        self.state.set_policy(&request.app_id, &policy);

        let mut first = None;
        for target in &targets {
            let reply = self.send_to_plugin(
                target,
                Command::ApplyPolicy,
                &request.app_id,
                vec![policy.clone()],
            );
            first.get_or_insert(reply);
        }
        first.unwrap_or_else(|| Reply::Error(format!("No plugin linked to appId {}", request.app_id)))
    }

    fn forward(&mut self, request: &Message, command: Command, contents: Vec<String>) -> Reply {
        let targets =
            match self.state.route(&request.app_id, &request.plugin_name, Addressing::Single) {
                Ok(targets) => targets,
                Err(e) => {
                    warn!(%command, app_id = %request.app_id, error = %e, "cannot route");
                    return Reply::Error(e);
                }
            };
        match targets.first() {
            Some(target) => self.send_to_plugin(target, command, &request.app_id, contents),
            None => Reply::Error(format!("No plugin linked to appId {}", request.app_id)),
        }
    }

    fn send_to_plugin(
        &self,
        plugin_name: &str,
        command: Command,
        app_id: &str,
        contents: Vec<String>,
    ) -> Reply {
        let message = Message::request(plugin_name, command, app_id, contents);
        let endpoint = self.forward_config.plugin_endpoint(plugin_name);
        match round_trip(&self.forward_config, &endpoint, message) {
            Ok(reply) => {
                debug!(plugin = plugin_name, %command, app_id, "plugin replied");
                reply
            }
            Err(e) => {
                warn!(plugin = plugin_name, %command, error = %e, "plugin unreachable");
                Reply::Error(format!("Failed to reach plugin {plugin_name}: {e}"))
            }
        }
    }

    /// One JSON record per content segment; every plugin when no name given.
    fn query_plugins(&self, plugin_name: &str) -> Reply {
        let records: Vec<_> = if plugin_name.is_empty() {
            self.state.records().collect()
        } else {
            match self.state.record(plugin_name) {
                Some(record) => vec![record],
                None => return Reply::Error(format!("Plugin {plugin_name} is not registered")),
            }
        };
        let encoded: Result<Vec<String>, _> = records.iter().map(serde_json::to_string).collect();
        match encoded {
            Ok(contents) => Reply::Content(contents),
            Err(e) => Reply::Error(format!("Failed to encode plugin record: {e}")),
        }
    }
}

impl Handler for AgentService {
    fn handle(&mut self, request: Message) -> (Message, Flow) {
        if request.command == Command::Stop {
            info!("agent stopping on request");
            return (request.reply(Reply::Ack), Flow::Stop);
        }
        let reply = self.dispatch(&request);
        (request.reply(reply), Flow::Continue)
    }
}
