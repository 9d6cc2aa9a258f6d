// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed command vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Every verb a peer may put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Command {
    // Plugin -> Agent
    Registration,
    SendEvent,
    SendStatus,
    SendTelemetry,
    RequestPolicy,

    // Agent -> Plugin
    ApplyPolicy,
    DoAction,
    RequestStatus,
    RequestTelemetry,

    /// Free-form payload segments
    CustomMessage,

    // Agent control verbs, issued by whoever drives the fake agent
    QueueReply,
    LinkAppId,
    SetPolicy,
    ListPlugins,
    QueryPlugin,
    DeregisterPlugins,
    /// Deliver `contents[1..]` to a plugin under the verb named in `contents[0]`
    Forward,
    Stop,
}

impl Command {
    pub const ALL: [Command; 18] = [
        Command::Registration,
        Command::SendEvent,
        Command::SendStatus,
        Command::SendTelemetry,
        Command::RequestPolicy,
        Command::ApplyPolicy,
        Command::DoAction,
        Command::RequestStatus,
        Command::RequestTelemetry,
        Command::CustomMessage,
        Command::QueueReply,
        Command::LinkAppId,
        Command::SetPolicy,
        Command::ListPlugins,
        Command::QueryPlugin,
        Command::DeregisterPlugins,
        Command::Forward,
        Command::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Registration => "Registration",
            Command::SendEvent => "SendEvent",
            Command::SendStatus => "SendStatus",
            Command::SendTelemetry => "SendTelemetry",
            Command::RequestPolicy => "RequestPolicy",
            Command::ApplyPolicy => "ApplyPolicy",
            Command::DoAction => "DoAction",
            Command::RequestStatus => "RequestStatus",
            Command::RequestTelemetry => "RequestTelemetry",
            Command::CustomMessage => "CustomMessage",
            Command::QueueReply => "QueueReply",
            Command::LinkAppId => "LinkAppId",
            Command::SetPolicy => "SetPolicy",
            Command::ListPlugins => "ListPlugins",
            Command::QueryPlugin => "QueryPlugin",
            Command::DeregisterPlugins => "DeregisterPlugins",
            Command::Forward => "Forward",
            Command::Stop => "Stop",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
