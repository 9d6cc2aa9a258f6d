// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message envelope shared by every peer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Command, ProtocolError};

/// First payload segment of a canned reply that makes it an error reply.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Canned reply payload that is a plain acknowledgement.
pub const ACK_SENTINEL: &str = "ACK";

/// The unit of IPC between the agent and its plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Plugin the message is addressed to or originates from
    #[serde(default)]
    pub plugin_name: String,
    pub command: Command,
    /// Logical feature this message concerns; empty for plugin-scoped verbs
    #[serde(default)]
    pub app_id: String,
    /// Set by the requester and echoed in the reply
    #[serde(default)]
    pub correlation_id: String,
    pub payload: Payload,
}

/// Either the request contents or exactly one completed-reply shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    Request {
        #[serde(default)]
        contents: Vec<String>,
    },
    Ack,
    Error {
        message: String,
    },
    Content {
        #[serde(default)]
        contents: Vec<String>,
    },
}

/// A completed reply, detached from its envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Error(String),
    Content(Vec<String>),
}

impl Message {
    pub fn request(
        plugin_name: impl Into<String>,
        command: Command,
        app_id: impl Into<String>,
        contents: Vec<String>,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            command,
            app_id: app_id.into(),
            correlation_id: String::new(),
            payload: Payload::Request { contents },
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    /// Build the reply to this message, echoing its addressing fields.
    pub fn reply(&self, reply: Reply) -> Message {
        Message {
            plugin_name: self.plugin_name.clone(),
            command: self.command,
            app_id: self.app_id.clone(),
            correlation_id: self.correlation_id.clone(),
            payload: reply.into(),
        }
    }

    /// Reply to a frame that could not be decoded at all. There is no request
    /// to echo, so the envelope carries the free-form verb.
    pub fn rejection(reason: impl Into<String>) -> Message {
        Message {
            plugin_name: String::new(),
            command: Command::CustomMessage,
            app_id: String::new(),
            correlation_id: String::new(),
            payload: Payload::Error { message: reason.into() },
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self.payload, Payload::Request { .. })
    }

    /// Request contents, or the contents of a content reply.
    pub fn contents(&self) -> &[String] {
        match &self.payload {
            Payload::Request { contents } | Payload::Content { contents } => contents,
            Payload::Ack | Payload::Error { .. } => &[],
        }
    }

    /// Detach the reply from the envelope. Fails if this is a request.
    pub fn into_reply(self) -> Result<Reply, ProtocolError> {
        match self.payload {
            Payload::Request { .. } => Err(ProtocolError::UnexpectedRequest(self.command)),
            Payload::Ack => Ok(Reply::Ack),
            Payload::Error { message } => Ok(Reply::Error(message)),
            Payload::Content { contents } => Ok(Reply::Content(contents)),
        }
    }
}

impl From<Reply> for Payload {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Ack => Payload::Ack,
            Reply::Error(message) => Payload::Error { message },
            Reply::Content(contents) => Payload::Content { contents },
        }
    }
}

impl Reply {
    /// Interpret a canned payload: `[]` or `["ACK"]` acknowledges,
    /// `["ERROR", message...]` fails, anything else is content.
    pub fn from_canned(mut payload: Vec<String>) -> Reply {
        match payload.first().map(String::as_str) {
            None => Reply::Ack,
            Some(ACK_SENTINEL) if payload.len() == 1 => Reply::Ack,
            Some(ERROR_SENTINEL) => {
                let message = if payload.len() > 1 {
                    payload.split_off(1).join("\n")
                } else {
                    ERROR_SENTINEL.to_string()
                };
                Reply::Error(message)
            }
            Some(_) => Reply::Content(payload),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Reply::Ack)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Reply::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn contents(&self) -> Option<&[String]> {
        match self {
            Reply::Content(contents) => Some(contents),
            _ => None,
        }
    }

    /// First content segment, if this is a non-empty content reply.
    pub fn first(&self) -> Option<&str> {
        self.contents().and_then(|c| c.first()).map(String::as_str)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ack => f.write_str(ACK_SENTINEL),
            Reply::Error(message) => write!(f, "{}: {}", ERROR_SENTINEL, message),
            Reply::Content(contents) => f.write_str(&contents.join("\n")),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
