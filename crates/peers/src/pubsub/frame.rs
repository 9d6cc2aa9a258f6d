// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-channel framing.
//!
//! A data message is two length-prefixed frames, `[topic, payload]`. A
//! subscription is a single frame: `0x01` followed by the topic prefix.

use std::io::{Read, Write};

use mf_wire::{read_frame, write_frame, ProtocolError};

const SUBSCRIBE: u8 = 0x01;

/// One message on the data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl DataMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self { topic: topic.into(), payload: payload.into() }
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

pub(crate) fn write_data<W: Write>(writer: &mut W, message: &DataMessage) -> Result<(), ProtocolError> {
    write_frame(writer, message.topic.as_bytes())?;
    write_frame(writer, &message.payload)
}

pub(crate) fn read_data<R: Read>(reader: &mut R) -> Result<DataMessage, ProtocolError> {
    let topic = read_frame(reader)?;
    let payload = read_frame(reader)?;
    let topic = String::from_utf8(topic)
        .map_err(|e| ProtocolError::Decode(format!("topic is not UTF-8: {e}")))?;
    Ok(DataMessage { topic, payload })
}

pub(crate) fn write_subscription<W: Write>(writer: &mut W, prefix: &str) -> Result<(), ProtocolError> {
    let mut frame = Vec::with_capacity(prefix.len() + 1);
    frame.push(SUBSCRIBE);
    frame.extend_from_slice(prefix.as_bytes());
    write_frame(writer, &frame)
}

pub(crate) fn read_subscription<R: Read>(reader: &mut R) -> Result<String, ProtocolError> {
    let frame = read_frame(reader)?;
    match frame.split_first() {
        Some((&SUBSCRIBE, prefix)) => String::from_utf8(prefix.to_vec())
            .map_err(|e| ProtocolError::Decode(format!("subscription is not UTF-8: {e}"))),
        _ => Err(ProtocolError::Decode("not a subscription frame".to_string())),
    }
}

/// Empty prefix subscribes to everything.
pub(crate) fn matches(prefixes: &[String], topic: &str) -> bool {
    prefixes.iter().any(|p| topic.starts_with(p.as_str()))
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
