// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire encoding: JSON messages behind a 4-byte big-endian length prefix.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::{Command, Message};

/// Largest frame a peer will accept.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(usize),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for peer")]
    Timeout,

    #[error("expected a reply, got a {0} request")]
    UnexpectedRequest(Command),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Serialise a message to JSON bytes (no length prefix).
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(message).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Deserialise JSON bytes into a message.
///
/// A well-formed envelope naming a verb outside the vocabulary is reported as
/// `UnknownCommand` so the receiver can say so in its error reply.
pub fn decode(bytes: &[u8]) -> Result<Message, ProtocolError> {
    match serde_json::from_slice::<Message>(bytes) {
        Ok(message) => Ok(message),
        Err(e) => {
            let command = serde_json::from_slice::<serde_json::Value>(bytes)
                .ok()
                .and_then(|v| v.get("command").and_then(|c| c.as_str()).map(str::to_string));
            match command {
                Some(name) if name.parse::<Command>().is_err() => {
                    Err(ProtocolError::UnknownCommand(name))
                }
                _ => Err(ProtocolError::Decode(e.to_string())),
            }
        }
    }
}

/// Write one length-prefixed frame.
pub fn write_frame<W: Write>(writer: &mut W, data: &[u8]) -> Result<(), ProtocolError> {
    if data.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(data.len()));
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).map_err(map_io)?;
    writer.write_all(data).map_err(map_io)?;
    writer.flush().map_err(map_io)?;
    Ok(())
}

/// Read one length-prefixed frame.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
        _ => map_io(e),
    })?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer).map_err(map_io)?;
    Ok(buffer)
}

/// Encode and write a message as a single frame.
pub fn send_message<W: Write>(writer: &mut W, message: &Message) -> Result<(), ProtocolError> {
    write_frame(writer, &encode(message)?)
}

/// Read and decode a single message frame.
pub fn recv_message<R: Read>(reader: &mut R) -> Result<Message, ProtocolError> {
    decode(&read_frame(reader)?)
}

fn map_io(e: io::Error) -> ProtocolError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ProtocolError::Timeout,
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => {
            ProtocolError::ConnectionClosed
        }
        _ => ProtocolError::Io(e),
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
