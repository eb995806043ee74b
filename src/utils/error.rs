//! The `error` module defines the error types used within the inspector.
//!
//! Per-call errors (`CodecError`, `TransportError`, wrapped in `InspectError`)
//! never reach the broker: the orchestrator turns every one of them into a
//! decision according to the configured failure policy. `PluginError` is only
//! raised at startup.

use std::io;
use thiserror::Error;

/// Failures of the wire codec, on either direction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("{record} needs {size} bytes, buffer holds {capacity}")]
    TooLarge {
        record: &'static str,
        size: usize,
        capacity: usize,
    },

    #[error("field `{field}` is {len} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("malformed input: {0}")]
    Malformed(#[from] prost::DecodeError),

    #[error("length {len} at offset {offset} runs past the end of a {available} byte buffer")]
    LengthOutOfBounds {
        offset: usize,
        len: u64,
        available: usize,
    },

    #[error("field `{field}` has wire type {found}, expected {expected}")]
    WireTypeMismatch {
        field: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("required field `{0}` missing")]
    MissingField(&'static str),
}

/// Socket-level failures of one inspector exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("inspector closed the connection without answering")]
    ConnectionClosed,

    #[error("no answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Everything that can go wrong while inspecting one message.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("encoding request: {0}")]
    Encoding(#[source] CodecError),

    #[error("talking to inspector: {0}")]
    Transport(#[from] TransportError),

    #[error("decoding response: {0}")]
    Decoding(#[source] CodecError),
}

impl InspectError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            InspectError::Encoding(_) => "encoding",
            InspectError::Transport(TransportError::Timeout(_)) => "timeout",
            InspectError::Transport(_) => "transport",
            InspectError::Decoding(_) => "decoding",
        }
    }
}

/// Plugin lifecycle failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("broker offers API versions {offered:?}, plugin needs {required}")]
    UnsupportedVersion { offered: Vec<i32>, required: i32 },
}
