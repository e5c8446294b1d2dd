//! Wire protocol for external plugins.
//!
//! Messages are JSON documents, each preceded by its length as a 4 byte
//! big-endian integer. The host writes one [`Request`] and reads back exactly
//! one [`Response`].

use std::io::{self, Read, Write};

use bytes::{BufMut as _, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::ZoneConfig;
use crate::rr::{PluginType, ResourceRecord, Zone};

/// Plugin protocol version
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum message size (10MB)
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Unexpected response to {request}: {response}")]
    UnexpectedResponse {
        request: &'static str,
        response: &'static str,
    },

    #[error("Plugin closed the connection")]
    Closed,
}

/// Host to plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    Version,
    Types,
    Configure {
        config: ZoneConfig,
    },
    Normalize {
        zone: String,
        identifier: String,
        record: ResourceRecord,
    },
    ValidateZone {
        name: String,
        zone: Zone,
    },
    Render {
        identifier: String,
        record: ResourceRecord,
    },
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Version => "version",
            Request::Types => "types",
            Request::Configure { .. } => "configure",
            Request::Normalize { .. } => "normalize",
            Request::ValidateZone { .. } => "validate_zone",
            Request::Render { .. } => "render",
        }
    }
}

/// Plugin to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Version { protocol: u32, version: String },
    Types { types: Vec<PluginType> },
    Configured,
    Normalized { record: ResourceRecord },
    Validated,
    Rendered { text: String },
    Error { message: String },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Version { .. } => "version",
            Response::Types { .. } => "types",
            Response::Configured => "configured",
            Response::Normalized { .. } => "normalized",
            Response::Validated => "validated",
            Response::Rendered { .. } => "rendered",
            Response::Error { .. } => "error",
        }
    }
}

/// A framed, blocking request/response channel.
#[derive(Debug)]
pub struct Channel<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> Channel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Send one request and wait for its response.
    pub fn call(&mut self, request: &Request) -> Result<Response, TransportError> {
        trace!(method = request.method(), "plugin call");
        self.send(request)?;
        self.receive()
    }

    fn send(&mut self, request: &Request) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(request)?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut frame = BytesMut::with_capacity(payload.len() + 4);
        frame.put_u32(payload.len() as u32);
        frame.put_slice(&payload);

        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Response, TransportError> {
        let mut len_bytes = [0u8; 4];
        match self.reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(TransportError::Closed);
            }
            Err(error) => return Err(error.into()),
        }

        let message_len = u32::from_be_bytes(len_bytes) as usize;
        if message_len > MAX_MESSAGE_SIZE {
            return Err(TransportError::MessageTooLarge {
                size: message_len,
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut buffer = vec![0u8; message_len];
        self.reader.read_exact(&mut buffer)?;
        Ok(serde_json::from_slice(&buffer)?)
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
