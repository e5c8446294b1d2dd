//! Plugins running as separate executables.

use std::{
    io::{self, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    sync::{Mutex, MutexGuard},
};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::config::ZoneConfig;
use crate::rr::{PluginType, ResourceRecord, Zone};

use super::{
    Plugin, PluginError, PluginMetadata,
    codec::{Channel, PROTOCOL_VERSION, Request, Response, TransportError},
};

type ProcessChannel = Channel<BufReader<ChildStdout>, ChildStdin>;

#[derive(Debug)]
struct Connection {
    channel: ProcessChannel,

    /// The configuration most recently sent, re-sent when a call arrives
    /// for a zone configured differently.
    configured: Option<ZoneConfig>,
}

/// A plugin executable reached over its stdin/stdout.
///
/// Calls are serialized through a mutex; the plugin process sees exactly one
/// request at a time. The process is killed when this handle is dropped.
#[derive(Debug)]
pub struct ExternalPlugin {
    path: Utf8PathBuf,
    version: String,
    child: Mutex<Child>,
    connection: Mutex<Connection>,
}

impl ExternalPlugin {
    /// Start the executable with piped stdin and stdout.
    pub fn spawn(path: &Utf8Path) -> io::Result<Self> {
        let mut child = Command::new(path.as_std_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::other("plugin process has no stdio pipes"));
        };

        Ok(ExternalPlugin {
            path: path.to_owned(),
            version: String::new(),
            child: Mutex::new(child),
            connection: Mutex::new(Connection {
                channel: Channel::new(BufReader::new(stdout), stdin),
                configured: None,
            }),
        })
    }

    /// Exchange versions with the plugin, checking the protocol number.
    pub fn handshake(mut self) -> Result<Self, TransportError> {
        let response = self.connection().channel.call(&Request::Version)?;
        match response {
            Response::Version { protocol, version } if protocol == PROTOCOL_VERSION => {
                debug!(path = %self.path, %version, "plugin handshake complete");
                self.version = version;
                Ok(self)
            }
            Response::Version { protocol, .. } => Err(TransportError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: protocol,
            }),
            other => Err(TransportError::UnexpectedResponse {
                request: "version",
                response: other.kind(),
            }),
        }
    }

    pub fn metadata(&self) -> PluginMetadata {
        let name = self.path.file_name().unwrap_or(self.path.as_str());
        PluginMetadata::external(name, self.path.as_str())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another caller panicked mid-call; the
        // pipe itself is still usable, or will report its own error.
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn call(connection: &mut Connection, request: &Request) -> Result<Response, PluginError> {
        match connection.channel.call(request)? {
            Response::Error { message } => Err(PluginError::Rejected(message)),
            response => Ok(response),
        }
    }

    fn call_configured(
        &self,
        config: &ZoneConfig,
        request: &Request,
    ) -> Result<Response, PluginError> {
        let mut connection = self.connection();
        if connection.configured.as_ref() != Some(config) {
            Self::configure_connection(&mut connection, config)?;
        }
        Self::call(&mut connection, request)
    }

    fn configure_connection(
        connection: &mut Connection,
        config: &ZoneConfig,
    ) -> Result<(), PluginError> {
        connection.configured = None;
        let request = Request::Configure {
            config: config.clone(),
        };
        match Self::call(connection, &request)? {
            Response::Configured => {
                connection.configured = Some(config.clone());
                Ok(())
            }
            other => Err(unexpected(&request, &other)),
        }
    }
}

fn unexpected(request: &Request, response: &Response) -> PluginError {
    PluginError::Transport(TransportError::UnexpectedResponse {
        request: request.method(),
        response: response.kind(),
    })
}

impl Plugin for ExternalPlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok(self.version.clone())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        let request = Request::Types;
        match Self::call(&mut self.connection(), &request)? {
            Response::Types { types } => Ok(types),
            other => Err(unexpected(&request, &other)),
        }
    }

    fn configure(&self, config: &ZoneConfig) -> Result<(), PluginError> {
        Self::configure_connection(&mut self.connection(), config)
    }

    fn normalize(
        &self,
        config: &ZoneConfig,
        zone: &str,
        identifier: &str,
        record: ResourceRecord,
    ) -> Result<ResourceRecord, PluginError> {
        let request = Request::Normalize {
            zone: zone.to_owned(),
            identifier: identifier.to_owned(),
            record,
        };
        match self.call_configured(config, &request)? {
            Response::Normalized { record } => Ok(record),
            other => Err(unexpected(&request, &other)),
        }
    }

    fn validate_zone(&self, name: &str, zone: &Zone) -> Result<(), PluginError> {
        let request = Request::ValidateZone {
            name: name.to_owned(),
            zone: zone.clone(),
        };
        let response = match &zone.config {
            Some(config) => self.call_configured(config, &request)?,
            None => Self::call(&mut self.connection(), &request)?,
        };
        match response {
            Response::Validated => Ok(()),
            other => Err(unexpected(&request, &other)),
        }
    }

    fn render(
        &self,
        config: &ZoneConfig,
        identifier: &str,
        record: &ResourceRecord,
    ) -> Result<String, PluginError> {
        let request = Request::Render {
            identifier: identifier.to_owned(),
            record: record.clone(),
        };
        match self.call_configured(config, &request)? {
            Response::Rendered { text } => Ok(text),
            other => Err(unexpected(&request, &other)),
        }
    }
}

impl Drop for ExternalPlugin {
    fn drop(&mut self) {
        let child = self
            .child
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(error) = child.kill() {
            warn!(path = %self.path, "stopping plugin: {error}");
        }
        let _ = child.wait();
    }
}
