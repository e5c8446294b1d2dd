//! Record type plugins
//!
//! Every resource record type is handled by a plugin. A plugin normalizes
//! and validates records of its types, checks zone-wide invariants, and
//! renders its records as zone file text. Plugins either run in-process
//! ([`builtin`]) or as separate executables spoken to over a pipe
//! ([`external`]); both sit behind the [`Plugin`] trait, and the
//! [`PluginRegistry`] maps each [`PluginType`] to exactly one of them.

use std::fmt;

use crate::config::ZoneConfig;
use crate::rr::{PluginType, ResourceRecord, Zone};
use crate::serial::SerialError;
use crate::validate::ValidationError;

pub mod builtin;
pub mod codec;
pub mod external;
pub mod registry;

pub use self::codec::TransportError;
pub use self::external::ExternalPlugin;
pub use self::registry::{PluginRegistry, PluginRegistryBuilder, RegistryError, discover};

/// Command recorded for plugins compiled into this crate.
pub const BUILT_IN: &str = "Built In";

/// Errors reported by a plugin operation.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A message from the plugin itself, passed through verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error("plugin transport: {0}")]
    Transport(#[from] TransportError),
}

impl PluginError {
    pub fn rejected(message: impl Into<String>) -> Self {
        PluginError::Rejected(message.into())
    }
}

/// Describes where a registered plugin came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    pub command: String,
    pub is_built_in: bool,
}

impl PluginMetadata {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: BUILT_IN.to_owned(),
            is_built_in: true,
        }
    }

    pub fn external(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            is_built_in: false,
        }
    }
}

impl fmt::Display for PluginMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.command)
    }
}

/// The operations every record plugin provides.
///
/// For one zone the engine calls [`configure`](Plugin::configure) on every
/// registered plugin, then [`normalize`](Plugin::normalize) on each record's
/// plugin, then [`validate_zone`](Plugin::validate_zone) on every registered
/// plugin once all records are normalized. [`render`](Plugin::render) runs
/// afterwards, once per record.
///
/// `normalize` and `render` also receive the zone configuration so that
/// plugins shared across zones processed in parallel never depend on which
/// zone was configured last. `normalize` is told the zone name as well; state
/// kept per zone, like SOA serials, is keyed by it.
pub trait Plugin: fmt::Debug + Send + Sync {
    /// Version string reported by the plugin.
    fn version(&self) -> Result<String, PluginError>;

    /// The record types this plugin handles.
    fn types(&self) -> Result<Vec<PluginType>, PluginError>;

    /// Prepare for a zone. Must tolerate defaulted or partial configuration.
    fn configure(&self, config: &ZoneConfig) -> Result<(), PluginError>;

    /// Validate one record of zone `zone` and fill in defaults.
    fn normalize(
        &self,
        config: &ZoneConfig,
        zone: &str,
        identifier: &str,
        record: ResourceRecord,
    ) -> Result<ResourceRecord, PluginError>;

    /// Check invariants that span the whole, normalized zone.
    fn validate_zone(&self, name: &str, zone: &Zone) -> Result<(), PluginError>;

    /// Zone file text for one record. An empty string suppresses the record.
    fn render(
        &self,
        config: &ZoneConfig,
        identifier: &str,
        record: &ResourceRecord,
    ) -> Result<String, PluginError>;
}
