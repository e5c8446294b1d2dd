use std::io;

use camino::Utf8PathBuf;

use crate::plugin::PluginError;
use crate::rr::PluginType;

/// Errors that stop a single zone from being generated.
///
/// Every variant names the zone, and record-level failures name the record
/// identifier as well. Plugin messages are carried unchanged as the source.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("zone {zone} missing config")]
    MissingConfig { zone: String },

    #[error("zone {zone} has an invalid config: {source}")]
    InvalidConfig {
        zone: String,
        #[source]
        source: io::Error,
    },

    #[error("no plugin for resource record type {rtype} (zone {zone}, record {identifier})")]
    NoPlugin {
        zone: String,
        identifier: String,
        rtype: PluginType,
    },

    #[error("configuring plugin {plugin} for zone {zone}: {source}")]
    Configure {
        zone: String,
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("normalizing record {identifier} in zone {zone}: {source}")]
    Normalize {
        zone: String,
        identifier: String,
        #[source]
        source: PluginError,
    },

    #[error("validating zone {zone} with plugin {plugin}: {source}")]
    Validate {
        zone: String,
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("rendering record {identifier} in zone {zone}: {source}")]
    Render {
        zone: String,
        identifier: String,
        #[source]
        source: PluginError,
    },

    #[error("deriving reverse zones from {zone}: {message}")]
    Reverse { zone: String, message: String },

    #[error("writing zone {zone} to {path}: {source}")]
    Write {
        zone: String,
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ZoneError {
    pub(crate) fn no_plugin(zone: &str, identifier: &str, rtype: &PluginType) -> Self {
        ZoneError::NoPlugin {
            zone: zone.to_owned(),
            identifier: identifier.to_owned(),
            rtype: rtype.clone(),
        }
    }

    /// The zone this error belongs to.
    pub fn zone(&self) -> &str {
        match self {
            ZoneError::MissingConfig { zone }
            | ZoneError::InvalidConfig { zone, .. }
            | ZoneError::NoPlugin { zone, .. }
            | ZoneError::Configure { zone, .. }
            | ZoneError::Normalize { zone, .. }
            | ZoneError::Validate { zone, .. }
            | ZoneError::Render { zone, .. }
            | ZoneError::Reverse { zone, .. }
            | ZoneError::Write { zone, .. } => zone,
        }
    }
}
