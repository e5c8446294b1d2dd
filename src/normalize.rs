//! Per-zone normalization and validation.
//!
//! Each zone passes through four stages, strictly in order:
//!
//! 1. resolve its configuration (own config, else the engine defaults),
//! 2. configure every registered plugin for the zone,
//! 3. normalize every record through its type's plugin, in identifier order,
//! 4. validate the fully normalized zone with every registered plugin.
//!
//! Zone-wide validation only ever sees a zone whose records have all been
//! normalized: stage 3 produces a [`NormalizedZone`], and only that type is
//! accepted by stage 4. A failure in any stage leaves the zone untouched.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ZoneConfig;
use crate::error::ZoneError;
use crate::plugin::PluginRegistry;
use crate::rr::{ResourceRecord, Zone, Zones};

/// Pick the zone's own configuration, falling back to the defaults, and make
/// its serial directory absolute.
pub(crate) fn resolve_config(
    name: &str,
    config: Option<&ZoneConfig>,
    defaults: Option<&ZoneConfig>,
) -> Result<ZoneConfig, ZoneError> {
    let mut config = config
        .or(defaults)
        .cloned()
        .ok_or_else(|| ZoneError::MissingConfig {
            zone: name.to_owned(),
        })?;

    config
        .absolutize()
        .map_err(|source| ZoneError::InvalidConfig {
            zone: name.to_owned(),
            source,
        })?;
    Ok(config)
}

/// Configure every registered plugin, whether or not the zone uses its types.
pub(crate) fn configure_phase(
    registry: &PluginRegistry,
    name: &str,
    config: &ZoneConfig,
) -> Result<(), ZoneError> {
    for entry in registry.plugins() {
        entry
            .plugin()
            .configure(config)
            .map_err(|source| ZoneError::Configure {
                zone: name.to_owned(),
                plugin: entry.metadata().name.clone(),
                source,
            })?;
    }
    Ok(())
}

/// A zone whose records have all been through their plugin's `normalize`.
#[derive(Debug)]
pub struct NormalizedZone {
    zone: Zone,
}

impl NormalizedZone {
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn into_zone(self) -> Zone {
        self.zone
    }
}

/// Drives zones through the configure, normalize and validate stages.
#[derive(Debug, Clone)]
pub struct NormalizationEngine<'r> {
    registry: &'r PluginRegistry,
    defaults: Option<ZoneConfig>,
}

impl<'r> NormalizationEngine<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self {
            registry,
            defaults: None,
        }
    }

    /// Configuration used for zones that carry none of their own.
    pub fn with_defaults(mut self, defaults: ZoneConfig) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn defaults(&self) -> Option<&ZoneConfig> {
        self.defaults.as_ref()
    }

    /// Normalize every zone in place.
    ///
    /// Zones that fail are removed from `zones`, and their errors returned;
    /// a failing zone never affects the others.
    pub fn normalize(&self, zones: &mut Zones) -> Vec<ZoneError> {
        let mut errors = Vec::new();
        zones.retain(|name, zone| match self.normalize_zone(name, zone) {
            Ok(()) => true,
            Err(error) => {
                warn!(zone = %name, "zone failed normalization: {error}");
                errors.push(error);
                false
            }
        });
        errors
    }

    /// Normalize and validate one zone in place.
    ///
    /// On success the zone carries its resolved configuration and normalized
    /// records. On failure it is left as it was.
    #[tracing::instrument(skip_all, fields(zone = %name), level = "debug")]
    pub fn normalize_zone(&self, name: &str, zone: &mut Zone) -> Result<(), ZoneError> {
        let config = resolve_config(name, zone.config.as_ref(), self.defaults.as_ref())?;
        configure_phase(self.registry, name, &config)?;

        let normalized = self.normalize_phase(name, zone, config)?;
        self.validate_phase(name, &normalized)?;

        *zone = normalized.into_zone();
        debug!(records = zone.len(), "zone normalized");
        Ok(())
    }

    fn normalize_phase(
        &self,
        name: &str,
        zone: &Zone,
        config: ZoneConfig,
    ) -> Result<NormalizedZone, ZoneError> {
        let mut records = BTreeMap::new();

        for (identifier, record) in zone.records() {
            let plugin = self
                .registry
                .lookup(&record.rtype)
                .ok_or_else(|| ZoneError::no_plugin(name, identifier, &record.rtype))?;

            let normalized: ResourceRecord = plugin
                .normalize(&config, name, identifier, record.clone())
                .map_err(|source| ZoneError::Normalize {
                    zone: name.to_owned(),
                    identifier: identifier.clone(),
                    source,
                })?;
            records.insert(identifier.clone(), normalized);
        }

        Ok(NormalizedZone {
            zone: Zone {
                config: Some(config),
                records,
                ttl: zone.ttl.clone(),
            },
        })
    }

    fn validate_phase(&self, name: &str, normalized: &NormalizedZone) -> Result<(), ZoneError> {
        for entry in self.registry.plugins() {
            entry
                .plugin()
                .validate_zone(name, normalized.zone())
                .map_err(|source| ZoneError::Validate {
                    zone: name.to_owned(),
                    plugin: entry.metadata().name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}
