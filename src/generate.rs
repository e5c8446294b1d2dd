//! End-to-end zone generation.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ZoneConfig;
use crate::error::ZoneError;
use crate::normalize::NormalizationEngine;
use crate::plugin::PluginRegistry;
use crate::render::ZoneRenderer;
use crate::reverse::derive_reverse_zones;
use crate::rr::{PluginType, Zone, Zones};

/// What came out of a generation run.
#[derive(Debug, Default)]
pub struct Generated {
    /// Zone file text, keyed by zone name.
    pub rendered: BTreeMap<String, String>,

    /// Zones that failed, each with the error that stopped it.
    pub errors: Vec<ZoneError>,
}

impl Generated {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Normalizes, derives reverse zones for, and renders a set of zones.
#[derive(Debug, Clone)]
pub struct ZoneGenerator<'r> {
    engine: NormalizationEngine<'r>,
    renderer: ZoneRenderer<'r>,
}

impl<'r> ZoneGenerator<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self {
            engine: NormalizationEngine::new(registry),
            renderer: ZoneRenderer::new(registry),
        }
    }

    pub fn with_defaults(self, defaults: ZoneConfig) -> Self {
        Self {
            engine: self.engine.with_defaults(defaults.clone()),
            renderer: self.renderer.with_defaults(defaults),
        }
    }

    /// Generate every zone in `zones`.
    ///
    /// A zone that fails at any stage is reported in [`Generated::errors`]
    /// and produces no text; the other zones are unaffected.
    pub fn generate(&self, mut zones: Zones) -> Generated {
        let mut generated = Generated {
            errors: self.engine.normalize(&mut zones),
            ..Default::default()
        };

        let mut derived = self.derive(&zones, &mut generated.errors);
        generated.errors.extend(self.engine.normalize(&mut derived));
        zones.append(&mut derived);

        for (name, zone) in &zones {
            match self.renderer.render(name, zone) {
                Ok(text) => {
                    generated.rendered.insert(name.clone(), text);
                }
                Err(error) => {
                    warn!(zone = %name, "zone failed to render: {error}");
                    generated.errors.push(error);
                }
            }
        }

        generated
    }

    /// Reverse zones for every normalized zone that asks for them.
    ///
    /// Reverse zones derived from several forward zones are merged. A derived
    /// zone never replaces a zone defined explicitly.
    fn derive(&self, zones: &Zones, errors: &mut Vec<ZoneError>) -> Zones {
        let mut derived = Zones::new();

        let wanted = zones.iter().filter(|(_, zone)| {
            zone.config
                .as_ref()
                .is_some_and(|config| config.generate_reverse_lookup_zones)
        });

        for (name, zone) in wanted {
            let reverse = match derive_reverse_zones(name, zone) {
                Ok(reverse) => reverse,
                Err(error) => {
                    warn!(zone = %name, "reverse zones not derived: {error}");
                    errors.push(error);
                    continue;
                }
            };

            for (reverse_name, reverse_zone) in reverse {
                if zones.contains_key(&reverse_name) {
                    warn!(zone = %reverse_name, source = %name, "reverse zone is defined explicitly, not deriving it");
                    continue;
                }

                match derived.get_mut(&reverse_name) {
                    Some(existing) => merge(&reverse_name, existing, reverse_zone),
                    None => {
                        debug!(zone = %reverse_name, source = %name, "derived reverse zone");
                        derived.insert(reverse_name, reverse_zone);
                    }
                }
            }
        }

        derived
    }
}

/// Fold records from a second source zone into an already derived reverse zone.
///
/// The first zone's SOA, config and `$TTL` are kept.
fn merge(name: &str, existing: &mut Zone, other: Zone) {
    for (identifier, record) in other.records {
        if record.rtype == PluginType::SOA {
            continue;
        }
        if existing.records.contains_key(&identifier) {
            warn!(zone = %name, %identifier, "duplicate record identifier in reverse zone, keeping the first");
            continue;
        }
        existing.records.insert(identifier, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::ResourceRecord;

    #[test]
    fn merge_keeps_first() {
        let soa = ResourceRecord::multi(PluginType::SOA, ["a"]).with_name("3.2.1.in-addr.arpa.");
        let mut first = Zone::default()
            .with_record("soa", soa.clone())
            .with_record("host1", ResourceRecord::single(PluginType::PTR, "host1.a.com."));
        let second = Zone::default()
            .with_record("origin", ResourceRecord::multi(PluginType::SOA, ["b"]))
            .with_record("host1", ResourceRecord::single(PluginType::PTR, "host1.b.com."))
            .with_record("host2", ResourceRecord::single(PluginType::PTR, "host2.b.com."));

        merge("3.2.1.in-addr.arpa.", &mut first, second);

        assert_eq!(first.len(), 3);
        assert_eq!(first.get("soa"), Some(&soa));
        assert_eq!(
            first.get("host1").unwrap().data.as_single().unwrap().value,
            "host1.a.com."
        );
    }
}
