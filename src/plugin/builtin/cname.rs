use crate::config::ZoneConfig;
use crate::plugin::{Plugin, PluginError};
use crate::render::format_record;
use crate::rr::{PluginType, ResourceRecord, Zone};
use crate::validate;

use super::{VERSION, check_single};

/// Canonical name records.
///
/// Every CNAME must point at a name that has an A record in the same zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CnamePlugin;

/// `name` as an absolute name under `zone`.
fn qualify(name: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.');
    if name == validate::WILDCARD {
        format!("{zone}.")
    } else if name.ends_with('.') {
        name.to_owned()
    } else {
        format!("{name}.{zone}.")
    }
}

impl Plugin for CnamePlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok(VERSION.to_owned())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        Ok(vec![PluginType::CNAME])
    }

    fn configure(&self, _config: &ZoneConfig) -> Result<(), PluginError> {
        Ok(())
    }

    fn normalize(
        &self,
        _config: &ZoneConfig,
        _zone: &str,
        identifier: &str,
        mut record: ResourceRecord,
    ) -> Result<ResourceRecord, PluginError> {
        record.default_name(identifier);
        let value = check_single(&record)?;
        validate::check_name(&value.value)?;
        Ok(record)
    }

    fn validate_zone(&self, name: &str, zone: &Zone) -> Result<(), PluginError> {
        let targets: Vec<String> = zone
            .records_of(&PluginType::A)
            .map(|(_, record)| qualify(&record.name, name).to_ascii_lowercase())
            .collect();

        for (identifier, record) in zone.records_of(&PluginType::CNAME) {
            let Some(value) = record.data.as_single() else {
                continue;
            };

            let target = qualify(&value.value, name).to_ascii_lowercase();
            if !targets.contains(&target) {
                return Err(PluginError::rejected(format!(
                    "CNAME {identifier} in zone {name} points at {}, which has no A record in the zone",
                    value.value
                )));
            }
        }
        Ok(())
    }

    fn render(
        &self,
        _config: &ZoneConfig,
        _identifier: &str,
        record: &ResourceRecord,
    ) -> Result<String, PluginError> {
        Ok(format_record(record))
    }
}
