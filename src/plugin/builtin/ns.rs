use crate::config::ZoneConfig;
use crate::plugin::{Plugin, PluginError};
use crate::render::format_record;
use crate::rr::{PluginType, ResourceRecord, Zone};
use crate::validate::{self, WILDCARD};

use super::{VERSION, check_single};

/// Name server records. Unnamed records belong to the zone apex.
#[derive(Debug, Clone, Copy, Default)]
pub struct NsPlugin;

impl Plugin for NsPlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok(VERSION.to_owned())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        Ok(vec![PluginType::NS])
    }

    fn configure(&self, _config: &ZoneConfig) -> Result<(), PluginError> {
        Ok(())
    }

    fn normalize(
        &self,
        _config: &ZoneConfig,
        _zone: &str,
        _identifier: &str,
        mut record: ResourceRecord,
    ) -> Result<ResourceRecord, PluginError> {
        record.default_name(WILDCARD);
        let value = check_single(&record)?;
        validate::check_name(&value.value)?;
        Ok(record)
    }

    fn validate_zone(&self, _name: &str, _zone: &Zone) -> Result<(), PluginError> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_defaults_to_apex() {
        let record = NsPlugin
            .normalize(
                &ZoneConfig::default(),
                "example.com.",
                "ns1",
                ResourceRecord::single(PluginType::NS, "ns1.example.com."),
            )
            .unwrap();
        assert_eq!(record.name, "@");
    }

    #[test]
    fn rejects_invalid_target() {
        let result = NsPlugin.normalize(
            &ZoneConfig::default(),
            "example.com.",
            "ns1",
            ResourceRecord::single(PluginType::NS, "ns1..example.com."),
        );
        assert!(result.is_err());
    }
}
