use crate::config::ZoneConfig;
use crate::plugin::{Plugin, PluginError};
use crate::render::format_record;
use crate::rr::{PluginType, ResourceRecord, Zone};
use crate::validate;

use super::{VERSION, check_single};

/// IPv4 address records.
#[derive(Debug, Clone, Copy, Default)]
pub struct APlugin;

impl Plugin for APlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok(VERSION.to_owned())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        Ok(vec![PluginType::A])
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
        validate::parse_ipv4(&value.value)?;
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
