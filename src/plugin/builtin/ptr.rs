use crate::config::ZoneConfig;
use crate::plugin::{Plugin, PluginError};
use crate::render::format_record;
use crate::rr::{PluginType, ResourceRecord, Zone};
use crate::validate;

use super::{VERSION, check_single};

/// Pointer records, as found in reverse zones.
#[derive(Debug, Clone, Copy, Default)]
pub struct PtrPlugin;

impl Plugin for PtrPlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok(VERSION.to_owned())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        Ok(vec![PluginType::PTR])
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
