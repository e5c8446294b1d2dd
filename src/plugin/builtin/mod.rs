//! Plugins compiled into the crate: A, NS, CNAME, PTR and SOA.

use std::sync::Arc;

use crate::rr::{PluginType, RecordValue, ResourceRecord, Value};
use crate::serial::SerialNumberManager;
use crate::validate::{self, ValidationError};

use super::PluginRegistryBuilder;

mod a;
mod cname;
mod ns;
mod ptr;
mod soa;

pub use self::a::APlugin;
pub use self::cname::CnamePlugin;
pub use self::ns::NsPlugin;
pub use self::ptr::PtrPlugin;
pub use self::soa::SoaPlugin;

/// Version reported by every builtin plugin.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

impl PluginRegistryBuilder {
    /// Register the builtin plugins. The SOA plugin allocates serials from `serials`.
    pub fn with_builtins(&mut self, serials: Arc<SerialNumberManager>) -> &mut Self {
        self.register_builtin(PluginType::A, "a", Arc::new(APlugin))
            .register_builtin(PluginType::NS, "ns", Arc::new(NsPlugin))
            .register_builtin(PluginType::CNAME, "cname", Arc::new(CnamePlugin))
            .register_builtin(PluginType::PTR, "ptr", Arc::new(PtrPlugin))
            .register_builtin(PluginType::SOA, "soa", Arc::new(SoaPlugin::new(serials)))
    }
}

/// The single value of `record`, rejecting the list form.
fn single_value(record: &ResourceRecord) -> Result<&Value, ValidationError> {
    match &record.data {
        RecordValue::Single(value) => Ok(value),
        RecordValue::Multi(_) => Err(ValidationError::ExpectedSingle {
            rtype: record.rtype.to_string(),
        }),
    }
}

/// Checks shared by the single-valued types: value form, class, and name.
fn check_single(record: &ResourceRecord) -> Result<&Value, ValidationError> {
    let value = single_value(record)?;
    validate::check_class(record.class.as_deref())?;
    validate::check_name_or_wildcard(&record.name)?;
    Ok(value)
}
