//! Zone and resource record definitions

mod record;
mod rtype;
mod ttl;
mod zone;

pub use self::record::{RawRecord, RecordValue, ResourceRecord, Value};
pub use self::rtype::PluginType;
pub use self::ttl::{TimeToLive, TtlDirective};
pub use self::zone::{Zone, Zones};
