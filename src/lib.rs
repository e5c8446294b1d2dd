//! Generate authoritative DNS zone files from zone definitions.
//!
//! Record handling is delegated to plugins kept in a [`PluginRegistry`]:
//! the builtin A, NS, CNAME, PTR and SOA plugins, plus any external plugin
//! executables. Zones are normalized with a [`NormalizationEngine`], optionally
//! extended with derived reverse zones, and rendered with a [`ZoneRenderer`].
//! [`ZoneGenerator`] runs the whole pipeline.

pub mod config;
pub mod error;
pub mod generate;
pub mod normalize;
pub mod plugin;
pub mod render;
pub mod reverse;
pub mod rr;
pub mod serial;
pub mod validate;

pub use self::config::ZoneConfig;
pub use self::error::ZoneError;
pub use self::generate::{Generated, ZoneGenerator};
pub use self::normalize::NormalizationEngine;
pub use self::plugin::{Plugin, PluginRegistry};
pub use self::render::ZoneRenderer;
pub use self::serial::SerialNumberManager;
