use std::{borrow::Cow, fmt, str::FromStr};

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Resource record type tag used to dispatch a record to its plugin.
///
/// The set is open: the builtin constants cover the types handled in-process,
/// and external plugins may declare any other tag. Tags are stored upper-case,
/// so `"mx"` and `"MX"` name the same plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginType(Cow<'static, str>);

impl PluginType {
    pub const A: PluginType = PluginType(Cow::Borrowed("A"));
    pub const NS: PluginType = PluginType(Cow::Borrowed("NS"));
    pub const CNAME: PluginType = PluginType(Cow::Borrowed("CNAME"));
    pub const PTR: PluginType = PluginType(Cow::Borrowed("PTR"));
    pub const SOA: PluginType = PluginType(Cow::Borrowed("SOA"));

    pub fn new(tag: impl AsRef<str>) -> Self {
        PluginType(Cow::Owned(tag.as_ref().trim().to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for PluginType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PluginType::new(s))
    }
}

impl From<&str> for PluginType {
    fn from(value: &str) -> Self {
        PluginType::new(value)
    }
}

impl From<RecordType> for PluginType {
    fn from(value: RecordType) -> Self {
        PluginType::new(value.to_string())
    }
}

impl Serialize for PluginType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PluginType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(PluginType::new(tag))
    }
}
