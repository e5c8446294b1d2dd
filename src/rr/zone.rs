use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ZoneConfig;

use super::{PluginType, ResourceRecord, TtlDirective};

/// Zones keyed by zone name.
pub type Zones = BTreeMap<String, Zone>;

/// One zone definition: its records, configuration and `$TTL` directive.
///
/// The zone's name is the key it is stored under in [`Zones`]. Records are
/// keyed by identifier, and every iteration runs in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ZoneConfig>,
    #[serde(default, rename = "resource_records")]
    pub records: BTreeMap<String, ResourceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<TtlDirective>,
}

impl Zone {
    pub fn new(config: Option<ZoneConfig>) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: TtlDirective) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_record(mut self, identifier: impl Into<String>, record: ResourceRecord) -> Self {
        self.insert(identifier, record);
        self
    }

    /// Insert a record, returning the record previously stored under this identifier.
    pub fn insert(
        &mut self,
        identifier: impl Into<String>,
        record: ResourceRecord,
    ) -> Option<ResourceRecord> {
        self.records.insert(identifier.into(), record)
    }

    pub fn get(&self, identifier: &str) -> Option<&ResourceRecord> {
        self.records.get(identifier)
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &ResourceRecord)> {
        self.records.iter()
    }

    /// Records of a single type, in identifier order.
    pub fn records_of<'z>(
        &'z self,
        rtype: &'z PluginType,
    ) -> impl Iterator<Item = (&'z String, &'z ResourceRecord)> + 'z {
        self.records
            .iter()
            .filter(move |(_, record)| &record.rtype == rtype)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_iterate_in_identifier_order() {
        let zone = Zone::default()
            .with_record("www", ResourceRecord::single(PluginType::A, "1.2.3.5"))
            .with_record("api", ResourceRecord::single(PluginType::A, "1.2.3.4"))
            .with_record("mail", ResourceRecord::single(PluginType::CNAME, "www"));

        let ids: Vec<_> = zone.records().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["api", "mail", "www"]);

        let a: Vec<_> = zone
            .records_of(&PluginType::A)
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(a, ["api", "www"]);
    }

    #[test]
    fn zone_from_json() {
        let zone: Zone = serde_json::from_str(
            r#"{
                "ttl": {"value": 3600, "comment": "one hour"},
                "resource_records": {
                    "host1": {"type": "A", "value": "1.2.3.4"}
                }
            }"#,
        )
        .unwrap();

        assert!(zone.config.is_none());
        assert_eq!(zone.len(), 1);
        assert_eq!(zone.get("host1").unwrap().rtype, PluginType::A);
        assert_eq!(zone.ttl.unwrap().value.unwrap().as_secs(), 3600);
    }
}
