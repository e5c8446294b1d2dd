//! Reverse lookup zones derived from A records.
//!
//! Every A record in a zone contributes a PTR record to the `in-addr.arpa.`
//! zone covering its /24: `host1 → 1.2.3.4` becomes `4 PTR host1.<zone>` in
//! `3.2.1.in-addr.arpa.`. Each derived zone copies the source zone's config and
//! `$TTL`, and starts from a copy of the source SOA renamed to the reverse
//! zone. Derived zones are ordinary zones and go through normalization and
//! rendering like any other.

use std::net::Ipv4Addr;

use hickory_proto::rr::Name;
use tracing::debug;

use crate::error::ZoneError;
use crate::rr::{PluginType, ResourceRecord, Zone, Zones};
use crate::validate;

/// Name of the reverse zone holding the PTR record for `address`.
///
/// The last octet is dropped and the rest reversed under `in-addr.arpa.`.
pub fn reverse_zone_name(address: Ipv4Addr) -> String {
    Name::from(address).base_name().to_string()
}

/// `name` from `zone`, as a fully qualified PTR target.
///
/// Names that already look fully qualified are used unchanged; anything else
/// is taken to be relative to the zone.
pub fn ptr_target(name: &str, zone: &str) -> String {
    if validate::is_fully_qualified(name) {
        return name.to_owned();
    }

    let mut target = format!("{name}.{zone}");
    if !target.ends_with('.') {
        target.push('.');
    }
    target
}

/// Derive the reverse zones for the A records of the normalized zone `name`.
#[tracing::instrument(skip_all, fields(zone = %name), level = "debug")]
pub fn derive_reverse_zones(name: &str, zone: &Zone) -> Result<Zones, ZoneError> {
    let reverse_error = |message: String| ZoneError::Reverse {
        zone: name.to_owned(),
        message,
    };

    let mut derived = Zones::new();
    let mut soa: Option<(&String, &ResourceRecord)> = None;

    for (identifier, record) in zone.records() {
        if record.rtype == PluginType::SOA {
            soa.get_or_insert((identifier, record));
            continue;
        }
        if record.rtype != PluginType::A {
            continue;
        }

        let value = record.data.as_single().ok_or_else(|| {
            reverse_error(format!("A record {identifier} does not have a single value"))
        })?;
        let address = validate::parse_ipv4(&value.value)
            .map_err(|error| reverse_error(format!("A record {identifier}: {error}")))?;

        let reverse_name = reverse_zone_name(address);
        let reverse = derived.entry(reverse_name.clone()).or_insert_with(|| {
            debug!(zone = %reverse_name, "deriving reverse zone");
            Zone {
                config: zone.config.clone(),
                records: Default::default(),
                ttl: zone.ttl.clone(),
            }
        });

        let ptr = ResourceRecord::single(PluginType::PTR, ptr_target(&record.name, name))
            .with_name(address.octets()[3].to_string());
        reverse.insert(identifier.clone(), ptr);
    }

    if derived.is_empty() {
        return Ok(derived);
    }

    let (soa_identifier, soa) =
        soa.ok_or_else(|| reverse_error("zone has no SOA record to copy".to_owned()))?;
    for (reverse_name, reverse) in derived.iter_mut() {
        let mut soa = soa.clone();
        soa.name = reverse_name.clone();
        reverse.insert(soa_identifier.clone(), soa);
    }

    Ok(derived)
}
