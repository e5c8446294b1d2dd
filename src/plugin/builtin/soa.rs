use std::sync::Arc;

use tracing::debug;

use crate::config::ZoneConfig;
use crate::plugin::{Plugin, PluginError};
use crate::render::format_record;
use crate::rr::{PluginType, RecordValue, ResourceRecord, Value, Zone};
use crate::serial::SerialNumberManager;
use crate::validate::{self, ValidationError};

use super::VERSION;

const PRIMARY: usize = 0;
const EMAIL: usize = 1;
const SERIAL: usize = 2;
const TIMERS: [&str; 4] = ["refresh", "retry", "expire", "minimum"];

/// Start of authority records.
///
/// Values are, in order: primary name server, administrator email, serial,
/// refresh, retry, expire and minimum TTL. When the zone generates serials the
/// serial value may be left out; it is allocated from the zone's change index
/// once every other value has been checked.
#[derive(Debug, Clone)]
pub struct SoaPlugin {
    serials: Arc<SerialNumberManager>,
}

impl SoaPlugin {
    pub fn new(serials: Arc<SerialNumberManager>) -> Self {
        Self { serials }
    }

    fn assign_serial(
        &self,
        config: &ZoneConfig,
        zone: &str,
        values: &mut Vec<Value>,
    ) -> Result<(), PluginError> {
        let serial = self
            .serials
            .next(&config.serial_change_index_directory, zone)?;
        debug!(%zone, %serial, "generated SOA serial");

        if values.len() == 7 {
            values[SERIAL].value = serial;
        } else {
            values.insert(SERIAL, Value::new(serial));
        }
        Ok(())
    }
}

impl Plugin for SoaPlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok(VERSION.to_owned())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        Ok(vec![PluginType::SOA])
    }

    fn configure(&self, config: &ZoneConfig) -> Result<(), PluginError> {
        debug!(generate_serial = config.generate_serial, "configured SOA plugin");
        Ok(())
    }

    fn normalize(
        &self,
        config: &ZoneConfig,
        zone: &str,
        identifier: &str,
        mut record: ResourceRecord,
    ) -> Result<ResourceRecord, PluginError> {
        record.default_name(identifier);
        validate::check_class(record.class.as_deref())?;
        validate::check_name_or_wildcard(&record.name)?;

        let RecordValue::Multi(values) = &mut record.data else {
            return Err(ValidationError::ExpectedMulti {
                rtype: record.rtype.to_string(),
            }
            .into());
        };

        match (values.len(), config.generate_serial) {
            (7, _) | (6, true) => {}
            (found, true) => {
                return Err(ValidationError::WrongValueCount {
                    expected: "6 or 7",
                    found,
                }
                .into());
            }
            (found, false) => {
                return Err(ValidationError::WrongValueCount {
                    expected: "7",
                    found,
                }
                .into());
            }
        }

        validate::check_name(&values[PRIMARY].value)?;
        values[EMAIL].value = validate::format_soa_email(&values[EMAIL].value)?;

        let has_serial = values.len() == 7;
        if has_serial && !config.generate_serial {
            validate::check_non_negative_integer("serial", &values[SERIAL].value)?;
        }

        // Timers follow the serial, or the email when the serial is left out.
        let first_timer = if has_serial { SERIAL + 1 } else { SERIAL };
        for (offset, field) in TIMERS.into_iter().enumerate() {
            validate::check_non_negative_integer(field, &values[first_timer + offset].value)?;
        }

        if config.generate_serial {
            self.assign_serial(config, zone, values)?;
        }

        Ok(record)
    }

    fn validate_zone(&self, name: &str, zone: &Zone) -> Result<(), PluginError> {
        match zone.records_of(&PluginType::SOA).count() {
            1 => Ok(()),
            0 => Err(PluginError::rejected(format!(
                "zone {name} has no SOA record"
            ))),
            n => Err(PluginError::rejected(format!(
                "zone {name} has {n} SOA records, expected exactly one"
            ))),
        }
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
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::serial::Clock;

    #[derive(Debug)]
    struct Fixed(Mutex<NaiveDate>);

    impl Clock for Fixed {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn plugin() -> SoaPlugin {
        let clock = Fixed(Mutex::new(NaiveDate::from_ymd_opt(2025, 9, 3).unwrap()));
        SoaPlugin::new(Arc::new(SerialNumberManager::with_clock(Arc::new(clock))))
    }

    fn soa(values: &[&str]) -> ResourceRecord {
        ResourceRecord::multi(PluginType::SOA, values.iter().copied())
    }

    #[test]
    fn explicit_serial() {
        let record = plugin()
            .normalize(
                &ZoneConfig::default(),
                "example.com.",
                "example.com.",
                soa(&[
                    "ns1.example.com.",
                    "hostmaster@example.com",
                    "2024010101",
                    "3600",
                    "600",
                    "86400",
                    "300",
                ]),
            )
            .unwrap();

        assert_eq!(record.name, "example.com.");
        let values = record.data.as_multi().unwrap();
        assert_eq!(values[EMAIL].value, "hostmaster.example.com.");
        assert_eq!(values[SERIAL].value, "2024010101");
    }

    #[test]
    fn generated_serial() {
        let dir = tempfile::tempdir().unwrap();
        let config = ZoneConfig::default()
            .with_generate_serial(true)
            .with_serial_directory(dir.path().to_str().unwrap());
        let plugin = plugin();

        let six = soa(&[
            "ns1.example.com.",
            "hostmaster@example.com",
            "3600",
            "600",
            "86400",
            "300",
        ]);
        let record = plugin.normalize(&config, "example.com.", "example.com.", six).unwrap();
        let values = record.data.as_multi().unwrap();
        assert_eq!(values.len(), 7);
        assert_eq!(values[SERIAL].value, "2025090301");
        assert_eq!(values[3].value, "3600");

        let seven = soa(&[
            "ns1.example.com.",
            "hostmaster@example.com",
            "1",
            "3600",
            "600",
            "86400",
            "300",
        ]);
        let record = plugin.normalize(&config, "example.com.", "example.com.", seven).unwrap();
        assert_eq!(record.data.as_multi().unwrap()[SERIAL].value, "2025090302");
    }

    #[test]
    fn serial_keyed_by_zone_not_record_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = ZoneConfig::default()
            .with_generate_serial(true)
            .with_serial_directory(dir.path().to_str().unwrap());
        let plugin = plugin();
        let apex = || {
            soa(&[
                "ns1.example.com.",
                "hostmaster@example.com",
                "3600",
                "600",
                "86400",
                "300",
            ])
            .with_name("@")
        };

        for zone in ["example.com.", "example.org."] {
            let record = plugin.normalize(&config, zone, "soa", apex()).unwrap();
            assert_eq!(record.name, "@");
            assert_eq!(record.data.as_multi().unwrap()[SERIAL].value, "2025090301");
        }

        assert!(dir.path().join("example.com..serial").exists());
        assert!(dir.path().join("example.org..serial").exists());
        assert!(!dir.path().join("@.serial").exists());
    }

    #[test]
    fn rejected_record_allocates_no_serial() {
        let dir = tempfile::tempdir().unwrap();
        let directory = camino::Utf8Path::from_path(dir.path()).unwrap();
        let config = ZoneConfig::default()
            .with_generate_serial(true)
            .with_serial_directory(directory);
        let plugin = plugin();

        for values in [
            ["ns1.example.com.", "@bad", "3600", "600", "86400", "300"],
            ["ns1.example.com.", "hostmaster@example.com", "3600", "-1", "86400", "300"],
            ["ns1..example.com.", "hostmaster@example.com", "3600", "600", "86400", "300"],
        ] {
            plugin
                .normalize(&config, "example.com.", "example.com.", soa(&values))
                .unwrap_err();
        }

        assert_eq!(
            plugin.serials.current(directory, "example.com.").unwrap(),
            None
        );
    }

    #[test]
    fn rejects_bad_timers() {
        let err = plugin()
            .normalize(
                &ZoneConfig::default(),
                "example.com.",
                "example.com.",
                soa(&[
                    "ns1.example.com.",
                    "hostmaster@example.com",
                    "1",
                    "3600",
                    "-5",
                    "86400",
                    "300",
                ]),
            )
            .unwrap_err();
        assert!(err.to_string().contains("retry"), "{err}");
    }

    #[test]
    fn rejects_single_form() {
        let err = plugin()
            .normalize(
                &ZoneConfig::default(),
                "example.com.",
                "example.com.",
                ResourceRecord::single(PluginType::SOA, "ns1.example.com."),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::Validation(ValidationError::ExpectedMulti { .. })
        ));
    }

    #[test]
    fn exactly_one_soa() {
        let plugin = plugin();
        let record = soa(&["ns1.example.com."]);

        let empty = Zone::default();
        assert!(plugin.validate_zone("example.com.", &empty).is_err());

        let one = Zone::default().with_record("soa", record.clone());
        assert!(plugin.validate_zone("example.com.", &one).is_ok());

        let two = one.with_record("soa2", record);
        let err = plugin.validate_zone("example.com.", &two).unwrap_err();
        assert!(err.to_string().contains("2 SOA records"), "{err}");
    }
}
