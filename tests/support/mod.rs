#![allow(unused)]

use std::sync::{Arc, Mutex, Once};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use zonegen::{
    Plugin, PluginRegistry, SerialNumberManager, ZoneConfig,
    plugin::PluginError,
    render::format_record,
    rr::{PluginType, ResourceRecord, TtlDirective, Value, Zone},
    serial::Clock,
};

/// Registers a global default tracing subscriber when called for the first time. This is intended
/// for use in tests.
pub fn subscribe() {
    static INSTALL_TRACING_SUBSCRIBER: Once = Once::new();
    INSTALL_TRACING_SUBSCRIBER.call_once(|| {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).unwrap();
    });
}

/// A clock that reads whatever day the test sets.
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
    pub fn new(year: i32, month: u32, day: u32) -> Arc<Self> {
        Arc::new(FixedClock(Mutex::new(
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        )))
    }

    pub fn set(&self, year: i32, month: u32, day: u32) {
        *self.0.lock().unwrap() = NaiveDate::from_ymd_opt(year, month, day).unwrap();
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

pub fn utf8(path: &std::path::Path) -> &Utf8Path {
    Utf8Path::from_path(path).unwrap()
}

/// Registry with the builtin plugins, allocating serials on `clock`.
pub fn builtin_registry(clock: Arc<FixedClock>) -> PluginRegistry {
    let mut builder = PluginRegistry::builder();
    builder.with_builtins(Arc::new(SerialNumberManager::with_clock(clock)));
    builder.build()
}

pub fn soa(values: &[&str]) -> ResourceRecord {
    ResourceRecord::multi(PluginType::SOA, values.iter().copied())
}

pub fn default_soa() -> ResourceRecord {
    soa(&[
        "ns1.example.com.",
        "hostmaster@example.com",
        "1",
        "3600",
        "600",
        "86400",
        "300",
    ])
}

pub fn a(address: &str) -> ResourceRecord {
    ResourceRecord::single(PluginType::A, address)
}

/// `example.com.` with an SOA, a name server, two hosts and an alias.
pub fn example_zone(config: ZoneConfig) -> Zone {
    Zone::new(Some(config))
        .with_ttl(TtlDirective::new(3600).with_comment("one hour"))
        .with_record("example.com.", default_soa())
        .with_record(
            "ns1",
            ResourceRecord::single(PluginType::NS, "ns1.example.com."),
        )
        .with_record("host1", a("1.2.3.4"))
        .with_record("host2", a("1.2.3.5"))
        .with_record(
            "www",
            ResourceRecord::single(PluginType::CNAME, Value::new("host1").with_comment("web")),
        )
}

pub fn serial_config(directory: &Utf8Path) -> ZoneConfig {
    ZoneConfig::default()
        .with_generate_serial(true)
        .with_serial_directory(directory)
}

/// Calls observed by a [`RecordingPlugin`].
#[derive(Debug, Default)]
pub struct Calls {
    pub configure: Vec<ZoneConfig>,
    pub normalize: Vec<String>,
    pub validate: Vec<(String, usize)>,
    pub render: Vec<String>,
}

/// An in-process plugin for an arbitrary type that records every call.
///
/// `validate` sees how many records of its type were already normalized
/// (their name is filled in) when zone validation ran.
#[derive(Debug)]
pub struct RecordingPlugin {
    pub rtype: PluginType,
    pub calls: Mutex<Calls>,
    pub suppress: bool,
    pub reject: Option<String>,
}

impl RecordingPlugin {
    pub fn new(rtype: &str) -> Self {
        Self {
            rtype: PluginType::new(rtype),
            calls: Mutex::new(Calls::default()),
            suppress: false,
            reject: None,
        }
    }

    pub fn suppressing(mut self) -> Self {
        self.suppress = true;
        self
    }

    pub fn rejecting(mut self, message: &str) -> Self {
        self.reject = Some(message.to_owned());
        self
    }
}

impl Plugin for RecordingPlugin {
    fn version(&self) -> Result<String, PluginError> {
        Ok("test".into())
    }

    fn types(&self) -> Result<Vec<PluginType>, PluginError> {
        Ok(vec![self.rtype.clone()])
    }

    fn configure(&self, config: &ZoneConfig) -> Result<(), PluginError> {
        self.calls.lock().unwrap().configure.push(config.clone());
        Ok(())
    }

    fn normalize(
        &self,
        _config: &ZoneConfig,
        _zone: &str,
        identifier: &str,
        mut record: ResourceRecord,
    ) -> Result<ResourceRecord, PluginError> {
        self.calls
            .lock()
            .unwrap()
            .normalize
            .push(identifier.to_owned());
        record.default_name(identifier);
        Ok(record)
    }

    fn validate_zone(&self, name: &str, zone: &Zone) -> Result<(), PluginError> {
        let named = zone
            .records_of(&self.rtype)
            .filter(|(_, record)| !record.name.is_empty())
            .count();
        self.calls
            .lock()
            .unwrap()
            .validate
            .push((name.to_owned(), named));

        match &self.reject {
            Some(message) => Err(PluginError::rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn render(
        &self,
        _config: &ZoneConfig,
        identifier: &str,
        record: &ResourceRecord,
    ) -> Result<String, PluginError> {
        self.calls.lock().unwrap().render.push(identifier.to_owned());
        if self.suppress {
            Ok(String::new())
        } else {
            Ok(format_record(record))
        }
    }
}
