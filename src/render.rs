//! Zone file text.
//!
//! A rendered zone starts with `$ORIGIN` and, when the zone has one, a `$TTL`
//! directive, followed by one entry per record in identifier order. Each
//! record is rendered by its type's plugin; the formatting helpers here give
//! every plugin the same fixed-width layout:
//!
//! ```text
//! host1                                    A      1.2.3.4 ;web server
//! example.com.                             SOA    (
//!     ns1.example.com.
//!     hostmaster.example.com.
//!     2025090301              ;serial
//!     3600
//!     600
//!     86400
//!     300
//! )
//! ```

use std::fmt::Write as _;
use std::io::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::config::ZoneConfig;
use crate::error::ZoneError;
use crate::normalize::{configure_phase, resolve_config};
use crate::plugin::PluginRegistry;
use crate::rr::{RecordValue, ResourceRecord, TtlDirective, Value, Zone};

/// Width of the name column.
pub const NAME_WIDTH: usize = 40;

/// Width of the type column.
pub const TYPE_WIDTH: usize = 6;

/// Indentation of each value inside a parenthesized record.
pub const VALUE_INDENT: &str = "    ";

/// Format a record in whichever form its data takes.
pub fn format_record(record: &ResourceRecord) -> String {
    match &record.data {
        RecordValue::Single(value) => format_single(record, value),
        RecordValue::Multi(values) => format_multi(record, values),
    }
}

/// `<name> <type> [class] [ttl] <value> [;comment]`
pub fn format_single(record: &ResourceRecord, value: &Value) -> String {
    let mut line = header(record);
    line.push(' ');
    line.push_str(&value.value);
    if let Some(comment) = &value.comment {
        let _ = write!(line, " ;{comment}");
    }
    line
}

/// The header line followed by `(`, one indented line per value with
/// comments aligned, and a closing `)` in the first column.
pub fn format_multi(record: &ResourceRecord, values: &[Value]) -> String {
    let width = values
        .iter()
        .map(|value| value.value.len())
        .max()
        .unwrap_or(0);

    let mut text = header(record);
    text.push_str(" (\n");
    for value in values {
        match &value.comment {
            Some(comment) => {
                let _ = writeln!(text, "{VALUE_INDENT}{:<width$} ;{comment}", value.value);
            }
            None => {
                let _ = writeln!(text, "{VALUE_INDENT}{}", value.value);
            }
        }
    }
    text.push(')');
    text
}

fn header(record: &ResourceRecord) -> String {
    let mut line = format!(
        "{:<NAME_WIDTH$} {:<TYPE_WIDTH$}",
        record.name,
        record.rtype.as_str()
    );
    if let Some(class) = record.class.as_deref().filter(|class| !class.is_empty()) {
        line.push(' ');
        line.push_str(class);
    }
    if let Some(ttl) = record.ttl {
        let _ = write!(line, " {ttl}");
    }
    line
}

fn ttl_directive(ttl: &TtlDirective) -> Option<String> {
    let value = ttl.value?;
    let mut line = format!("$TTL {value}");
    if let Some(comment) = &ttl.comment {
        let _ = write!(line, " ;{comment}");
    }
    Some(line)
}

/// Renders normalized zones through the plugin registry.
#[derive(Debug, Clone)]
pub struct ZoneRenderer<'r> {
    registry: &'r PluginRegistry,
    defaults: Option<ZoneConfig>,
}

impl<'r> ZoneRenderer<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self {
            registry,
            defaults: None,
        }
    }

    /// Configuration used for zones that carry none of their own.
    pub fn with_defaults(mut self, defaults: ZoneConfig) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Render one zone to zone file text.
    ///
    /// Plugins are configured for the zone again first, so a zone may be
    /// rendered without having been normalized by the same engine.
    #[tracing::instrument(skip_all, fields(zone = %name), level = "debug")]
    pub fn render(&self, name: &str, zone: &Zone) -> Result<String, ZoneError> {
        let config = resolve_config(name, zone.config.as_ref(), self.defaults.as_ref())?;

        let mut text = format!("$ORIGIN {name}\n");
        if let Some(line) = zone.ttl.as_ref().and_then(ttl_directive) {
            text.push_str(&line);
            text.push('\n');
        }

        configure_phase(self.registry, name, &config)?;

        for (identifier, record) in zone.records() {
            let plugin = self
                .registry
                .lookup(&record.rtype)
                .ok_or_else(|| ZoneError::no_plugin(name, identifier, &record.rtype))?;

            let rendered = plugin
                .render(&config, identifier, record)
                .map_err(|source| ZoneError::Render {
                    zone: name.to_owned(),
                    identifier: identifier.clone(),
                    source,
                })?;

            if rendered.is_empty() {
                debug!(%identifier, "record suppressed by plugin");
                continue;
            }
            text.push_str(&rendered);
            text.push('\n');
        }

        Ok(text)
    }
}

/// Write rendered zone text to `<directory>/<zone>`.
///
/// The file is written to a temporary name and renamed into place, so it is
/// either complete or absent.
pub fn write_zone_file(directory: &Utf8Path, zone: &str, text: &str) -> Result<Utf8PathBuf, ZoneError> {
    let path = directory.join(zone);
    let write_error = |source| ZoneError::Write {
        zone: zone.to_owned(),
        path: path.clone(),
        source,
    };

    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(write_error)?;
    file.write_all(text.as_bytes()).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(&path).map_err(|error| write_error(error.error))?;

    debug!(%path, "wrote zone file");
    Ok(path)
}
