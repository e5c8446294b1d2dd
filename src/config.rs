//! Per-zone generation settings.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Configuration applied to a zone while it is normalized and rendered.
///
/// Zones without a configuration of their own fall back to the
/// process-wide defaults handed to the normalization engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Allocate SOA serial numbers from the on-disk change index.
    pub generate_serial: bool,

    /// Derive `in-addr.arpa.` zones from the zone's A records.
    pub generate_reverse_lookup_zones: bool,

    /// Directory holding one `<zone>.serial` file per zone.
    pub serial_change_index_directory: Utf8PathBuf,

    /// Directory scanned (non-recursively) for external plugin executables.
    pub plugins_directory: Utf8PathBuf,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            generate_serial: false,
            generate_reverse_lookup_zones: false,
            serial_change_index_directory: Utf8PathBuf::from("serials"),
            plugins_directory: Utf8PathBuf::from("plugins"),
        }
    }
}

impl ZoneConfig {
    pub fn with_generate_serial(mut self, generate_serial: bool) -> Self {
        self.generate_serial = generate_serial;
        self
    }

    pub fn with_reverse_lookup_zones(mut self, generate: bool) -> Self {
        self.generate_reverse_lookup_zones = generate;
        self
    }

    pub fn with_serial_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.serial_change_index_directory = directory.into();
        self
    }

    pub fn with_plugins_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.plugins_directory = directory.into();
        self
    }

    /// Make the serial change index directory absolute, relative to the
    /// current working directory.
    pub(crate) fn absolutize(&mut self) -> io::Result<()> {
        self.serial_change_index_directory = absolute(&self.serial_change_index_directory)?;
        Ok(())
    }
}

fn absolute(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let absolute = std::path::absolute(path.as_std_path())?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|path| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not valid UTF-8: {}", path.display()),
        )
    })
}
