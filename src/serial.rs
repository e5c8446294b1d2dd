//! SOA serial numbers backed by a per-zone change index on disk.
//!
//! Each zone has a `<zone>.serial` document holding the day the index was
//! started (`YYYYMMDD`) and a change counter for that day. Serials are the
//! day followed by the counter, zero padded to two digits, so the first
//! serial of 3 September 2025 is `2025090301`. The counter restarts at 1
//! whenever the day changes and is otherwise incremented.
//!
//! Separate processes may generate the same zone at once, so every
//! read-modify-write of the document happens under an exclusive lock on
//! `<zone>.serial.lock`, acquired with a bounded wait.

use std::{
    fmt,
    fs::{self, File, OpenOptions, TryLockError},
    io::{self, Write as _},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default bound on the wait for another process's lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("creating serial directory {path}: {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {timeout:?} waiting for lock on {path}")]
    LockTimeout { path: Utf8PathBuf, timeout: Duration },

    #[error("locking {path}: {source}")]
    Lock {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of "today" for serial allocation.
pub trait Clock: fmt::Debug + Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Encode a date as `YYYYMMDD`.
pub fn day_base(date: NaiveDate) -> u32 {
    // Years before 0 cannot be produced by a clock we care about.
    (date.year().max(0) as u32) * 10_000 + date.month() * 100 + date.day()
}

/// The persisted state of one zone's serial numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialIndex {
    #[serde(rename = "base_serial_number")]
    pub base: u32,
    pub change_index: u32,
}

impl SerialIndex {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            change_index: 1,
        }
    }

    /// The state following `previous` on a day encoded as `today`.
    pub fn advance(previous: Option<SerialIndex>, today: u32) -> SerialIndex {
        match previous {
            Some(index) if index.base == today => SerialIndex {
                base: today,
                change_index: index.change_index.saturating_add(1),
            },
            _ => SerialIndex::new(today),
        }
    }

    /// The serial string: the base followed by the change index, padded to two digits.
    ///
    /// Indices past 99 widen the serial rather than wrapping.
    pub fn serial(&self) -> String {
        format!("{}{:02}", self.base, self.change_index)
    }
}

impl fmt::Display for SerialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.base, self.change_index)
    }
}

/// Allocates serial numbers from change index files.
///
/// The manager holds no per-zone state; all of it lives on disk so that
/// concurrent processes agree on the next serial.
#[derive(Debug, Clone)]
pub struct SerialNumberManager {
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
}

impl Default for SerialNumberManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialNumberManager {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Path of the change index document for a zone.
    pub fn index_path(directory: &Utf8Path, zone: &str) -> Utf8PathBuf {
        directory.join(format!("{zone}.serial"))
    }

    /// Allocate the next serial for `zone`, persisting the new index.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn next(&self, directory: &Utf8Path, zone: &str) -> Result<String, SerialError> {
        ensure_directory(directory)?;

        let path = Self::index_path(directory, zone);
        let _guard = self.lock(&Utf8PathBuf::from(format!("{path}.lock")))?;

        let previous = read_index(&path)?;
        let index = SerialIndex::advance(previous, day_base(self.clock.today()));
        write_index(directory, &path, &index)?;

        debug!(serial = %index, "allocated serial");
        Ok(index.serial())
    }

    /// Read the persisted index for `zone` without modifying it.
    pub fn current(&self, directory: &Utf8Path, zone: &str) -> Result<Option<SerialIndex>, SerialError> {
        read_index(&Self::index_path(directory, zone))
    }

    fn lock(&self, path: &Utf8Path) -> Result<LockGuard, SerialError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|source| SerialError::Lock {
                path: path.to_owned(),
                source,
            })?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match file.try_lock() {
                Ok(()) => {
                    trace!(%path, "acquired serial lock");
                    return Ok(LockGuard { file });
                }
                Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(TryLockError::WouldBlock) => {
                    return Err(SerialError::LockTimeout {
                        path: path.to_owned(),
                        timeout: self.lock_timeout,
                    });
                }
                Err(TryLockError::Error(source)) => {
                    return Err(SerialError::Lock {
                        path: path.to_owned(),
                        source,
                    });
                }
            }
        }
    }
}

/// Holds the exclusive lock until dropped.
#[derive(Debug)]
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn ensure_directory(directory: &Utf8Path) -> Result<(), SerialError> {
    if directory.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(0o750);
    }

    builder
        .create(directory)
        .map_err(|source| SerialError::CreateDirectory {
            path: directory.to_owned(),
            source,
        })
}

fn read_index(path: &Utf8Path) -> Result<Option<SerialIndex>, SerialError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SerialError::Read {
                path: path.to_owned(),
                source,
            });
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| SerialError::Parse {
            path: path.to_owned(),
            source,
        })
}

fn write_index(directory: &Utf8Path, path: &Utf8Path, index: &SerialIndex) -> Result<(), SerialError> {
    let write_error = |source| SerialError::Write {
        path: path.to_owned(),
        source,
    };

    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(write_error)?;
    serde_json::to_writer(&mut file, index).map_err(|error| write_error(error.into()))?;
    file.write_all(b"\n").map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|error| write_error(error.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_encoding() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
        assert_eq!(day_base(date), 20250903);
    }

    #[test]
    fn advance_state_machine() {
        let first = SerialIndex::advance(None, 20250903);
        assert_eq!(first, SerialIndex::new(20250903));
        assert_eq!(first.serial(), "2025090301");

        let second = SerialIndex::advance(Some(first), 20250903);
        assert_eq!(second.change_index, 2);
        assert_eq!(second.serial(), "2025090302");

        let rollover = SerialIndex::advance(Some(second), 20250904);
        assert_eq!(rollover, SerialIndex::new(20250904));
        assert_eq!(rollover.serial(), "2025090401");
    }

    #[test]
    fn wide_change_index() {
        let index = SerialIndex {
            base: 20250903,
            change_index: 123,
        };
        assert_eq!(index.serial(), "20250903123");
        assert_eq!(index.to_string(), index.serial());
    }

    #[test]
    fn document_ignores_unknown_fields() {
        let index: SerialIndex = serde_json::from_str(
            r#"{"base_serial_number": 20250903, "change_index": 7, "written_by": "future"}"#,
        )
        .unwrap();
        assert_eq!(
            index,
            SerialIndex {
                base: 20250903,
                change_index: 7
            }
        );
    }
}
