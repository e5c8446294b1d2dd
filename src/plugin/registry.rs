//! The type → plugin mapping.
//!
//! A registry is assembled once with a [`PluginRegistryBuilder`]: builtins
//! first, then any executables found in the plugins directory. Later
//! registrations replace earlier ones for the same [`PluginType`]. Once built
//! the registry is immutable and may be shared between threads.

use std::{collections::BTreeMap, fmt, fs, io, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::rr::PluginType;

use super::{ExternalPlugin, Plugin, PluginError, PluginMetadata, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("reading plugin directory {path}: {source}")]
    Discover {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("starting plugin {path}: {source}")]
    Spawn {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("plugin {path} handshake failed: {source}")]
    Handshake {
        path: Utf8PathBuf,
        #[source]
        source: TransportError,
    },

    #[error("plugin {path} did not report its types: {source}")]
    Dispense {
        path: Utf8PathBuf,
        #[source]
        source: PluginError,
    },
}

/// A plugin together with where it came from.
#[derive(Debug, Clone)]
pub struct RegisteredPlugin {
    metadata: PluginMetadata,
    plugin: Arc<dyn Plugin>,
}

impl RegisteredPlugin {
    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }
}

/// Collects plugins before freezing them into a [`PluginRegistry`].
#[derive(Debug, Default)]
pub struct PluginRegistryBuilder {
    plugins: BTreeMap<PluginType, RegisteredPlugin>,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-process plugin for `rtype`.
    pub fn register_builtin(
        &mut self,
        rtype: PluginType,
        name: impl Into<String>,
        plugin: Arc<dyn Plugin>,
    ) -> &mut Self {
        self.register(
            rtype,
            RegisteredPlugin {
                metadata: PluginMetadata::builtin(name),
                plugin,
            },
        );
        self
    }

    /// Start every executable in `directory` and register it for each type it declares.
    ///
    /// Any plugin that cannot be started or does not answer the handshake
    /// fails the whole load.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn load_external(&mut self, directory: &Utf8Path) -> Result<&mut Self, RegistryError> {
        for path in discover(directory)? {
            let plugin = ExternalPlugin::spawn(&path)
                .map_err(|source| RegistryError::Spawn {
                    path: path.clone(),
                    source,
                })?
                .handshake()
                .map_err(|source| RegistryError::Handshake {
                    path: path.clone(),
                    source,
                })?;

            let types = plugin.types().map_err(|source| RegistryError::Dispense {
                path: path.clone(),
                source,
            })?;

            let metadata = plugin.metadata();
            let plugin: Arc<dyn Plugin> = Arc::new(plugin);
            if types.is_empty() {
                warn!(plugin = %metadata, "plugin declares no record types");
            }

            for rtype in types {
                self.register(
                    rtype,
                    RegisteredPlugin {
                        metadata: metadata.clone(),
                        plugin: plugin.clone(),
                    },
                );
            }
        }
        Ok(self)
    }

    fn register(&mut self, rtype: PluginType, entry: RegisteredPlugin) {
        let existing = self.plugins.get(&rtype);
        match Replaced::classify(existing, &entry) {
            Replaced::Nothing => debug!(%rtype, plugin = %entry.metadata, "registered plugin"),
            Replaced::Itself => {
                debug!(%rtype, plugin = %entry.metadata, "plugin declares type more than once");
            }
            Replaced::Builtin(previous) => info!(
                %rtype,
                builtin = %previous.name,
                plugin = %entry.metadata,
                "plugin overrides builtin"
            ),
            Replaced::External(previous) => warn!(
                %rtype,
                %previous,
                plugin = %entry.metadata,
                "plugin overrides another external plugin, plugin set is ambiguous"
            ),
        }
        self.plugins.insert(rtype, entry);
    }

    pub fn build(self) -> PluginRegistry {
        PluginRegistry {
            plugins: self.plugins,
        }
    }
}

/// What a new registration displaces for its type.
#[derive(Debug, PartialEq, Eq)]
enum Replaced<'a> {
    Nothing,
    Itself,
    Builtin(&'a PluginMetadata),
    External(&'a PluginMetadata),
}

impl<'a> Replaced<'a> {
    fn classify(existing: Option<&'a RegisteredPlugin>, entry: &RegisteredPlugin) -> Self {
        match existing {
            None => Replaced::Nothing,
            Some(existing) if Arc::ptr_eq(&existing.plugin, &entry.plugin) => Replaced::Itself,
            Some(existing) if existing.metadata.is_built_in => Replaced::Builtin(&existing.metadata),
            Some(existing) => Replaced::External(&existing.metadata),
        }
    }
}

/// Immutable mapping from record type to the plugin handling it.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<PluginType, RegisteredPlugin>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.plugins.iter().map(|(k, v)| (k, &v.metadata)))
            .finish()
    }
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::new()
    }

    /// The plugin for `rtype`, if one is registered.
    pub fn lookup(&self, rtype: &PluginType) -> Option<&dyn Plugin> {
        self.plugins.get(rtype).map(RegisteredPlugin::plugin)
    }

    pub fn metadata(&self, rtype: &PluginType) -> Option<&PluginMetadata> {
        self.plugins.get(rtype).map(RegisteredPlugin::metadata)
    }

    pub fn types(&self) -> impl Iterator<Item = &PluginType> {
        self.plugins.keys()
    }

    /// Every distinct registered plugin, once each, in type order of first appearance.
    ///
    /// A plugin registered for several types is yielded once.
    pub fn plugins(&self) -> impl Iterator<Item = &RegisteredPlugin> {
        let mut seen: Vec<&Arc<dyn Plugin>> = Vec::new();
        self.plugins.values().filter(move |entry| {
            if seen.iter().any(|p| Arc::ptr_eq(p, &entry.plugin)) {
                false
            } else {
                seen.push(&entry.plugin);
                true
            }
        })
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Executables directly inside `directory`, in file name order.
///
/// Regular files with any execute bit set are candidates. Subdirectories are
/// skipped, not searched. A missing directory has no candidates.
pub fn discover(directory: &Utf8Path) -> Result<Vec<Utf8PathBuf>, RegistryError> {
    let discover_error = |source| RegistryError::Discover {
        path: directory.to_owned(),
        source,
    };

    let entries = match directory.read_dir_utf8() {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(%directory, "plugin directory does not exist");
            return Ok(Vec::new());
        }
        Err(error) => return Err(discover_error(error)),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(discover_error)?;
        let path = entry.path();
        let metadata = fs::metadata(path).map_err(discover_error)?;

        if metadata.is_dir() {
            info!(%path, "skipping directory in plugin directory");
            continue;
        }

        if metadata.is_file() && is_executable(&metadata) {
            candidates.push(path.to_owned());
        } else {
            debug!(%path, "skipping non-executable file");
        }
    }

    candidates.sort();
    Ok(candidates)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;
    use crate::rr::{ResourceRecord, Zone};

    #[derive(Debug)]
    struct Named(&'static str);

    impl Plugin for Named {
        fn version(&self) -> Result<String, PluginError> {
            Ok(self.0.into())
        }

        fn types(&self) -> Result<Vec<PluginType>, PluginError> {
            Ok(vec![])
        }

        fn configure(&self, _config: &ZoneConfig) -> Result<(), PluginError> {
            Ok(())
        }

        fn normalize(
            &self,
            _config: &ZoneConfig,
            _zone: &str,
            _identifier: &str,
            record: ResourceRecord,
        ) -> Result<ResourceRecord, PluginError> {
            Ok(record)
        }

        fn validate_zone(&self, _name: &str, _zone: &Zone) -> Result<(), PluginError> {
            Ok(())
        }

        fn render(
            &self,
            _config: &ZoneConfig,
            _identifier: &str,
            _record: &ResourceRecord,
        ) -> Result<String, PluginError> {
            Ok(String::new())
        }
    }

    #[test]
    fn last_registration_wins() {
        let mut builder = PluginRegistry::builder();
        builder
            .register_builtin(PluginType::A, "first", Arc::new(Named("first")))
            .register_builtin(PluginType::A, "second", Arc::new(Named("second")));
        let registry = builder.build();

        let plugin = registry.lookup(&PluginType::A).unwrap();
        assert_eq!(plugin.version().unwrap(), "second");
        assert_eq!(registry.metadata(&PluginType::A).unwrap().name, "second");
        assert!(registry.lookup(&PluginType::new("MX")).is_none());
    }

    #[test]
    fn shared_plugin_listed_once() {
        let shared: Arc<dyn Plugin> = Arc::new(Named("multi"));
        let mut builder = PluginRegistry::builder();
        builder
            .register_builtin(PluginType::new("MX"), "multi", shared.clone())
            .register_builtin(PluginType::new("TXT"), "multi", shared)
            .register_builtin(PluginType::A, "a", Arc::new(Named("a")));
        let registry = builder.build();

        assert_eq!(registry.len(), 3);
        let names: Vec<_> = registry
            .plugins()
            .map(|p| p.metadata().name.as_str())
            .collect();
        assert_eq!(names, ["a", "multi"]);
    }

    #[test]
    fn override_classification() {
        let shared: Arc<dyn Plugin> = Arc::new(Named("alpha"));
        let builtin = RegisteredPlugin {
            metadata: PluginMetadata::builtin("mx"),
            plugin: Arc::new(Named("mx")),
        };
        let alpha = RegisteredPlugin {
            metadata: PluginMetadata::external("alpha", "/plugins/alpha"),
            plugin: shared.clone(),
        };
        let alpha_again = RegisteredPlugin {
            metadata: PluginMetadata::external("alpha", "/plugins/alpha"),
            plugin: shared,
        };
        let beta = RegisteredPlugin {
            metadata: PluginMetadata::external("beta", "/plugins/beta"),
            plugin: Arc::new(Named("beta")),
        };

        assert_eq!(Replaced::classify(None, &alpha), Replaced::Nothing);
        assert_eq!(
            Replaced::classify(Some(&builtin), &alpha),
            Replaced::Builtin(&builtin.metadata)
        );
        assert_eq!(
            Replaced::classify(Some(&alpha), &beta),
            Replaced::External(&alpha.metadata)
        );
        assert_eq!(Replaced::classify(Some(&alpha), &alpha_again), Replaced::Itself);
    }

    #[test]
    fn builtin_metadata() {
        let mut builder = PluginRegistry::builder();
        builder.register_builtin(PluginType::NS, "ns", Arc::new(Named("ns")));
        let registry = builder.build();

        let metadata = registry.metadata(&PluginType::NS).unwrap();
        assert!(metadata.is_built_in);
        assert_eq!(metadata.command, crate::plugin::BUILT_IN);
    }
}
