//! Loading and atomically saving the registry file.

use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cf_config::CfPaths;
use tempfile::Builder;
use tracing::debug;

use super::{PluginConfig, RegistryError};

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Location of the registry file and the installed executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginStore {
    registry_file: Utf8PathBuf,
    plugins_dir: Utf8PathBuf,
}

impl PluginStore {
    /// Uses the directories derived from configuration.
    #[must_use]
    pub fn from_paths(paths: &CfPaths) -> Self {
        Self {
            registry_file: paths.plugin_registry_file(),
            plugins_dir: paths.plugins_dir(),
        }
    }

    /// Stores executables and the registry file directly under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<Utf8PathBuf>) -> Self {
        let plugins_dir = dir.into();
        Self {
            registry_file: plugins_dir.join("config.json"),
            plugins_dir,
        }
    }

    /// Registry file path.
    #[must_use]
    pub fn registry_file(&self) -> &Utf8Path {
        &self.registry_file
    }

    /// Directory installed executables are copied into.
    #[must_use]
    pub fn plugins_dir(&self) -> &Utf8Path {
        &self.plugins_dir
    }

    /// Reads the registry. A missing or empty file is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(&self) -> Result<PluginConfig, RegistryError> {
        let path = &self.registry_file;
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(target: REGISTRY_TARGET, %path, "no plugin registry; nothing installed");
                return Ok(PluginConfig::default());
            }
            Err(source) => {
                return Err(RegistryError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(PluginConfig::default());
        }
        serde_json::from_str(&text).map_err(|source| RegistryError::Malformed {
            path: path.clone(),
            source,
        })
    }

    /// Replaces the registry file with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, config: &PluginConfig) -> Result<(), RegistryError> {
        let write_error = |source| RegistryError::Write {
            path: self.registry_file.clone(),
            source,
        };
        let mut bytes = serde_json::to_vec_pretty(config)
            .map_err(|error| write_error(io::Error::new(io::ErrorKind::InvalidData, error)))?;
        bytes.push(b'\n');
        atomic_write(&self.registry_file, &bytes).map_err(write_error)
    }
}

fn atomic_write(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "registry path did not have a parent directory",
        )
    })?;
    fs::create_dir_all(directory)?;
    let mut file = Builder::new()
        .prefix(path.file_name().unwrap_or("config.json"))
        .tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
