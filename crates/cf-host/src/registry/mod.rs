//! On-disk record of installed plugins.
//!
//! The registry is a JSON document shaped
//! `{"Plugins": {"<name>": {"Location", "Version", "Commands"}}}`. It is read
//! afresh by every CLI invocation; nothing is cached between runs.

mod store;

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use cf_plugin::{PluginCommand, PluginMetadata, VersionType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::store::PluginStore;

/// Executable location and advertised metadata for one installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginEntry {
    location: Utf8PathBuf,
    #[serde(default)]
    version: VersionType,
    #[serde(default)]
    commands: Vec<PluginCommand>,
}

impl PluginEntry {
    /// Records `metadata` for the executable at `location`.
    #[must_use]
    pub fn new(location: impl Into<Utf8PathBuf>, metadata: &PluginMetadata) -> Self {
        Self {
            location: location.into(),
            version: metadata.version(),
            commands: metadata.commands().to_vec(),
        }
    }

    /// Path of the installed executable.
    #[must_use]
    pub fn location(&self) -> &Utf8Path {
        &self.location
    }

    /// Installed version.
    #[must_use]
    pub const fn version(&self) -> VersionType {
        self.version
    }

    /// Commands in declaration order.
    #[must_use]
    pub fn commands(&self) -> &[PluginCommand] {
        &self.commands
    }

    /// Finds the command answering to `token` by name or alias.
    #[must_use]
    pub fn command_for(&self, token: &str) -> Option<&PluginCommand> {
        self.commands.iter().find(|command| command.answers_to(token))
    }
}

/// A resolved plugin command.
#[derive(Debug, Clone, Copy)]
pub struct CommandMatch<'a> {
    /// Registry key of the plugin.
    pub plugin: &'a str,
    /// Registry entry of the plugin.
    pub entry: &'a PluginEntry,
    /// The matched command.
    pub command: &'a PluginCommand,
}

/// In-memory copy of the plugin registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginConfig {
    #[serde(default)]
    plugins: BTreeMap<String, PluginEntry>,
}

impl PluginConfig {
    /// Returns the entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.get(name)
    }

    /// Iterates plugins in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginEntry)> {
        self.plugins.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Returns `true` when no plugins are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Adds or replaces the entry for `name`.
    pub fn insert(&mut self, name: impl Into<String>, entry: PluginEntry) {
        self.plugins.insert(name.into(), entry);
    }

    /// Removes and returns the entry for `name`.
    pub fn remove(&mut self, name: &str) -> Option<PluginEntry> {
        self.plugins.remove(name)
    }

    /// Finds the plugin command answering to `token` by name or alias.
    #[must_use]
    pub fn find_command(&self, token: &str) -> Option<CommandMatch<'_>> {
        self.iter().find_map(|(plugin, entry)| {
            entry.command_for(token).map(|command| CommandMatch {
                plugin,
                entry,
                command,
            })
        })
    }
}

/// Failures reading or writing the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read plugin registry '{path}': {source}")]
    Read {
        /// Registry file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The registry file is not valid JSON of the expected shape.
    #[error("plugin registry '{path}' is malformed: {source}")]
    Malformed {
        /// Registry file.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The registry file could not be written.
    #[error("failed to write plugin registry '{path}': {source}")]
    Write {
        /// Registry file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests;
