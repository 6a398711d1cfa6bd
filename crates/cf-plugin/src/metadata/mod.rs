//! Plugin descriptor types shared by the host and plugin executables.
//!
//! A [`PluginMetadata`] names a plugin, carries its [`VersionType`], and lists
//! the [`PluginCommand`]s it advertises. The host persists these descriptors in
//! the plugin registry at install time and reads them on every invocation to
//! resolve dispatch. Field names serialise in the registry's `PascalCase`
//! layout so existing `config.json` files stay readable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered `major.minor.build` triple advertised by a plugin.
///
/// # Example
///
/// ```
/// use cf_plugin::VersionType;
///
/// let older = VersionType::new(1, 2, 0);
/// let newer = VersionType::new(1, 10, 0);
/// assert!(older < newer);
/// assert_eq!(newer.to_string(), "1.10.0");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub struct VersionType {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Build component.
    pub build: u32,
}

impl VersionType {
    /// Creates a version triple.
    #[must_use]
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Usage text and option descriptions for a plugin command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Usage {
    /// Free-form usage line, e.g. `cf diag APP_NAME`.
    #[serde(default)]
    pub usage: String,
    /// Option name to description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: BTreeMap<String, String>,
}

/// A command advertised by a plugin.
///
/// # Example
///
/// ```
/// use cf_plugin::PluginCommand;
///
/// let command = PluginCommand::new("diag", "run diagnostics")
///     .with_alias("d")
///     .with_usage("cf diag APP_NAME");
/// assert!(command.answers_to("d"));
/// assert!(command.answers_to("diag"));
/// assert!(!command.answers_to(""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginCommand {
    name: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    help_text: String,
    #[serde(default, rename = "UsageDetails")]
    usage_details: Usage,
}

impl PluginCommand {
    /// Creates a command with no alias and no usage text.
    #[must_use]
    pub fn new(name: impl Into<String>, help_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            help_text: help_text.into(),
            usage_details: Usage::default(),
        }
    }

    /// Sets the short alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Sets the usage line.
    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage_details.usage = usage.into();
        self
    }

    /// Adds an option description.
    #[must_use]
    pub fn with_option(mut self, option: impl Into<String>, description: impl Into<String>) -> Self {
        self.usage_details
            .options
            .insert(option.into(), description.into());
        self
    }

    /// Returns the canonical command name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the alias, or `None` when the command has no alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        let alias = self.alias.trim();
        (!alias.is_empty()).then_some(alias)
    }

    /// Returns the one-line help text.
    #[must_use]
    pub const fn help_text(&self) -> &str {
        self.help_text.as_str()
    }

    /// Returns the usage line.
    #[must_use]
    pub const fn usage_text(&self) -> &str {
        self.usage_details.usage.as_str()
    }

    /// Returns the usage details including option descriptions.
    #[must_use]
    pub const fn usage_details(&self) -> &Usage {
        &self.usage_details
    }

    /// Returns `true` when `token` is this command's name or alias.
    #[must_use]
    pub fn answers_to(&self, token: &str) -> bool {
        !token.is_empty() && (self.name == token || self.alias() == Some(token))
    }
}

/// Descriptor a plugin reports about itself.
///
/// # Example
///
/// ```
/// use cf_plugin::{PluginCommand, PluginMetadata, VersionType};
///
/// let metadata = PluginMetadata::new("diagnose", VersionType::new(1, 0, 0))
///     .with_command(PluginCommand::new("diag", "run diagnostics").with_alias("d"));
/// assert_eq!(metadata.command_for("d").map(|c| c.name()), Some("diag"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginMetadata {
    name: String,
    #[serde(default)]
    version: VersionType,
    #[serde(default, deserialize_with = "null_as_default")]
    commands: Vec<PluginCommand>,
}

impl PluginMetadata {
    /// Creates metadata with no commands.
    #[must_use]
    pub fn new(name: impl Into<String>, version: VersionType) -> Self {
        Self {
            name: name.into(),
            version,
            commands: Vec::new(),
        }
    }

    /// Appends an advertised command, preserving declaration order.
    #[must_use]
    pub fn with_command(mut self, command: PluginCommand) -> Self {
        self.commands.push(command);
        self
    }

    /// Returns the plugin name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the plugin version.
    #[must_use]
    pub const fn version(&self) -> VersionType {
        self.version
    }

    /// Returns the advertised commands in declaration order.
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

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests;
