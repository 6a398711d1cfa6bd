//! Layered configuration for the `cf` command-line client.
//!
//! [`Config`] merges built-in defaults, an optional TOML configuration file,
//! `CF_*` environment variables, and command-line flags, in that order of
//! increasing precedence. Only flags that precede the command token are
//! considered; the CLI splits them off before loading.

mod defaults;
mod logging;
mod paths;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    CF_HOME_ENV, CF_PLUGIN_HOME_ENV, DEFAULT_DISCOVERY_PORT, DEFAULT_DISCOVERY_TIMEOUT_MS,
    DEFAULT_LOG_FILTER, default_log_filter, default_log_format,
};
pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::paths::{CfPaths, PathsError};

/// Flags consumed by the configuration loader rather than the command.
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--plugin-home",
    "--cf-home",
    "--discovery-port",
    "--discovery-timeout-ms",
];

/// Runtime configuration for the CLI and its plugin subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CF")]
pub struct Config {
    /// Tracing filter expression, e.g. `cf_host=debug`.
    #[serde(default)]
    log_filter: Option<String>,
    /// Diagnostic output format.
    #[serde(default)]
    log_format: Option<LogFormat>,
    /// Base directory for installed plugins.
    #[serde(default)]
    plugin_home: Option<Utf8PathBuf>,
    /// Base directory for session state.
    #[serde(default)]
    cf_home: Option<Utf8PathBuf>,
    /// Loopback port plugins listen on during discovery.
    #[serde(default)]
    discovery_port: Option<u16>,
    /// How long to wait for a discovery child to accept connections.
    #[serde(default)]
    discovery_timeout_ms: Option<u64>,
}

impl Config {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Returns the diagnostic output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Returns the plugin home override, if configured.
    #[must_use]
    pub fn plugin_home(&self) -> Option<&Utf8Path> {
        self.plugin_home.as_deref()
    }

    /// Returns the CLI home override, if configured.
    #[must_use]
    pub fn cf_home(&self) -> Option<&Utf8Path> {
        self.cf_home.as_deref()
    }

    /// Returns the discovery port.
    #[must_use]
    pub fn discovery_port(&self) -> u16 {
        self.discovery_port.unwrap_or(DEFAULT_DISCOVERY_PORT)
    }

    /// Returns the discovery readiness timeout.
    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(
            self.discovery_timeout_ms
                .unwrap_or(DEFAULT_DISCOVERY_TIMEOUT_MS),
        )
    }

    /// Overrides the log filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Overrides the log format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Overrides the plugin home directory.
    #[must_use]
    pub fn with_plugin_home(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.plugin_home = Some(path.into());
        self
    }

    /// Overrides the CLI home directory.
    #[must_use]
    pub fn with_cf_home(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.cf_home = Some(path.into());
        self
    }

    /// Overrides the discovery port.
    #[must_use]
    pub const fn with_discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = Some(port);
        self
    }

    /// Overrides the discovery timeout.
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "warn");
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.discovery_port(), 20080);
        assert_eq!(config.discovery_timeout(), Duration::from_secs(2));
        assert!(config.cf_home().is_none());
        assert!(config.plugin_home().is_none());
    }

    #[rstest]
    #[case::json("json", LogFormat::Json)]
    #[case::compact("compact", LogFormat::Compact)]
    #[case::mixed_case("JSON", LogFormat::Json)]
    fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(text.parse::<LogFormat>().expect("parse"), expected);
    }

    #[test]
    fn builders_override_defaults() {
        let config = Config::default()
            .with_log_filter("cf_host=debug")
            .with_discovery_port(3000)
            .with_discovery_timeout(Duration::from_millis(250));
        assert_eq!(config.log_filter(), "cf_host=debug");
        assert_eq!(config.discovery_port(), 3000);
        assert_eq!(config.discovery_timeout(), Duration::from_millis(250));
    }
}
