//! Default values shared by the CLI and its tests.

use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Fixed loopback port a plugin listens on during discovery.
pub const DEFAULT_DISCOVERY_PORT: u16 = 20080;

/// Upper bound, in milliseconds, on waiting for a discovery child to accept.
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 2000;

/// Environment variable naming the CLI home directory.
pub const CF_HOME_ENV: &str = "CF_HOME";

/// Environment variable naming the plugin home directory.
pub const CF_PLUGIN_HOME_ENV: &str = "CF_PLUGIN_HOME";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
