//! Host side of the `cf` plugin subsystem.
//!
//! A CLI invocation resolves its first argument with the [`Dispatcher`]:
//! built-in commands run in process, plugin commands are handed to the
//! [`PluginLauncher`], which starts a loopback [`RpcServer`] serving the
//! [`HostService`] call surface before spawning the plugin, and tears both
//! down together when the plugin exits.
//!
//! While a plugin runs it may ask the host to execute core commands. Their
//! output flows through the [`OutputSink`], which tees every line to the
//! terminal and a capture buffer the plugin drains afterwards. Structured
//! resource calls (`GetApps`, `GetOrg`, ...) run the same commands with
//! terminal output suppressed and return the plugin-facing models from
//! [`cf_plugin::models`] instead of printing tables.
//!
//! The reverse direction, where the host dials a plugin's own RPC surface to
//! list or probe its commands, lives in [`discovery`]. Installation and the
//! on-disk plugin registry live in [`install`] and [`registry`].

pub mod auth;
pub mod commands;
pub mod context;
pub mod discovery;
pub mod dispatch;
pub mod install;
pub mod launcher;
pub mod platform;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
pub mod sink;
pub mod version;

pub use self::auth::{AuthError, Authenticator, StoredTokenAuthenticator};
pub use self::commands::{CommandFault, CommandRegistry, CoreCommand};
pub use self::context::{CommandContext, HostContext, HostContextBuilder};
pub use self::discovery::{DiscoveredCommand, DiscoveryClient, DiscoveryError};
pub use self::dispatch::{DispatchError, Dispatcher, Resolution};
pub use self::install::{InstallError, install_plugin, uninstall_plugin};
pub use self::launcher::{InputMode, LaunchError, PluginLauncher, PluginSession};
pub use self::platform::{Platform, PlatformError, UnconfiguredPlatform};
pub use self::registry::{PluginConfig, PluginEntry, PluginStore, RegistryError};
pub use self::server::RpcServer;
pub use self::service::{HostError, HostService};
pub use self::session::{HostSession, SessionError, SessionHandle};
pub use self::sink::OutputSink;
pub use self::version::{BUILT_FROM_SOURCE, CLI_VERSION};

#[cfg(test)]
mod test_support;
