//! Plugin contract for the `cf` command-line client.
//!
//! Plugins are independently built executables that extend `cf` with extra
//! commands. The host launches a plugin with the port of a loopback RPC
//! server followed by the user's arguments; the plugin may call back into
//! the host through a [`CliConnection`] to run core commands, read session
//! state, or fetch structured resource snapshots from [`models`].
//!
//! The host also starts plugins in two non-interactive modes: the
//! installation hand-shake, where the plugin reports its
//! [`PluginMetadata`], and the discovery path, where the plugin serves its
//! own RPC surface so the host can list or probe its commands. [`start`]
//! selects the mode from the process arguments.
//!
//! # Architecture
//!
//! Both directions share one wire format: newline-delimited JSON frames over
//! a loopback TCP stream, with requests named `<Service>.<Method>` and drawn
//! from closed method tables ([`HostMethod`], [`PluginMethod`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use cf_plugin::{CliConnection, Plugin, PluginCommand, PluginError, PluginMetadata, VersionType};
//!
//! struct Hello;
//!
//! impl Plugin for Hello {
//!     fn metadata(&self) -> PluginMetadata {
//!         PluginMetadata::new("hello", VersionType::new(1, 0, 0))
//!             .with_command(PluginCommand::new("hello", "greet the current user"))
//!     }
//!
//!     fn run(&self, connection: &CliConnection, _args: &[String]) -> Result<(), PluginError> {
//!         let user = connection.username()?;
//!         tracing::info!(%user, "greeting");
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     cf_plugin::start(Hello)
//! }
//! ```

pub mod connection;
pub mod error;
pub mod metadata;
pub mod models;
pub mod protocol;
pub mod runtime;

pub use self::connection::CliConnection;
pub use self::error::{ConnectionError, ListenerError, PluginError, RpcError};
pub use self::metadata::{PluginCommand, PluginMetadata, Usage, VersionType};
pub use self::protocol::{HostMethod, PluginMethod};
pub use self::runtime::{Invocation, Plugin, run_with_args, start};
