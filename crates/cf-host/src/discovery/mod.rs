//! Client side of the plugin discovery path.
//!
//! Each query spawns the plugin as `<executable> <port>`, polls the fixed
//! discovery port until the plugin's own RPC server accepts a connection,
//! issues one `RPC.*` call, and then kills and reaps the child. Nothing
//! stays resident between queries.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use cf_config::{DEFAULT_DISCOVERY_PORT, DEFAULT_DISCOVERY_TIMEOUT_MS};
use cf_plugin::protocol::RpcClient;
use cf_plugin::{PluginCommand, PluginMethod, RpcError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::PluginConfig;

const DISCOVERY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::discovery");

/// Interval between connection attempts while a plugin starts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Failures on the discovery path.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The plugin executable could not be started.
    #[error("failed to launch plugin '{plugin}' from '{path}': {source}")]
    Spawn {
        /// Plugin name.
        plugin: String,
        /// Executable path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The plugin exited before it accepted a connection.
    #[error("plugin '{plugin}' exited before serving discovery ({status})")]
    Exited {
        /// Plugin name.
        plugin: String,
        /// Exit status of the plugin.
        status: ExitStatus,
    },
    /// The plugin did not accept a connection in time.
    #[error("plugin '{plugin}' did not listen on port {port} within {timeout:?}: {source}")]
    NotReady {
        /// Plugin name.
        plugin: String,
        /// Discovery port.
        port: u16,
        /// Configured readiness timeout.
        timeout: Duration,
        /// Last connection failure.
        #[source]
        source: RpcError,
    },
    /// Polling the child's state failed.
    #[error("failed to check on plugin '{plugin}': {source}")]
    Wait {
        /// Plugin name.
        plugin: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The call itself failed.
    #[error("plugin '{plugin}' discovery call failed: {source}")]
    Call {
        /// Plugin name.
        plugin: String,
        /// RPC failure or fault.
        #[source]
        source: RpcError,
    },
}

/// A command reported by a plugin during bulk discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCommand {
    /// Registry name of the plugin.
    pub plugin: String,
    /// Command as the plugin declares it.
    pub command: PluginCommand,
}

/// Queries plugins over their own RPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryClient {
    port: u16,
    timeout: Duration,
}

impl Default for DiscoveryClient {
    fn default() -> Self {
        Self::new(
            DEFAULT_DISCOVERY_PORT,
            Duration::from_millis(DEFAULT_DISCOVERY_TIMEOUT_MS),
        )
    }
}

impl DiscoveryClient {
    /// Creates a client dialling `127.0.0.1:<port>`, waiting up to
    /// `timeout` for each plugin to start listening.
    #[must_use]
    pub const fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    /// Returns the discovery port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the readiness timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Lists the commands the plugin declares, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] when the plugin cannot be started,
    /// never listens, or the call fails.
    pub fn list_commands(
        &self,
        plugin: &str,
        executable: &Utf8Path,
    ) -> Result<Vec<PluginCommand>, DiscoveryError> {
        self.query(plugin, executable, |client| {
            client.call(PluginMethod::ListCmds.name(), &())
        })
    }

    /// Asks the plugin whether it implements `command` (name or alias).
    ///
    /// # Errors
    ///
    /// See [`DiscoveryClient::list_commands`].
    pub fn command_exists(
        &self,
        plugin: &str,
        executable: &Utf8Path,
        command: &str,
    ) -> Result<bool, DiscoveryError> {
        self.query(plugin, executable, |client| {
            client.call(PluginMethod::CmdExists.name(), command)
        })
    }

    /// Runs a command inside the discovery process. The plugin has no host
    /// connection on this path.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryClient::list_commands`]; a failing command arrives as
    /// [`DiscoveryError::Call`].
    pub fn run_command(
        &self,
        plugin: &str,
        executable: &Utf8Path,
        args: &[String],
    ) -> Result<(), DiscoveryError> {
        self.query(plugin, executable, |client| {
            client.call(PluginMethod::Run.name(), args)
        })
    }

    /// Lists every installed plugin's commands, one plugin at a time.
    ///
    /// Plugins are visited in registry order and each plugin's commands
    /// keep their declaration order.
    ///
    /// # Errors
    ///
    /// Stops at the first plugin that cannot be queried.
    pub fn list_all(&self, config: &PluginConfig) -> Result<Vec<DiscoveredCommand>, DiscoveryError> {
        let mut found = Vec::new();
        for (plugin, entry) in config.iter() {
            let commands = self.list_commands(plugin, entry.location())?;
            found.extend(commands.into_iter().map(|command| DiscoveredCommand {
                plugin: plugin.to_owned(),
                command,
            }));
        }
        Ok(found)
    }

    fn query<R>(
        &self,
        plugin: &str,
        executable: &Utf8Path,
        call: impl FnOnce(&mut RpcClient) -> Result<R, RpcError>,
    ) -> Result<R, DiscoveryError> {
        let child = Command::new(executable)
            .arg(self.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DiscoveryError::Spawn {
                plugin: plugin.to_owned(),
                path: executable.to_path_buf(),
                source,
            })?;
        debug!(target: DISCOVERY_TARGET, plugin, pid = child.id(), port = self.port, "discovery child started");
        let mut guard = DiscoveryChild {
            plugin: plugin.to_owned(),
            child,
        };
        let mut client = self.await_ready(&mut guard)?;
        call(&mut client).map_err(|source| DiscoveryError::Call {
            plugin: plugin.to_owned(),
            source,
        })
    }

    fn await_ready(&self, guard: &mut DiscoveryChild) -> Result<RpcClient, DiscoveryError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let started = Instant::now();
        loop {
            let error = match RpcClient::connect(addr, POLL_INTERVAL) {
                Ok(client) => return Ok(client),
                Err(error) => error,
            };
            let exited = guard.child.try_wait().map_err(|source| DiscoveryError::Wait {
                plugin: guard.plugin.clone(),
                source,
            })?;
            if let Some(status) = exited {
                return Err(DiscoveryError::Exited {
                    plugin: guard.plugin.clone(),
                    status,
                });
            }
            if started.elapsed() >= self.timeout {
                return Err(DiscoveryError::NotReady {
                    plugin: guard.plugin.clone(),
                    port: self.port,
                    timeout: self.timeout,
                    source: error,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Kills and reaps the discovery child on every exit path.
struct DiscoveryChild {
    plugin: String,
    child: Child,
}

impl Drop for DiscoveryChild {
    fn drop(&mut self) {
        if let Err(error) = self.child.kill() {
            // Already exited; reaping below still applies.
            debug!(target: DISCOVERY_TARGET, plugin = %self.plugin, %error, "kill skipped");
        }
        match self.child.wait() {
            Ok(status) => {
                debug!(target: DISCOVERY_TARGET, plugin = %self.plugin, %status, "discovery child reaped");
            }
            Err(error) => {
                warn!(target: DISCOVERY_TARGET, plugin = %self.plugin, %error, "failed to reap discovery child");
            }
        }
    }
}
