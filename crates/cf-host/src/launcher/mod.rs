//! Plugin process manager.
//!
//! A [`PluginSession`] owns the Host RPC Server and the plugin child
//! together. The server is bound before the child is spawned, and dropping
//! the session kills and reaps the child before the server stops, whether
//! the caller returns normally, fails, or unwinds.

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cf_plugin::ListenerError;
use thiserror::Error;
use tracing::{debug, info};

use crate::context::HostContext;
use crate::server::RpcServer;
use crate::service::HostService;

const LAUNCHER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launcher");

/// How the child's standard input is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Share the CLI's stdin, stdout and stderr.
    Interactive,
    /// Give the child an empty stdin; output is still shared.
    Detached,
}

/// Failures starting or supervising a plugin process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The Host RPC Server could not be started; nothing was spawned.
    #[error("failed to start RPC server for plugin '{plugin}': {source}")]
    Bind {
        /// Plugin name.
        plugin: String,
        /// Listener failure.
        #[source]
        source: ListenerError,
    },
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
    /// Waiting for the plugin process failed.
    #[error("failed to wait for plugin '{plugin}': {source}")]
    Wait {
        /// Plugin name.
        plugin: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Starts plugin executables against a fresh Host RPC Server.
pub struct PluginLauncher {
    host: Arc<HostContext>,
}

impl PluginLauncher {
    /// Creates a launcher serving `host` to its plugins.
    #[must_use]
    pub const fn new(host: Arc<HostContext>) -> Self {
        Self { host }
    }

    /// Runs a plugin interactively and blocks until it exits.
    ///
    /// The child runs as `<executable> <port> <args...>` with the CLI's own
    /// standard streams. The server and child are torn down before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot start, the executable cannot
    /// be launched, or waiting fails. A non-zero exit is not an error here.
    pub fn invoke(
        &self,
        plugin: &str,
        executable: &Utf8Path,
        args: &[String],
    ) -> Result<ExitStatus, LaunchError> {
        self.spawn(plugin, executable, args, InputMode::Interactive)?
            .finish()
    }

    /// Starts the server and spawns the plugin, returning the live session.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Bind`] before anything is spawned when the
    /// server cannot start, and [`LaunchError::Spawn`] (with the server
    /// already stopped) when the executable cannot be launched.
    pub fn spawn(
        &self,
        plugin: &str,
        executable: &Utf8Path,
        args: &[String],
        input: InputMode,
    ) -> Result<PluginSession, LaunchError> {
        let service = Arc::new(HostService::new(Arc::clone(&self.host)));
        let server =
            RpcServer::start(Arc::clone(&service)).map_err(|source| LaunchError::Bind {
                plugin: plugin.to_owned(),
                source,
            })?;
        let stdin = match input {
            InputMode::Interactive => Stdio::inherit(),
            InputMode::Detached => Stdio::null(),
        };
        let child = Command::new(executable)
            .arg(server.port().to_string())
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                plugin: plugin.to_owned(),
                path: executable.to_path_buf(),
                source,
            })?;
        info!(
            target: LAUNCHER_TARGET,
            plugin,
            port = server.port(),
            pid = child.id(),
            "plugin started"
        );
        Ok(PluginSession {
            plugin: plugin.to_owned(),
            child,
            server,
            service,
        })
    }
}

/// A running plugin and the server it talks to.
pub struct PluginSession {
    plugin: String,
    child: Child,
    server: RpcServer,
    service: Arc<HostService>,
}

impl PluginSession {
    /// Port of the session's Host RPC Server.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.server.port()
    }

    /// Process id of the plugin.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Host call surface serving this plugin.
    #[must_use]
    pub const fn service(&self) -> &Arc<HostService> {
        &self.service
    }

    /// Blocks until the plugin exits.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Wait`] when the process cannot be waited on.
    pub fn wait(&mut self) -> Result<ExitStatus, LaunchError> {
        let status = self.child.wait().map_err(|source| LaunchError::Wait {
            plugin: self.plugin.clone(),
            source,
        })?;
        debug!(target: LAUNCHER_TARGET, plugin = %self.plugin, %status, "plugin exited");
        Ok(status)
    }

    /// Waits for the plugin and tears the session down.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Wait`] when the process cannot be waited on.
    pub fn finish(mut self) -> Result<ExitStatus, LaunchError> {
        self.wait()
    }
}

impl Drop for PluginSession {
    fn drop(&mut self) {
        // Already-exited children make both calls no-ops.
        self.child.kill().ok();
        self.child.wait().ok();
        self.server.stop().ok();
        debug!(target: LAUNCHER_TARGET, plugin = %self.plugin, "plugin session torn down");
    }
}

#[cfg(test)]
mod tests;
