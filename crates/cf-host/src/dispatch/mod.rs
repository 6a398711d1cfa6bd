//! Routes a command line to a built-in command or an installed plugin.
//!
//! Built-ins win over plugins. The plugin registry is read only when the
//! token is not a built-in, and afresh on every dispatch, so an install in
//! one invocation is visible to the next. A plugin alias is replaced by the
//! command's canonical name before the plugin is launched.

use std::process::ExitStatus;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::commands::{CommandFault, CoreCommand};
use crate::context::{CommandContext, HostContext};
use crate::launcher::{LaunchError, PluginLauncher};
use crate::registry::RegistryError;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Command used when no arguments are given.
pub const DEFAULT_COMMAND: &str = "help";

/// Plugin command selected for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginTarget {
    /// Registry name of the plugin.
    pub plugin: String,
    /// Installed executable.
    pub executable: Utf8PathBuf,
    /// Canonical command name, never the alias.
    pub command: String,
}

/// Outcome of resolving the first token of a command line.
pub enum Resolution {
    /// A core command compiled into the CLI.
    BuiltIn(Arc<dyn CoreCommand>),
    /// A command advertised by an installed plugin.
    Plugin(PluginTarget),
    /// Neither a built-in nor a plugin command.
    Unknown,
}

/// Failures surfaced to the user by [`Dispatcher::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The plugin registry could not be read.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The token names no command.
    #[error("'{command}' is not a registered command. See 'cf help'")]
    UnknownCommand {
        /// Token the user typed.
        command: String,
    },
    /// A built-in command failed.
    #[error("{source}")]
    Command {
        /// Command name.
        command: String,
        /// Failure reported by the command.
        #[source]
        source: Box<CommandFault>,
    },
    /// The plugin could not be launched.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// The plugin exited unsuccessfully.
    #[error("plugin '{plugin}' failed running '{command}': {status}")]
    PluginFailed {
        /// Plugin name.
        plugin: String,
        /// Canonical command name.
        command: String,
        /// Exit status of the plugin process.
        status: ExitStatus,
    },
}

/// Resolves and runs command lines for one CLI invocation.
pub struct Dispatcher {
    host: Arc<HostContext>,
}

impl Dispatcher {
    /// Creates a dispatcher over `host`.
    #[must_use]
    pub const fn new(host: Arc<HostContext>) -> Self {
        Self { host }
    }

    /// Resolves `token` against built-ins, then the plugin registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the token is not a built-in and the
    /// registry cannot be read.
    pub fn resolve(&self, token: &str) -> Result<Resolution, RegistryError> {
        if let Some(command) = self.host.commands().find(token) {
            return Ok(Resolution::BuiltIn(command));
        }
        let plugins = self.host.store().load()?;
        Ok(plugins
            .find_command(token)
            .map_or(Resolution::Unknown, |found| {
                Resolution::Plugin(PluginTarget {
                    plugin: found.plugin.to_owned(),
                    executable: found.entry.location().to_path_buf(),
                    command: found.command.name().to_owned(),
                })
            }))
    }

    /// Runs `args` (command name first). An empty command line shows help.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the command is unknown, fails, or
    /// its plugin cannot be launched or exits unsuccessfully.
    pub fn dispatch(&self, args: &[String]) -> Result<(), DispatchError> {
        let (token, rest) = args
            .split_first()
            .map_or((DEFAULT_COMMAND, &[][..]), |(first, rest)| (first.as_str(), rest));
        match self.resolve(token)? {
            Resolution::BuiltIn(command) => self.run_builtin(command.as_ref(), rest),
            Resolution::Plugin(target) => self.run_plugin(&target, rest),
            Resolution::Unknown => Err(DispatchError::UnknownCommand {
                command: token.to_owned(),
            }),
        }
    }

    fn run_builtin(&self, command: &dyn CoreCommand, args: &[String]) -> Result<(), DispatchError> {
        let name = command.metadata().name;
        debug!(target: DISPATCH_TARGET, command = name, "running built-in command");
        let mut ctx = CommandContext::new(Arc::clone(&self.host));
        command
            .execute(&mut ctx, args)
            .map_err(|source| DispatchError::Command {
                command: name.to_owned(),
                source: Box::new(source),
            })
    }

    fn run_plugin(&self, target: &PluginTarget, args: &[String]) -> Result<(), DispatchError> {
        info!(
            target: DISPATCH_TARGET,
            plugin = %target.plugin,
            command = %target.command,
            "dispatching to plugin"
        );
        let forwarded: Vec<String> = std::iter::once(target.command.clone())
            .chain(args.iter().cloned())
            .collect();
        let status = PluginLauncher::new(Arc::clone(&self.host)).invoke(
            &target.plugin,
            &target.executable,
            &forwarded,
        )?;
        if status.success() {
            Ok(())
        } else {
            Err(DispatchError::PluginFailed {
                plugin: target.plugin.clone(),
                command: target.command.clone(),
                status,
            })
        }
    }
}


#[cfg(all(test, unix))]
mod behaviour;
