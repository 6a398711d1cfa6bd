//! Built-in core commands and the registry that resolves them.
//!
//! A core command parses its own arguments with `clap`, reads the session
//! and platform through its [`CommandContext`], and writes user-facing text
//! through the context's output sink. Failures are returned as
//! [`CommandFault`]s; the host call surface and the CLI decide how to report
//! them.

mod fault;
mod help;
mod models;
mod plugins;
mod resources;
mod table;
mod target;

use std::iter;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;

pub use self::fault::CommandFault;
pub use self::table::Table;

use crate::context::CommandContext;

/// Static description of a core command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandMetadata {
    /// Canonical name.
    pub name: &'static str,
    /// Optional short alias.
    pub alias: Option<&'static str>,
    /// One-line description shown by `help`.
    pub description: &'static str,
    /// Usage synopsis.
    pub usage: &'static str,
}

impl CommandMetadata {
    /// Returns `true` if `token` is this command's name or alias.
    #[must_use]
    pub fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.alias == Some(token)
    }
}

/// A command compiled into the CLI.
pub trait CoreCommand: Send + Sync {
    /// Describes the command.
    fn metadata(&self) -> CommandMetadata;

    /// Runs the command with `args` (excluding the command name).
    ///
    /// # Errors
    ///
    /// Returns a [`CommandFault`] when the command cannot complete.
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault>;
}

/// Ordered set of core commands.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn CoreCommand>>,
}

impl CommandRegistry {
    /// Registry holding every built-in command.
    #[must_use]
    pub fn builtin() -> Self {
        let commands: Vec<Arc<dyn CoreCommand>> = vec![
            Arc::new(resources::AppCommand),
            Arc::new(resources::AppsCommand),
            Arc::new(resources::OrgCommand),
            Arc::new(resources::OrgsCommand),
            Arc::new(resources::SpaceCommand),
            Arc::new(resources::SpacesCommand),
            Arc::new(resources::ServiceCommand),
            Arc::new(resources::ServicesCommand),
            Arc::new(resources::OrgUsersCommand),
            Arc::new(resources::SpaceUsersCommand),
            Arc::new(target::TargetCommand),
            Arc::new(plugins::PluginsCommand),
            Arc::new(plugins::InstallPluginCommand),
            Arc::new(plugins::UninstallPluginCommand),
            Arc::new(help::HelpCommand),
            Arc::new(help::VersionCommand),
        ];
        Self { commands }
    }

    /// Adds `command`, shadowing any earlier command with the same name.
    #[must_use]
    pub fn with(mut self, command: Arc<dyn CoreCommand>) -> Self {
        let name = command.metadata().name;
        self.commands.retain(|existing| existing.metadata().name != name);
        self.commands.push(command);
        self
    }

    /// Finds the command answering to `token` by name or alias.
    #[must_use]
    pub fn find(&self, token: &str) -> Option<Arc<dyn CoreCommand>> {
        self.commands
            .iter()
            .find(|command| command.metadata().answers_to(token))
            .map(Arc::clone)
    }

    /// Returns `true` if `token` names a core command or alias.
    #[must_use]
    pub fn exists(&self, token: &str) -> bool {
        self.find(token).is_some()
    }

    /// Metadata of every command in registration order.
    pub fn metadata(&self) -> impl Iterator<Item = CommandMetadata> + '_ {
        self.commands.iter().map(|command| command.metadata())
    }
}

/// Parses `args` for the command `name`. Help requests are rendered to the
/// context and yield `None`.
pub(crate) fn parse_args<T: Parser>(
    ctx: &CommandContext,
    name: &str,
    args: &[String],
) -> Result<Option<T>, CommandFault> {
    match T::try_parse_from(iter::once(name).chain(args.iter().map(String::as_str))) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(error) if error.kind() == ErrorKind::DisplayHelp => {
            ctx.say(error.render().to_string().trim_end())?;
            Ok(None)
        }
        Err(error) => Err(CommandFault::Usage {
            command: name.to_owned(),
            message: error.render().to_string().trim_end().to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests;
