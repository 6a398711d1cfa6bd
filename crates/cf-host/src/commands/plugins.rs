//! Plugin management commands.

use camino::Utf8PathBuf;
use cf_plugin::PluginCommand;
use clap::Parser;

use super::{CommandFault, CommandMetadata, CoreCommand, Table, parse_args};
use crate::context::CommandContext;
use crate::install;
use crate::registry::PluginConfig;

#[derive(Debug, Parser)]
struct PluginsArgs {
    /// Ask every installed executable for its commands instead of reading
    /// the registry.
    #[arg(long)]
    discover: bool,
}

const PLUGINS: CommandMetadata = CommandMetadata {
    name: "plugins",
    alias: None,
    description: "List commands of installed plugins",
    usage: "cf plugins [--discover]",
};

pub(super) struct PluginsCommand;

impl CoreCommand for PluginsCommand {
    fn metadata(&self) -> CommandMetadata {
        PLUGINS
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<PluginsArgs>(ctx, PLUGINS.name, args)? else {
            return Ok(());
        };
        ctx.say("Listing installed plugins...")?;
        let config = ctx.host().store().load()?;
        let rows: Vec<(String, PluginCommand)> = if parsed.discover {
            ctx.host()
                .discovery()
                .list_all(&config)?
                .into_iter()
                .map(|found| (found.plugin, found.command))
                .collect()
        } else {
            config
                .iter()
                .flat_map(|(plugin, entry)| {
                    entry
                        .commands()
                        .iter()
                        .map(move |command| (plugin.to_owned(), command.clone()))
                })
                .collect()
        };
        ctx.say("")?;
        ctx.say_all(plugin_table(&config, &rows).lines())
    }
}

fn plugin_table(config: &PluginConfig, rows: &[(String, PluginCommand)]) -> Table {
    let mut table = Table::new(&["plugin", "version", "command name", "command help"]);
    for (plugin, command) in rows {
        let version = config
            .get(plugin)
            .map(|entry| entry.version().to_string())
            .unwrap_or_default();
        let label = command.alias().map_or_else(
            || command.name().to_owned(),
            |alias| format!("{}, {alias}", command.name()),
        );
        table.push_row(vec![
            plugin.clone(),
            version,
            label,
            command.help_text().to_owned(),
        ]);
    }
    table
}

#[derive(Debug, Parser)]
struct InstallArgs {
    /// Path to the plugin executable.
    path: Utf8PathBuf,
    /// Replace an installed plugin of the same name.
    #[arg(short = 'f')]
    force: bool,
}

const INSTALL_PLUGIN: CommandMetadata = CommandMetadata {
    name: "install-plugin",
    alias: None,
    description: "Install CLI plugin",
    usage: "cf install-plugin PLUGIN_PATH [-f]",
};

pub(super) struct InstallPluginCommand;

impl CoreCommand for InstallPluginCommand {
    fn metadata(&self) -> CommandMetadata {
        INSTALL_PLUGIN
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<InstallArgs>(ctx, INSTALL_PLUGIN.name, args)? else {
            return Ok(());
        };
        ctx.say(format!("Installing plugin {}...", parsed.path))?;
        let metadata = install::install_plugin(ctx.host(), &parsed.path, parsed.force)?;
        ctx.ok()?;
        ctx.say(format!(
            "Plugin {} v{} successfully installed.",
            metadata.name(),
            metadata.version()
        ))
    }
}

#[derive(Debug, Parser)]
struct UninstallArgs {
    /// Name of the installed plugin.
    name: String,
}

const UNINSTALL_PLUGIN: CommandMetadata = CommandMetadata {
    name: "uninstall-plugin",
    alias: None,
    description: "Uninstall CLI plugin",
    usage: "cf uninstall-plugin PLUGIN_NAME",
};

pub(super) struct UninstallPluginCommand;

impl CoreCommand for UninstallPluginCommand {
    fn metadata(&self) -> CommandMetadata {
        UNINSTALL_PLUGIN
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<UninstallArgs>(ctx, UNINSTALL_PLUGIN.name, args)? else {
            return Ok(());
        };
        ctx.say(format!("Uninstalling plugin {}...", parsed.name))?;
        install::uninstall_plugin(ctx.host(), &parsed.name)?;
        ctx.ok()?;
        ctx.say(format!("Plugin {} successfully uninstalled.", parsed.name))
    }
}
