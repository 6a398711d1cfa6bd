//! `help` and `version`.

use clap::Parser;

use super::{CommandFault, CommandMetadata, CoreCommand, Table, parse_args};
use crate::context::CommandContext;
use crate::registry::PluginConfig;

#[derive(Debug, Parser)]
struct HelpArgs {
    /// Command to describe.
    command: Option<String>,
    /// Accepted for compatibility; every command is always listed.
    #[arg(short = 'a')]
    all: bool,
}

const HELP: CommandMetadata = CommandMetadata {
    name: "help",
    alias: Some("h"),
    description: "Show help",
    usage: "cf help [COMMAND]",
};

pub(super) struct HelpCommand;

impl CoreCommand for HelpCommand {
    fn metadata(&self) -> CommandMetadata {
        HELP
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<HelpArgs>(ctx, HELP.name, args)? else {
            return Ok(());
        };
        let plugins = ctx.host().store().load()?;
        match parsed.command {
            Some(token) => describe(ctx, &plugins, &token),
            None => list_all(ctx, &plugins),
        }
    }
}

fn list_all(ctx: &CommandContext, plugins: &PluginConfig) -> Result<(), CommandFault> {
    ctx.say("USAGE:")?;
    ctx.say("   cf [global options] command [arguments...] [command options]")?;
    ctx.say("")?;
    ctx.say("COMMANDS:")?;
    let mut builtins = Table::new(&[]);
    for command in ctx.host().commands().metadata() {
        builtins.push_row(vec![format!("   {}", command.name), command.description.to_owned()]);
    }
    ctx.say_all(builtins.lines().into_iter().skip(1))?;
    if plugins.is_empty() {
        return Ok(());
    }
    ctx.say("")?;
    ctx.say("INSTALLED PLUGIN COMMANDS:")?;
    let mut installed = Table::new(&[]);
    for (_, entry) in plugins.iter() {
        for command in entry.commands() {
            installed.push_row(vec![
                format!("   {}", command.name()),
                command.help_text().to_owned(),
            ]);
        }
    }
    ctx.say_all(installed.lines().into_iter().skip(1))
}

fn describe(ctx: &CommandContext, plugins: &PluginConfig, token: &str) -> Result<(), CommandFault> {
    if let Some(command) = ctx.host().commands().find(token) {
        let metadata = command.metadata();
        ctx.say_all([
            "NAME:".to_owned(),
            format!("   {} - {}", metadata.name, metadata.description),
            String::new(),
            "USAGE:".to_owned(),
            format!("   {}", metadata.usage),
        ])?;
        if let Some(alias) = metadata.alias {
            ctx.say_all([String::new(), "ALIAS:".to_owned(), format!("   {alias}")])?;
        }
        return Ok(());
    }
    let Some(found) = plugins.find_command(token) else {
        return Err(CommandFault::failed(format!(
            "'{token}' is not a registered command. See 'cf help'"
        )));
    };
    let command = found.command;
    ctx.say_all([
        "NAME:".to_owned(),
        format!("   {} - {}", command.name(), command.help_text()),
        String::new(),
        "USAGE:".to_owned(),
        format!("   {}", command.usage_text()),
    ])?;
    if let Some(alias) = command.alias() {
        ctx.say_all([String::new(), "ALIAS:".to_owned(), format!("   {alias}")])?;
    }
    let options = &command.usage_details().options;
    if !options.is_empty() {
        ctx.say("")?;
        ctx.say("OPTIONS:")?;
        let mut table = Table::new(&[]);
        for (option, description) in options {
            table.push_row(vec![format!("   -{option}"), description.clone()]);
        }
        ctx.say_all(table.lines().into_iter().skip(1))?;
    }
    Ok(())
}

const VERSION: CommandMetadata = CommandMetadata {
    name: "version",
    alias: Some("-v"),
    description: "Print the version",
    usage: "cf version",
};

pub(super) struct VersionCommand;

impl CoreCommand for VersionCommand {
    fn metadata(&self) -> CommandMetadata {
        VERSION
    }

    fn execute(&self, ctx: &mut CommandContext, _args: &[String]) -> Result<(), CommandFault> {
        ctx.say(format!("cf version {}", ctx.host().cli_version()))
    }
}
