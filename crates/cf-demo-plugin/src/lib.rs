//! A small plugin exercising the host call surface.
//!
//! `whoami` (alias `me`) reports the logged-in user and target. `report`
//! (alias `rpt`) checks the CLI version and runs `cf version` through the
//! host with terminal output suppressed, echoing what it captured. Both
//! write to stdout, or to the file named by `--out`.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use cf_plugin::{CliConnection, Plugin, PluginCommand, PluginError, PluginMetadata, VersionType};
use clap::Parser;
use tracing::debug;

const DEMO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Oldest CLI release the plugin supports.
pub const MIN_CLI_VERSION: &str = "6.7.0";

/// The demo plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoPlugin;

#[derive(Debug, Parser)]
struct OutputArgs {
    /// Write results here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Plugin for DemoPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("demo", VersionType::new(1, 0, 0))
            .with_command(
                PluginCommand::new("whoami", "show the current user and target")
                    .with_alias("me")
                    .with_usage("cf whoami [--out FILE]")
                    .with_option("-out", "write the result to FILE"),
            )
            .with_command(
                PluginCommand::new("report", "report on the CLI hosting this plugin")
                    .with_alias("rpt")
                    .with_usage("cf report [--out FILE]")
                    .with_option("-out", "write the result to FILE"),
            )
    }

    fn run(&self, connection: &CliConnection, args: &[String]) -> Result<(), PluginError> {
        let parsed =
            OutputArgs::try_parse_from(args).map_err(|error| PluginError::failed(error.to_string()))?;
        let command = args.first().map(String::as_str).unwrap_or_default();
        debug!(target: DEMO_TARGET, command, "running demo command");
        let lines = match command {
            "whoami" => whoami(connection)?,
            "report" => report(connection)?,
            other => return Err(PluginError::failed(format!("unknown command '{other}'"))),
        };
        emit(parsed.out.as_ref(), &lines)
            .map_err(|error| PluginError::failed(format!("failed to write output: {error}")))
    }
}

fn whoami(connection: &CliConnection) -> Result<Vec<String>, PluginError> {
    if !connection.is_logged_in()? {
        return Ok(vec!["not logged in".to_owned()]);
    }
    Ok(vec![
        format!("user: {}", connection.username()?),
        format!("org: {}", connection.get_current_org()?.name),
        format!("space: {}", connection.get_current_space()?.name),
    ])
}

fn report(connection: &CliConnection) -> Result<Vec<String>, PluginError> {
    let supported = connection.is_min_cli_version(MIN_CLI_VERSION)?;
    let mut lines = vec![format!("cli supported: {supported}")];
    lines.extend(connection.cli_command_without_terminal_output(&["version"])?);
    Ok(lines)
}

fn emit(out: Option<&PathBuf>, lines: &[String]) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match out {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}
