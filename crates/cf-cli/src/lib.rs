//! Runtime behind the `cf` binary.
//!
//! [`run`] splits configuration flags from the command line, loads
//! [`cf_config::Config`], installs telemetry, builds the host context from
//! the configured directories, and hands the command line to the
//! [`Dispatcher`]. Any failure is printed as `FAILED` followed by the reason
//! and turns into a non-zero exit code.

mod config;
mod errors;
pub mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use cf_config::CfPaths;
use cf_host::{DiscoveryClient, Dispatcher, HostContext, PluginStore, SessionHandle};
use tracing::debug;

use crate::config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use crate::errors::AppError;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Runs the CLI for `args` (program name first), reporting failures on
/// `stderr`.
pub fn run<I, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
{
    run_with_loader(args, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, E, L>(args: I, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    match execute(&args, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(stderr, "FAILED").ok();
            writeln!(stderr, "{error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn execute<L: ConfigLoader>(args: &[OsString], loader: &L) -> Result<(), AppError> {
    let split = split_config_arguments(args);
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;
    let command_line = split
        .command
        .into_iter()
        .map(|argument| {
            argument
                .into_string()
                .map_err(|raw| AppError::NonUtf8Argument {
                    argument: raw.to_string_lossy().into_owned(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let paths = CfPaths::from_config(&config)?;
    debug!(
        target: CLI_TARGET,
        cf_home = %paths.cf_home(),
        plugin_home = %paths.plugin_home(),
        "resolved CLI directories"
    );
    let session = SessionHandle::load(&paths.session_file())?;
    let host = HostContext::builder(PluginStore::from_paths(&paths))
        .session(session)
        .discovery(DiscoveryClient::new(
            config.discovery_port(),
            config.discovery_timeout(),
        ))
        .build();
    Dispatcher::new(host).dispatch(&command_line)?;
    Ok(())
}
