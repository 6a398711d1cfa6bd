//! Entrypoint for the `cf` binary.
//!
//! Delegates to [`cf_cli::run`], which loads configuration, installs
//! telemetry and dispatches the command line to a built-in command or an
//! installed plugin.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    cf_cli::run(std::env::args_os(), &mut io::stderr().lock())
}
