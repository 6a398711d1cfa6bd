//! Executable wrapper for [`cf_demo_plugin::DemoPlugin`].

use std::io;
use std::process::ExitCode;

use cf_demo_plugin::DemoPlugin;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Diagnostics share stderr with the host; stay silent unless asked.
    let filter = EnvFilter::try_from_env("CF_PLUGIN_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
    cf_plugin::start(DemoPlugin)
}
