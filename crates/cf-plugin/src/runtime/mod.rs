//! Entry point for plugin executables.
//!
//! The host starts a plugin in one of three modes, chosen by its arguments:
//!
//! - `<port> SendMetadata`: report [`Plugin::metadata`] to the host listening
//!   on `port` and exit (installation hand-shake).
//! - `<port>` alone: serve the discovery surface (`RPC.ListCmds`,
//!   `RPC.CmdExists`, `RPC.Run`) on `127.0.0.1:<port>` until killed.
//! - `<port> <command> [args...]`: run the command interactively with a
//!   [`CliConnection`] back to the host.

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, info};

use crate::connection::{CliConnection, parse_port};
use crate::error::{ConnectionError, PluginError};
use crate::metadata::PluginMetadata;
use crate::protocol::{
    PluginMethod, RequestHandler, RpcListener, RpcRequest, RpcResponse, SEND_METADATA_ARG,
    unknown_method,
};

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Behaviour supplied by a plugin executable.
pub trait Plugin: Send + Sync + 'static {
    /// Describes the plugin and the commands it implements.
    fn metadata(&self) -> PluginMetadata;

    /// Runs one command. `args[0]` is the command's canonical name.
    ///
    /// # Errors
    ///
    /// Returns an error when the command fails; the runtime reports it on
    /// stderr and exits non-zero.
    fn run(&self, connection: &CliConnection, args: &[String]) -> Result<(), PluginError>;
}

/// Mode selected from the plugin's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Report metadata to the host on `port`.
    SendMetadata {
        /// Host port.
        port: u16,
    },
    /// Serve the discovery surface on `port`.
    Discovery {
        /// Port to listen on.
        port: u16,
    },
    /// Run a command with a connection to the host on `port`.
    Run {
        /// Host port.
        port: u16,
        /// Command name followed by its arguments.
        args: Vec<String>,
    },
}

impl Invocation {
    /// Classifies the arguments following the executable path.
    ///
    /// # Errors
    ///
    /// Returns an error when the port argument is missing or invalid.
    pub fn from_args(args: &[String]) -> Result<Self, ConnectionError> {
        let (port_arg, rest) = args.split_first().ok_or(ConnectionError::MissingPort)?;
        let port = parse_port(port_arg)?;
        Ok(match rest {
            [] => Self::Discovery { port },
            [only] if only == SEND_METADATA_ARG => Self::SendMetadata { port },
            _ => Self::Run {
                port,
                args: rest.to_vec(),
            },
        })
    }
}

/// Runs `plugin` with the process arguments and maps the outcome to an exit
/// code.
pub fn start<P: Plugin>(plugin: P) -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run_with_args(plugin, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "{error}").ok();
            ExitCode::FAILURE
        }
    }
}

/// Runs `plugin` for the given arguments (excluding the executable path).
///
/// # Errors
///
/// Returns an error if the arguments are malformed, the host cannot be
/// reached, the discovery server fails, or the command itself fails.
pub fn run_with_args<P: Plugin>(plugin: P, args: &[String]) -> Result<(), PluginError> {
    match Invocation::from_args(args)? {
        Invocation::SendMetadata { port } => {
            let metadata = plugin.metadata();
            debug!(target: RUNTIME_TARGET, plugin = metadata.name(), port, "sending metadata");
            CliConnection::new(port).set_plugin_metadata(&metadata)?;
            Ok(())
        }
        Invocation::Discovery { port } => serve_discovery(Arc::new(plugin), port),
        Invocation::Run { port, args } => plugin.run(&CliConnection::new(port), &args),
    }
}

/// Serves the discovery surface on `127.0.0.1:<port>` until the process is
/// terminated.
///
/// # Errors
///
/// Returns [`PluginError::Serve`] when the port cannot be bound.
pub fn serve_discovery(plugin: Arc<dyn Plugin>, port: u16) -> Result<(), PluginError> {
    let serve_error = |source| PluginError::Serve { port, source };
    let listener = RpcListener::bind_loopback(port).map_err(serve_error)?;
    info!(target: RUNTIME_TARGET, port, "serving plugin discovery");
    listener
        .start(Arc::new(DiscoveryHandler::new(plugin)))
        .map_err(serve_error)?
        .join()
        .map_err(serve_error)
}

/// Answers `RPC.*` requests from the host on behalf of a plugin.
pub struct DiscoveryHandler {
    plugin: Arc<dyn Plugin>,
}

impl DiscoveryHandler {
    /// Wraps `plugin`.
    #[must_use]
    pub fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self { plugin }
    }

    fn dispatch(&self, method: PluginMethod, request: &RpcRequest) -> RpcResponse {
        let id = request.id();
        let outcome = match method {
            PluginMethod::ListCmds => RpcResponse::ok(id, self.plugin.metadata().commands()),
            PluginMethod::CmdExists => request.params::<String>().and_then(|name| {
                RpcResponse::ok(id, &self.plugin.metadata().command_for(&name).is_some())
            }),
            PluginMethod::Run => {
                request
                    .params::<Vec<String>>()
                    .and_then(|args| match self.run(&args) {
                        Ok(()) => RpcResponse::ok(id, &()),
                        Err(error) => Ok(RpcResponse::fault(id, error.to_string())),
                    })
            }
        };
        outcome.unwrap_or_else(|error| RpcResponse::fault(id, error.to_string()))
    }

    fn run(&self, args: &[String]) -> Result<(), PluginError> {
        let requested = args.first().map(String::as_str).unwrap_or_default();
        let metadata = self.plugin.metadata();
        let command = metadata
            .command_for(requested)
            .ok_or_else(|| PluginError::UnknownCommand {
                command: requested.to_owned(),
            })?;
        let mut canonical = args.to_vec();
        if let Some(first) = canonical.first_mut() {
            command.name().clone_into(first);
        }
        self.plugin.run(&CliConnection::detached(), &canonical)
    }
}

impl RequestHandler for DiscoveryHandler {
    fn handle(&self, request: &RpcRequest) -> RpcResponse {
        match PluginMethod::parse(request.method()) {
            Ok(method) => self.dispatch(method, request),
            Err(error) => unknown_method(request, &error),
        }
    }
}

#[cfg(test)]
mod tests;
