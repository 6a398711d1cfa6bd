//! Errors raised by the loopback RPC channel and the plugin runtime.
//!
//! Transport failures and call faults share one enum: a fault reported by the
//! remote side arrives as [`RpcError::Remote`] and leaves the connection
//! usable, while the other variants describe a broken or unusable channel.

use std::io;
use std::net::SocketAddr;
use std::num::ParseIntError;
use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced while exchanging RPC frames.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Dialling the peer failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialled.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Reading or writing a frame failed.
    #[error("I/O error on RPC channel: {0}")]
    Io(#[source] Arc<io::Error>),

    /// A frame exceeded the maximum size.
    #[error("RPC frame of {size} bytes exceeds the {max_size} byte limit")]
    FrameTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// The peer closed the stream before replying.
    #[error("RPC peer closed the connection")]
    Closed,

    /// A request or response could not be encoded.
    #[error("failed to encode RPC frame: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// A frame could not be decoded.
    #[error("malformed RPC frame: {0}")]
    Decode(#[source] Arc<serde_json::Error>),

    /// The response id did not match the request.
    #[error("RPC response id {actual} does not match request id {expected}")]
    IdMismatch {
        /// Id sent with the request.
        expected: u64,
        /// Id carried by the response.
        actual: u64,
    },

    /// The method name is not part of the service's method table.
    #[error("unknown RPC method '{method}'")]
    UnknownMethod {
        /// Name that failed to resolve.
        method: String,
    },

    /// The remote side reported a call fault.
    #[error("{method} failed: {message}")]
    Remote {
        /// Method that failed.
        method: String,
        /// Fault message reported by the remote handler.
        message: String,
    },
}

impl RpcError {
    /// Wraps an I/O error.
    #[must_use]
    pub fn io(source: io::Error) -> Self {
        Self::Io(Arc::new(source))
    }

    /// Returns `true` for faults reported by the remote handler.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl From<io::Error> for RpcError {
    fn from(source: io::Error) -> Self {
        Self::io(source)
    }
}

/// Errors raised by [`CliConnection`](crate::CliConnection) calls.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// The plugin was started without a host port argument.
    #[error("plugin was started without a host port argument")]
    MissingPort,

    /// The host port argument is not a valid port number.
    #[error("invalid host port '{value}': {source}")]
    InvalidPort {
        /// Argument as received.
        value: String,
        /// Parse failure.
        #[source]
        source: ParseIntError,
    },

    /// The connection has no host to call, as on the discovery path.
    #[error("{method} is unavailable: no host is listening for this plugin")]
    NoHost {
        /// Method that was attempted.
        method: &'static str,
    },

    /// The call failed on the wire or was rejected by the host.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ConnectionError {
    /// Returns `true` when the host rejected the call but stayed reachable.
    #[must_use]
    pub const fn is_call_fault(&self) -> bool {
        matches!(self, Self::Rpc(error) if error.is_remote())
    }
}

/// Errors raised while running a plugin executable.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Talking to the host failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The discovery server could not be started or failed while serving.
    #[error("plugin discovery server on port {port} failed: {source}")]
    Serve {
        /// Port the server was asked to use.
        port: u16,
        /// Listener failure.
        #[source]
        source: ListenerError,
    },

    /// The plugin was asked to run a command it does not implement.
    #[error("plugin does not implement command '{command}'")]
    UnknownCommand {
        /// Requested command.
        command: String,
    },

    /// The plugin's own logic failed.
    #[error("{message}")]
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl PluginError {
    /// Builds a [`PluginError::Failed`] from a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Errors surfaced while binding or running an RPC listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Binding the loopback socket failed.
    #[error("failed to bind RPC listener at {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Querying the bound address failed.
    #[error("failed to read RPC listener address: {source}")]
    LocalAddr {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The accept thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
