//! JSONL framing and method tables for the loopback RPC channel.
//!
//! Every frame is a single JSON object terminated by a newline. A client
//! writes an [`RpcRequest`] and reads back exactly one [`RpcResponse`] with
//! the same id; a connection may carry any number of such exchanges in
//! sequence. Both directions of the plugin relationship use this framing:
//! the host serves [`HostMethod`]s under [`HOST_SERVICE`] and a plugin in
//! discovery mode serves [`PluginMethod`]s under [`PLUGIN_SERVICE`].

mod client;
mod methods;
mod server;

use std::io::{BufRead, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

pub use self::client::{CONNECT_TIMEOUT, RpcClient};
pub use self::methods::{HOST_SERVICE, HostMethod, PLUGIN_SERVICE, PluginMethod};
pub use self::server::{
    ListenerHandle, RequestHandler, RpcListener, serve_connection, unknown_method,
};

/// Maximum size of a request frame in bytes, excluding the line ending.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Maximum size of a response frame in bytes, excluding the line ending.
///
/// Responses carry drained command output and resource snapshots, so they
/// get a far larger allowance than requests.
pub const MAX_RESPONSE_FRAME_BYTES: usize = 256 * 1024 * 1024;

/// Argument a plugin receives in place of user arguments when the host asks
/// it to report its metadata during installation.
pub const SEND_METADATA_ARG: &str = "SendMetadata";

/// A single method invocation.
///
/// # Example
///
/// ```
/// use cf_plugin::protocol::{HostMethod, RpcRequest};
///
/// let request = RpcRequest::new(7, HostMethod::Username.name(), &"").expect("encode");
/// assert_eq!(request.method(), "CliRpcCmd.Username");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    id: u64,
    method: String,
    #[serde(default)]
    params: Value,
}

impl RpcRequest {
    /// Builds a request, encoding `params` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encode`] if `params` cannot be serialised.
    pub fn new<P: Serialize + ?Sized>(
        id: u64,
        method: impl Into<String>,
        params: &P,
    ) -> Result<Self, RpcError> {
        let value = serde_json::to_value(params).map_err(|err| RpcError::Encode(err.into()))?;
        Ok(Self {
            id,
            method: method.into(),
            params: value,
        })
    }

    /// Returns the request id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the fully qualified method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Decodes the parameters into the method's argument type.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Decode`] if the parameters do not match `T`.
    pub fn params<T: for<'de> Deserialize<'de>>(&self) -> Result<T, RpcError> {
        T::deserialize(&self.params).map_err(|err| RpcError::Decode(err.into()))
    }
}

/// Reply to an [`RpcRequest`]: exactly one of `result` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl RpcResponse {
    /// Builds a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encode`] if `result` cannot be serialised.
    pub fn ok<R: Serialize + ?Sized>(id: u64, result: &R) -> Result<Self, RpcError> {
        let value = serde_json::to_value(result).map_err(|err| RpcError::Encode(err.into()))?;
        Ok(Self {
            id,
            result: Some(value),
            error: None,
        })
    }

    /// Builds a fault response carrying `message`.
    #[must_use]
    pub fn fault(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Returns the id of the request this response answers.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the fault message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Converts the response into the method's result type.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Remote`] for fault responses and
    /// [`RpcError::Decode`] when the result does not match `R`.
    pub fn into_result<R: for<'de> Deserialize<'de>>(self, method: &str) -> Result<R, RpcError> {
        if let Some(message) = self.error {
            return Err(RpcError::Remote {
                method: method.to_owned(),
                message,
            });
        }
        let value = self.result.unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|err| RpcError::Decode(err.into()))
    }
}

/// Writes `frame` as one JSONL line and flushes.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, frame: &T) -> Result<(), RpcError> {
    let mut bytes = serde_json::to_vec(frame).map_err(|err| RpcError::Encode(err.into()))?;
    bytes.push(b'\n');
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads one request-sized JSONL frame, returning `Ok(None)` on a clean end
/// of stream.
///
/// A trailing partial line at end of stream is returned as a frame.
///
/// # Errors
///
/// Returns [`RpcError::FrameTooLarge`] when the line exceeds
/// [`MAX_FRAME_BYTES`], or an I/O error.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, RpcError> {
    read_frame_within(reader, MAX_FRAME_BYTES)
}

/// Reads one JSONL frame whose body, without its line ending, holds at most
/// `max_size` bytes.
///
/// # Errors
///
/// Returns [`RpcError::FrameTooLarge`] when the body exceeds `max_size`, or
/// an I/O error.
pub fn read_frame_within<R: BufRead>(
    reader: &mut R,
    max_size: usize,
) -> Result<Option<Vec<u8>>, RpcError> {
    let mut buffer = Vec::new();
    // Room for the body plus a CRLF ending.
    let limit = u64::try_from(max_size)
        .unwrap_or(u64::MAX)
        .saturating_add(2);
    let read = reader
        .by_ref()
        .take(limit)
        .read_until(b'\n', &mut buffer)?;
    if read == 0 {
        return Ok(None);
    }
    while buffer.last().is_some_and(u8::is_ascii_whitespace) {
        buffer.pop();
    }
    if buffer.len() > max_size {
        return Err(RpcError::FrameTooLarge {
            size: buffer.len(),
            max_size,
        });
    }
    Ok(Some(buffer))
}

/// Decodes a frame produced by [`read_frame`].
///
/// # Errors
///
/// Returns [`RpcError::Decode`] when the bytes are not valid JSON for `T`.
pub fn decode_frame<T: for<'de> Deserialize<'de>>(frame: &[u8]) -> Result<T, RpcError> {
    serde_json::from_slice(frame).map_err(|err| RpcError::Decode(err.into()))
}
