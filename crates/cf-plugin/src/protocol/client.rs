//! Blocking JSONL client for one loopback RPC connection.

use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    MAX_RESPONSE_FRAME_BYTES, RpcRequest, RpcResponse, decode_frame, read_frame_within,
    write_frame,
};
use crate::error::RpcError;

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::rpc");

/// Timeout applied when dialling a loopback peer.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// A connected RPC client issuing sequential request/response exchanges.
#[derive(Debug)]
pub struct RpcClient {
    addr: SocketAddr,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    next_id: u64,
}

impl RpcClient {
    /// Dials `addr`, waiting at most `timeout` for the connection.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Connect`] when the peer is unreachable.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, RpcError> {
        let connect_error = |source: io::Error| RpcError::Connect {
            addr,
            source: Arc::new(source),
        };
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(connect_error)?;
        stream.set_nodelay(true).map_err(connect_error)?;
        let writer = stream.try_clone().map_err(connect_error)?;
        Ok(Self {
            addr,
            reader: BufReader::new(stream),
            writer: BufWriter::new(writer),
            next_id: 1,
        })
    }

    /// Returns the address of the peer.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.addr
    }

    /// Invokes `method` with `params` and decodes the result.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Remote`] when the peer reports a fault, or a
    /// transport error when the exchange cannot complete.
    pub fn call<P, R>(&mut self, method: &str, params: &P) -> Result<R, RpcError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let request = RpcRequest::new(id, method, params)?;
        debug!(target: CLIENT_TARGET, peer = %self.addr, method, id, "sending request");
        write_frame(&mut self.writer, &request)?;

        let frame = read_frame_within(&mut self.reader, MAX_RESPONSE_FRAME_BYTES)?
            .ok_or(RpcError::Closed)?;
        let response: RpcResponse = decode_frame(&frame)?;
        if response.id() != id {
            return Err(RpcError::IdMismatch {
                expected: id,
                actual: response.id(),
            });
        }
        response.into_result(method)
    }
}
