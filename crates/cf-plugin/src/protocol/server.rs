//! Loopback listener that serves JSONL requests on background threads.

use std::io::{self, BufReader, BufWriter};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{RpcRequest, RpcResponse, decode_frame, read_frame, write_frame};
use crate::error::{ListenerError, RpcError};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::listener");
const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Answers decoded requests for one RPC service.
pub trait RequestHandler: Send + Sync + 'static {
    /// Produces the response for `request`. Implementations must not panic.
    fn handle(&self, request: &RpcRequest) -> RpcResponse;
}

/// TCP listener bound to the loopback interface.
#[derive(Debug)]
pub struct RpcListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl RpcListener {
    /// Binds `127.0.0.1:<port>`; port `0` asks the OS for a free port.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] when the address is unavailable.
    pub fn bind_loopback(port: u16) -> Result<Self, ListenerError> {
        let requested = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(requested).map_err(|source| ListenerError::Bind {
            addr: requested,
            source,
        })?;
        let addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self { listener, addr })
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the bound port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Starts the accept loop on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NonBlocking`] if the socket cannot be made
    /// non-blocking.
    pub fn start(self, handler: Arc<dyn RequestHandler>) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let addr = self.addr;
        let handle = thread::spawn(move || run_accept_loop(&self, &shutdown_flag, &handler));
        Ok(ListenerHandle {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to a running accept loop.
///
/// Dropping the handle raises the stop flag; [`ListenerHandle::stop`]
/// additionally waits for the accept thread so the port is released on
/// return.
#[derive(Debug)]
pub struct ListenerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Returns the address being served.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port being served.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Raises the stop flag without waiting.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Stops the accept loop and waits for it to release the socket.
    ///
    /// Calling `stop` more than once is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn stop(&mut self) -> Result<(), ListenerError> {
        self.shutdown();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }

    /// Blocks until the accept loop exits.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &RpcListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn RequestHandler>,
) {
    info!(target: LISTENER_TARGET, addr = %listener.addr, "rpc listener active");
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match listener.listener.accept() {
            Ok((stream, peer)) => {
                last_error = None;
                if let Err(error) = stream.set_nonblocking(false) {
                    warn!(target: LISTENER_TARGET, %peer, error = %error, "dropping connection");
                    continue;
                }
                let connection_handler = Arc::clone(handler);
                thread::spawn(move || serve_connection(stream, connection_handler.as_ref()));
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                // A stop request may race with the failure; stay quiet then.
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(target: LISTENER_TARGET, error = %error, "rpc accept error");
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(target: LISTENER_TARGET, addr = %listener.addr, "rpc listener stopped");
}

/// Serves sequential requests on `stream` until the peer disconnects.
///
/// Call faults are answered and the connection stays open; undecodable or
/// oversized frames close it.
pub fn serve_connection(stream: TcpStream, handler: &dyn RequestHandler) {
    let mut reader = match stream.try_clone() {
        Ok(clone) => BufReader::new(clone),
        Err(error) => {
            warn!(target: LISTENER_TARGET, error = %error, "failed to clone connection");
            return;
        }
    };
    let mut writer = BufWriter::new(stream);
    loop {
        let frame = match read_frame(&mut reader) {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(error) => {
                warn!(target: LISTENER_TARGET, error = %error, "closing connection");
                break;
            }
        };
        if frame.is_empty() {
            continue;
        }
        let request: RpcRequest = match decode_frame(&frame) {
            Ok(request) => request,
            Err(error) => {
                warn!(target: LISTENER_TARGET, error = %error, "closing connection");
                break;
            }
        };
        debug!(target: LISTENER_TARGET, method = request.method(), id = request.id(), "request");
        let response = handler.handle(&request);
        if let Err(error) = write_frame(&mut writer, &response) {
            warn!(target: LISTENER_TARGET, error = %error, "failed to write response");
            break;
        }
    }
}

/// Builds the response for a request whose method is outside the table.
#[must_use]
pub fn unknown_method(request: &RpcRequest, error: &RpcError) -> RpcResponse {
    warn!(target: LISTENER_TARGET, method = request.method(), "unknown rpc method");
    RpcResponse::fault(request.id(), error.to_string())
}
