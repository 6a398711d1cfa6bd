//! Host RPC server: the host call surface on an OS-assigned loopback port.

use std::net::SocketAddr;
use std::sync::Arc;

use cf_plugin::ListenerError;
use cf_plugin::protocol::{ListenerHandle, RpcListener};
use tracing::debug;

use crate::service::HostService;

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// A running Host RPC Server.
///
/// The listener is bound before [`RpcServer::start`] returns, so the port
/// is valid as soon as the server exists. Stopping is idempotent and also
/// happens on drop.
#[derive(Debug)]
pub struct RpcServer {
    handle: ListenerHandle,
}

impl RpcServer {
    /// Binds `127.0.0.1:0` and serves `service` on it.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when the port cannot be bound or the
    /// accept loop cannot start.
    pub fn start(service: Arc<HostService>) -> Result<Self, ListenerError> {
        let listener = RpcListener::bind_loopback(0)?;
        let handle = listener.start(service)?;
        debug!(target: SERVER_TARGET, port = handle.port(), "host rpc server listening");
        Ok(Self { handle })
    }

    /// Port plugins connect to.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.handle.port()
    }

    /// Bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Stops accepting connections and waits for the listener to close.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept loop panicked.
    pub fn stop(&mut self) -> Result<(), ListenerError> {
        self.handle.stop()
    }
}

impl Drop for RpcServer {
    fn drop(&mut self) {
        self.handle.stop().ok();
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;
    use std::time::Duration;

    use cf_plugin::CliConnection;

    use super::*;
    use crate::test_support::test_host;

    #[test]
    fn serves_host_calls_on_loopback() {
        let test = test_host(|builder| builder);
        let mut server =
            RpcServer::start(Arc::new(HostService::new(Arc::clone(&test.host)))).expect("start");
        assert!(server.local_addr().ip().is_loopback());
        assert_ne!(server.port(), 0);

        let connection = CliConnection::new(server.port());
        assert_eq!(connection.username().expect("username"), "alice");
        assert!(connection.has_organization().expect("org"));

        server.stop().expect("stop");
        server.stop().expect("second stop");
        let refused = TcpStream::connect_timeout(&server.local_addr(), Duration::from_millis(200));
        assert!(refused.is_err());
    }

    #[test]
    fn drains_output_larger_than_a_request_frame() {
        let test = test_host(|builder| builder);
        let server =
            RpcServer::start(Arc::new(HostService::new(Arc::clone(&test.host)))).expect("start");
        let expected: Vec<String> = (0..12_000).map(|index| format!("{index:0>100}")).collect();
        for line in &expected {
            test.sink().say(line).expect("say");
        }

        let lines = CliConnection::new(server.port())
            .get_output_and_reset()
            .expect("drain");

        assert_eq!(lines, expected);
        assert!(test.sink().drain_lines().is_empty());
    }

    #[test]
    fn concurrent_connections_are_served_independently() {
        let test = test_host(|builder| builder);
        let server =
            RpcServer::start(Arc::new(HostService::new(Arc::clone(&test.host)))).expect("start");
        let port = server.port();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(move || CliConnection::new(port).user_guid().expect("guid"))
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().expect("join"), "u-1");
        }
    }
}
