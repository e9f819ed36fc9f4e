use std::os::unix::net::UnixStream;

use tracing::debug;

use crate::dialer::Connector;
use crate::name::Endpoint;
use crate::traits::IpcStream;

/// Unix domain socket connect strategy.
///
/// Connects to filesystem-path sockets on Linux and macOS. A missing socket
/// file surfaces as `NotFound` and a socket nobody listens on as
/// `ConnectionRefused`, which the dialer treats as "not ready yet".
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSocketConnector;

impl Connector for UnixSocketConnector {
    type Stream = IpcStream;

    fn connect(&self, endpoint: &Endpoint) -> std::io::Result<IpcStream> {
        let path = endpoint.address();
        let stream = UnixStream::connect(path)?;
        debug!(?path, "connected to unix domain socket");
        Ok(IpcStream::from_unix(stream))
    }
}
