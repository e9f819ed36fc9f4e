use std::fs::OpenOptions;

use tracing::debug;

use crate::dialer::Connector;
use crate::name::Endpoint;
use crate::traits::IpcStream;

/// Windows named pipe connect strategy.
///
/// Opens the client end of `\\.\pipe\<name>` for synchronous read/write.
/// A pipe that does not exist yet surfaces as `NotFound`; a pipe whose
/// instances are all taken fails with `ERROR_PIPE_BUSY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedPipeConnector;

impl Connector for NamedPipeConnector {
    type Stream = IpcStream;

    fn connect(&self, endpoint: &Endpoint) -> std::io::Result<IpcStream> {
        let path = endpoint.address();
        let pipe = OpenOptions::new().read(true).write(true).open(path)?;
        debug!(?path, "connected to named pipe");
        Ok(IpcStream::from_pipe(pipe))
    }
}
