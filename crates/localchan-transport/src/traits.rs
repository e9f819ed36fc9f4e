use std::io::{Read, Write};

use crate::error::Result;

/// A connected IPC stream implementing `Read` and `Write`.
///
/// This is the fundamental I/O type returned by the dialer.
/// On Unix, this wraps a Unix domain socket stream.
/// On Windows, this wraps a named pipe client handle.
pub struct IpcStream {
    inner: IpcStreamInner,
}

enum IpcStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    #[cfg(windows)]
    Pipe(std::fs::File),
}

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.read(buf),
            #[cfg(windows)]
            IpcStreamInner::Pipe(pipe) => pipe.read(buf),
        }
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.write(buf),
            #[cfg(windows)]
            IpcStreamInner::Pipe(pipe) => pipe.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.flush(),
            #[cfg(windows)]
            IpcStreamInner::Pipe(pipe) => pipe.flush(),
        }
    }
}

impl IpcStream {
    /// Create an IpcStream from a Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: IpcStreamInner::Unix(stream),
        }
    }

    /// Create an IpcStream from an open named pipe client handle.
    #[cfg(windows)]
    pub fn from_pipe(pipe: std::fs::File) -> Self {
        Self {
            inner: IpcStreamInner::Pipe(pipe),
        }
    }

    /// Set read timeout on the underlying stream.
    ///
    /// Named pipe handles opened for synchronous I/O have no timeout support;
    /// only `None` is accepted there.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(windows)]
            IpcStreamInner::Pipe(_) => pipe_timeout_unsupported(timeout),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(windows)]
            IpcStreamInner::Pipe(_) => pipe_timeout_unsupported(timeout),
        }
    }
}

/// Streams that can tell their peer no more data is coming.
pub trait Shutdown {
    /// Shut down both directions. Handles are released on drop.
    fn shutdown(&self) -> std::io::Result<()>;
}

impl Shutdown for IpcStream {
    fn shutdown(&self) -> std::io::Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.shutdown(std::net::Shutdown::Both),
            // Closing the handle is the only disconnect a pipe client has.
            #[cfg(windows)]
            IpcStreamInner::Pipe(_) => Ok(()),
        }
    }
}

#[cfg(unix)]
impl Shutdown for std::os::unix::net::UnixStream {
    fn shutdown(&self) -> std::io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, std::net::Shutdown::Both)
    }
}

#[cfg(windows)]
fn pipe_timeout_unsupported(timeout: Option<std::time::Duration>) -> Result<()> {
    match timeout {
        None => Ok(()),
        Some(_) => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "named pipe streams do not support I/O timeouts",
        )
        .into()),
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(_) => f.debug_struct("IpcStream").field("type", &"unix").finish(),
            #[cfg(windows)]
            IpcStreamInner::Pipe(_) => f
                .debug_struct("IpcStream")
                .field("type", &"named-pipe")
                .finish(),
        }
    }
}
