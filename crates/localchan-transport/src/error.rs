use std::path::PathBuf;
use std::time::Duration;

use crate::name::Endpoint;

/// Errors that can occur while naming or dialing an IPC endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel name cannot be mapped onto an endpoint.
    #[error("invalid channel name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Connecting failed with an error that retrying will not fix.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        source: std::io::Error,
    },

    /// The endpoint stayed unavailable for the whole attempt budget.
    #[error("endpoint {endpoint} still unavailable after {attempts} attempts: {source}")]
    RetriesExhausted {
        endpoint: Endpoint,
        attempts: u32,
        source: std::io::Error,
    },

    /// The endpoint stayed unavailable until the dial deadline.
    #[error("endpoint {endpoint} still unavailable after {elapsed:?} ({attempts} attempts)")]
    DeadlineElapsed {
        endpoint: Endpoint,
        elapsed: Duration,
        attempts: u32,
    },

    /// The dial was cancelled by the caller.
    #[error("dial to {endpoint} cancelled after {attempts} attempts")]
    Cancelled { endpoint: Endpoint, attempts: u32 },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
