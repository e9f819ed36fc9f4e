/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The length does not fit in the 4-byte prefix.
    #[error("length {0} does not fit in a 32-bit length prefix")]
    LengthOverflow(usize),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection on a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer closed the connection part-way through a frame.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    Truncated { expected: usize, received: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Fold a transport failure (stream option setters) into a frame I/O error.
pub(crate) fn from_transport(err: localchan_transport::TransportError) -> FrameError {
    match err {
        localchan_transport::TransportError::Io(io) => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
