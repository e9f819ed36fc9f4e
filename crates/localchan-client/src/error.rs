use localchan_frame::FrameError;
use localchan_transport::TransportError;

use crate::codec::CodecError;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Dialing the endpoint failed.
    #[error("connect failed: {0}")]
    Connect(#[from] TransportError),

    /// Read or write on the open stream failed.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// The server closed the connection between frames.
    #[error("server disconnected")]
    Disconnected,

    /// The server closed the connection part-way through a frame.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// A frame exceeds the configured maximum payload size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Encoding the request or decoding the response failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A response is still unread; read it before writing again.
    #[error("a response is still pending")]
    ResponsePending,

    /// The client was closed, explicitly or after a fatal stream error.
    #[error("client is closed")]
    Closed,
}

impl ClientError {
    /// Whether this error always leaves the client closed.
    ///
    /// `FrameTooLarge` is fatal only when it comes from an inbound frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Disconnected | Self::TruncatedFrame { .. } | Self::Closed
        )
    }
}

impl From<FrameError> for ClientError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => Self::Transport(io),
            FrameError::ConnectionClosed => Self::Disconnected,
            FrameError::Truncated { expected, received } => {
                Self::TruncatedFrame { expected, received }
            }
            FrameError::PayloadTooLarge { size, max } => Self::FrameTooLarge { size, max },
            FrameError::LengthOverflow(size) => Self::FrameTooLarge {
                size,
                max: u32::MAX as usize,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
