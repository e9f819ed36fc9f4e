//! Length-prefixed message framing for local IPC.
//!
//! Every message on the wire is a 4-byte big-endian unsigned payload length
//! followed by exactly that many payload bytes. Readers reassemble short
//! reads, so callers only ever see complete frames, and a peer that hangs up
//! mid-frame is reported as a truncated frame rather than short data.

pub mod channel;
pub mod codec;
pub mod error;
mod reader;
mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use channel::FramedChannel;
pub use codec::{
    decode_frame, decode_length, encode_frame, encode_length, Frame, FrameConfig,
    DEFAULT_MAX_PAYLOAD, LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, Result};

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
