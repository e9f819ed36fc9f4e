use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::encode_frame;
use crate::error::{FrameError, Result};

/// Encode prefix and payload into `buf`, write all of it, then flush.
///
/// Nothing is written when the payload is rejected. Only `Interrupted` is
/// retried; `WouldBlock` and `TimedOut` mean a write timeout expired and are
/// returned as [`FrameError::Io`].
pub(crate) fn write_frame_to<W: Write + ?Sized>(
    inner: &mut W,
    buf: &mut BytesMut,
    payload: &[u8],
    max_payload: usize,
) -> Result<()> {
    if payload.len() > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: max_payload,
        });
    }

    buf.clear();
    encode_frame(payload, buf)?;

    let mut offset = 0usize;
    while offset < buf.len() {
        match inner.write(&buf[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    trace!(len = payload.len(), "frame written");
    flush_stream(inner)
}

fn flush_stream<W: Write + ?Sized>(inner: &mut W) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
