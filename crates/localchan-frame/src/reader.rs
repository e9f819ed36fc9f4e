use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{decode_length, Frame, LENGTH_PREFIX_SIZE};
use crate::error::{FrameError, Result};

/// Read exactly one frame: the 4-byte prefix, then exactly that many bytes.
///
/// Short reads are reassembled and nothing past the frame is consumed. EOF
/// before the first prefix byte is [`FrameError::ConnectionClosed`]; EOF
/// anywhere later is [`FrameError::Truncated`].
pub(crate) fn read_frame_from<R: Read + ?Sized>(
    inner: &mut R,
    buf: &mut BytesMut,
    max_payload: usize,
) -> Result<Frame> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    match read_full(inner, &mut prefix)? {
        0 => return Err(FrameError::ConnectionClosed),
        n if n < LENGTH_PREFIX_SIZE => {
            return Err(FrameError::Truncated {
                expected: LENGTH_PREFIX_SIZE,
                received: n,
            })
        }
        _ => {}
    }

    let payload_len = decode_length(prefix) as usize;
    if payload_len > max_payload {
        debug!(size = payload_len, max = max_payload, "rejecting oversize inbound frame");
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    buf.clear();
    buf.resize(payload_len, 0);
    let received = read_full(inner, &mut buf[..])?;
    if received < payload_len {
        return Err(FrameError::Truncated {
            expected: payload_len,
            received,
        });
    }

    trace!(len = payload_len, "frame read");
    Ok(Frame {
        payload: buf.split().freeze(),
    })
}

/// Fill `dst` from the stream, stopping early only at EOF.
fn read_full<R: Read + ?Sized>(inner: &mut R, dst: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < dst.len() {
        match inner.read(&mut dst[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}
