//! A framed view over a single bidirectional stream.
//!
//! Request/response clients talk over one handle, so reading and writing
//! share the stream and its timeouts.

use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};
use localchan_transport::IpcStream;

use crate::codec::FrameConfig;
use crate::error::{from_transport, Result};
use crate::reader::read_frame_from;
use crate::writer::write_frame_to;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Length-prefixed messages over one `Read + Write` stream.
pub struct FramedChannel<T> {
    inner: T,
    read_buf: BytesMut,
    write_buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read + Write> FramedChannel<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            read_buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            write_buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write one frame and flush it.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<()> {
        write_frame_to(
            &mut self.inner,
            &mut self.write_buf,
            payload,
            self.config.max_payload_size,
        )
    }

    /// Read exactly one frame and return its payload.
    pub fn read_message(&mut self) -> Result<Bytes> {
        let frame = read_frame_from(
            &mut self.inner,
            &mut self.read_buf,
            self.config.max_payload_size,
        )?;
        Ok(frame.payload)
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FramedChannel<IpcStream> {
    /// Wrap an `IpcStream`, applying both timeouts from config.
    ///
    /// An expired timeout surfaces from `read_message`/`write_message` as
    /// [`FrameError::Io`](crate::FrameError::Io) with kind `WouldBlock` or
    /// `TimedOut`, depending on the platform.
    pub fn with_config_ipc(inner: IpcStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(from_transport)?;
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(from_transport)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::FrameError;

    /// In-memory duplex: reads come from `incoming` one byte at a time,
    /// writes land in `outgoing` one byte at a time.
    struct TrickleStream {
        incoming: Vec<u8>,
        pos: usize,
        outgoing: Vec<u8>,
    }

    impl TrickleStream {
        fn new(incoming: Vec<u8>) -> Self {
            Self {
                incoming,
                pos: 0,
                outgoing: Vec::new(),
            }
        }
    }

    impl Read for TrickleStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.incoming.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.incoming[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for TrickleStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outgoing.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn frame_boundaries_survive_byte_chunking() {
        let mut writer = FramedChannel::new(TrickleStream::new(Vec::new()));
        writer.write_message(b"message A").unwrap();
        writer.write_message(b"B").unwrap();
        let wire = writer.into_inner().outgoing;

        let mut reader = FramedChannel::new(TrickleStream::new(wire));
        assert_eq!(reader.read_message().unwrap().as_ref(), b"message A");
        assert_eq!(reader.read_message().unwrap().as_ref(), b"B");
        assert!(matches!(
            reader.read_message().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn truncated_payload_is_not_short_data() {
        let mut wire = vec![0u8, 0, 0, 100];
        wire.extend_from_slice(&[1u8; 10]);
        let mut channel = FramedChannel::new(Cursor::new(wire));

        let err = channel.read_message().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 100,
                received: 10
            }
        ));
    }

    #[test]
    fn oversize_outbound_is_rejected() {
        let config = FrameConfig {
            max_payload_size: 2,
            ..FrameConfig::default()
        };
        let mut channel = FramedChannel::with_config(Cursor::new(Vec::new()), config);
        assert!(matches!(
            channel.write_message(b"abc").unwrap_err(),
            FrameError::PayloadTooLarge { size: 3, max: 2 }
        ));
        assert_eq!(channel.config().max_payload_size, 2);
    }

    #[test]
    #[cfg(unix)]
    fn request_response_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut client =
            FramedChannel::with_config_ipc(IpcStream::from_unix(left), FrameConfig::default())
                .unwrap();

        let server = std::thread::spawn(move || {
            let mut server = FramedChannel::new(right);
            let request = server.read_message().unwrap();
            let mut reply = b"echo:".to_vec();
            reply.extend_from_slice(&request);
            server.write_message(&reply).unwrap();
        });

        client.write_message(b"ping").unwrap();
        assert_eq!(client.read_message().unwrap().as_ref(), b"echo:ping");
        server.join().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn write_timeout_fires_when_peer_stops_reading() {
        use std::io::ErrorKind;
        use std::time::{Duration, Instant};

        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let config = FrameConfig {
            write_timeout: Some(Duration::from_millis(50)),
            ..FrameConfig::default()
        };
        let mut channel = FramedChannel::with_config_ipc(IpcStream::from_unix(left), config).unwrap();

        // Far larger than the socket buffer, so the write has to block.
        let started = Instant::now();
        let err = channel.write_message(&vec![0u8; 8 * 1024 * 1024]).unwrap_err();

        assert!(
            matches!(&err, FrameError::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)),
            "{err:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    }

    #[test]
    #[cfg(unix)]
    fn read_timeout_fires_when_peer_is_silent() {
        use std::io::ErrorKind;
        use std::time::Duration;

        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let mut channel = FramedChannel::with_config_ipc(IpcStream::from_unix(left), config).unwrap();

        let err = channel.read_message().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
    }
}
