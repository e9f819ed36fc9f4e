use std::io::{ErrorKind, Read, Write};
use std::marker::PhantomData;

use localchan_frame::{FrameConfig, FrameError, FramedChannel};
use localchan_transport::{Endpoint, IpcStream, Shutdown};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{JsonCodec, PayloadCodec};
use crate::error::{ClientError, Result};

/// A request/response client over one framed connection.
///
/// `Req` and `Res` are the payload types; `C` turns them into frame payloads.
/// Exactly one response may be outstanding at a time: [`send`](Self::send)
/// is a full round trip, and [`write`](Self::write) refuses to run while a
/// response is still unread.
///
/// After a stream error the connection is dropped and every later call
/// returns [`ClientError::Closed`]. Codec errors and oversize outbound
/// requests leave the connection usable.
pub struct Client<Req, Res, C = JsonCodec, S = IpcStream> {
    channel: Option<FramedChannel<S>>,
    endpoint: Option<Endpoint>,
    codec: C,
    awaiting_response: bool,
    _payloads: PhantomData<fn(&Req) -> Res>,
}

impl<Req, Res, C, S> Client<Req, Res, C, S>
where
    Req: Serialize,
    Res: DeserializeOwned,
    C: PayloadCodec,
    S: Read + Write + Shutdown,
{
    /// Wrap an already-open stream.
    pub fn from_stream(stream: S, codec: C, frame: FrameConfig) -> Self {
        Self::from_channel(FramedChannel::with_config(stream, frame), codec)
    }

    pub(crate) fn from_channel(channel: FramedChannel<S>, codec: C) -> Self {
        Self {
            channel: Some(channel),
            endpoint: None,
            codec,
            awaiting_response: false,
            _payloads: PhantomData,
        }
    }

    pub(crate) fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Write `request`, then read and return the response.
    ///
    /// If the write fails no read is attempted.
    pub fn send(&mut self, request: &Req) -> Result<Res> {
        self.write(request)?;
        self.read()
    }

    /// Encode and write one request frame, flushing it to the stream.
    pub fn write(&mut self, request: &Req) -> Result<()> {
        if self.channel.is_none() {
            return Err(ClientError::Closed);
        }
        if self.awaiting_response {
            return Err(ClientError::ResponsePending);
        }

        let payload = self.codec.encode(request)?;
        let channel = self.channel.as_mut().ok_or(ClientError::Closed)?;
        match channel.write_message(&payload) {
            Ok(()) => {
                self.awaiting_response = true;
                Ok(())
            }
            // Rejected before anything reached the stream.
            Err(err @ (FrameError::PayloadTooLarge { .. } | FrameError::LengthOverflow(_))) => {
                Err(err.into())
            }
            Err(err) => Err(self.drop_connection(err.into())),
        }
    }

    /// Read one response frame and decode it.
    pub fn read(&mut self) -> Result<Res> {
        let channel = self.channel.as_mut().ok_or(ClientError::Closed)?;
        let payload = match channel.read_message() {
            Ok(payload) => payload,
            Err(err) => return Err(self.drop_connection(err.into())),
        };
        self.awaiting_response = false;
        Ok(self.codec.decode(&payload)?)
    }

    /// Shut down and release the connection. Later calls return
    /// [`ClientError::Closed`].
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            match channel.get_ref().shutdown() {
                Ok(()) => {}
                // Peer already hung up.
                Err(err) if err.kind() == ErrorKind::NotConnected => {}
                Err(err) => debug!(error = %err, "shutdown failed"),
            }
            debug!(endpoint = ?self.endpoint, codec = self.codec.name(), "client closed");
        }
        self.awaiting_response = false;
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    /// The endpoint this client dialed, if it was created by `connect`.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Borrow the underlying stream while the connection is open.
    pub fn get_ref(&self) -> Option<&S> {
        self.channel.as_ref().map(FramedChannel::get_ref)
    }

    fn drop_connection(&mut self, err: ClientError) -> ClientError {
        warn!(endpoint = ?self.endpoint, error = %err, "dropping connection");
        self.channel = None;
        self.awaiting_response = false;
        err
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::{self, Cursor, ErrorKind};
    use std::rc::Rc;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize)]
    struct Greet {
        name: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Reply {
        message: String,
    }

    #[derive(Default)]
    struct Wire {
        incoming: Cursor<Vec<u8>>,
        written: Vec<u8>,
        reads: usize,
        shutdowns: usize,
        fail_writes: bool,
        hung_up: bool,
    }

    /// Shared-state mock so tests can inspect the wire after the client
    /// drops the stream.
    #[derive(Clone, Default)]
    struct MockStream(Rc<RefCell<Wire>>);

    impl MockStream {
        fn with_incoming(frames: &[&str]) -> Self {
            let mut bytes = Vec::new();
            for payload in frames {
                bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                bytes.extend_from_slice(payload.as_bytes());
            }
            let stream = Self::default();
            stream.0.borrow_mut().incoming = Cursor::new(bytes);
            stream
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut wire = self.0.borrow_mut();
            wire.reads += 1;
            wire.incoming.read(buf)
        }
    }

    impl Shutdown for MockStream {
        fn shutdown(&self) -> io::Result<()> {
            let mut wire = self.0.borrow_mut();
            wire.shutdowns += 1;
            if wire.hung_up {
                return Err(io::Error::from(ErrorKind::NotConnected));
            }
            Ok(())
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut wire = self.0.borrow_mut();
            if wire.fail_writes {
                return Err(io::Error::from(ErrorKind::BrokenPipe));
            }
            wire.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn client(stream: MockStream) -> Client<Greet, Reply, JsonCodec, MockStream> {
        Client::from_stream(stream, JsonCodec, FrameConfig::default())
    }

    fn bob() -> Greet {
        Greet {
            name: "bob".into(),
        }
    }

    #[test]
    fn send_is_one_frame_out_and_one_frame_in() {
        let stream = MockStream::with_incoming(&[r#"{"message":"hello bob"}"#]);
        let mut client = client(stream.clone());

        let reply = client.send(&bob()).unwrap();
        assert_eq!(
            reply,
            Reply {
                message: "hello bob".into()
            }
        );

        let wire = stream.0.borrow();
        let mut expected = vec![0x00, 0x00, 0x00, 0x0e];
        expected.extend_from_slice(br#"{"name":"bob"}"#);
        assert_eq!(wire.written, expected);
        assert_eq!(
            wire.incoming.position() as usize,
            wire.incoming.get_ref().len()
        );
    }

    #[test]
    fn closed_client_refuses_everything() {
        let stream = MockStream::with_incoming(&[r#"{"message":"x"}"#]);
        let mut client = client(stream.clone());
        client.close();
        client.close();

        assert!(client.is_closed());
        assert!(matches!(client.send(&bob()), Err(ClientError::Closed)));
        assert!(matches!(client.write(&bob()), Err(ClientError::Closed)));
        assert!(matches!(client.read(), Err(ClientError::Closed)));
        assert_eq!(stream.0.borrow().reads, 0);
        assert!(stream.0.borrow().written.is_empty());
        assert_eq!(stream.0.borrow().shutdowns, 1);
    }

    #[test]
    fn close_tolerates_peer_that_already_left() {
        let stream = MockStream::default();
        stream.0.borrow_mut().hung_up = true;
        let mut client = client(stream.clone());

        client.close();
        assert!(client.is_closed());
        assert_eq!(stream.0.borrow().shutdowns, 1);
    }

    #[test]
    fn dropped_connection_is_not_shut_down_again() {
        let stream = MockStream::default();
        let mut client = client(stream.clone());

        assert!(matches!(client.send(&bob()), Err(ClientError::Disconnected)));
        client.close();
        assert_eq!(stream.0.borrow().shutdowns, 0);
    }

    #[test]
    fn failed_write_skips_read_and_closes() {
        let stream = MockStream::with_incoming(&[r#"{"message":"x"}"#]);
        stream.0.borrow_mut().fail_writes = true;
        let mut client = client(stream.clone());

        let err = client.send(&bob()).unwrap_err();
        assert!(matches!(err, ClientError::Transport(ref e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(stream.0.borrow().reads, 0);
        assert!(client.is_closed());
        assert!(matches!(client.send(&bob()), Err(ClientError::Closed)));
    }

    #[test]
    fn undecodable_response_keeps_connection() {
        let stream =
            MockStream::with_incoming(&["not json", r#"{"message":"second"}"#]);
        let mut client = client(stream);

        let err = client.send(&bob()).unwrap_err();
        assert!(matches!(err, ClientError::Codec(_)));
        assert!(!client.is_closed());

        let reply = client.send(&bob()).unwrap();
        assert_eq!(reply.message, "second");
    }

    #[test]
    fn second_write_before_read_is_pending() {
        let stream = MockStream::with_incoming(&[r#"{"message":"one"}"#]);
        let mut client = client(stream.clone());

        client.write(&bob()).unwrap();
        let before = stream.0.borrow().written.len();
        assert!(matches!(
            client.write(&bob()),
            Err(ClientError::ResponsePending)
        ));
        assert_eq!(stream.0.borrow().written.len(), before);

        assert_eq!(client.read().unwrap().message, "one");
        assert!(client.get_ref().is_some());
    }

    #[test]
    fn truncated_response_closes_client() {
        let stream = MockStream::default();
        let mut bytes = vec![0u8, 0, 0, 100];
        bytes.extend_from_slice(&[b'x'; 10]);
        stream.0.borrow_mut().incoming = Cursor::new(bytes);
        let mut client = client(stream);

        assert!(matches!(
            client.send(&bob()),
            Err(ClientError::TruncatedFrame {
                expected: 100,
                received: 10
            })
        ));
        assert!(matches!(client.read(), Err(ClientError::Closed)));
    }

    #[test]
    fn peer_hangup_between_frames_is_disconnected() {
        let mut client = client(MockStream::default());
        assert!(matches!(
            client.send(&bob()),
            Err(ClientError::Disconnected)
        ));
        assert!(client.is_closed());
    }

    #[test]
    fn oversize_request_is_rejected_without_closing() {
        let stream = MockStream::with_incoming(&[r#"{"message":"ok"}"#]);
        let frame = FrameConfig {
            max_payload_size: 8,
            ..FrameConfig::default()
        };
        let mut client: Client<Greet, Reply, JsonCodec, MockStream> =
            Client::from_stream(stream.clone(), JsonCodec, frame);

        let long = Greet {
            name: "a name that is far too long".into(),
        };
        assert!(matches!(
            client.send(&long),
            Err(ClientError::FrameTooLarge { max: 8, .. })
        ));
        assert!(!client.is_closed());
        assert!(stream.0.borrow().written.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn blocked_peer_trips_write_timeout_and_drops_connection() {
        use std::time::{Duration, Instant};

        #[derive(Serialize)]
        struct Blob(Vec<u8>);

        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let stream = IpcStream::from_unix(left);
        stream
            .set_write_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let mut client: Client<Blob, Reply, JsonCodec, IpcStream> =
            Client::from_stream(stream, JsonCodec, FrameConfig::default());

        let started = Instant::now();
        let err = client.write(&Blob(vec![7; 2 * 1024 * 1024])).unwrap_err();

        assert!(
            matches!(&err, ClientError::Transport(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)),
            "{err:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(client.is_closed());
    }
}
