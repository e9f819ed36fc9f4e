//! Tokio flavor of [`Client`](crate::Client).
//!
//! Same contract as the blocking client: one request in flight, the
//! connection is dropped after a stream error, and codec errors leave it
//! usable. Stream timeouts from `FrameConfig` do not apply here; wrap calls
//! in `tokio::time::timeout` instead.

use std::marker::PhantomData;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use localchan_frame::{FrameCodec, FrameError};
use localchan_transport::{dial_async, AsyncIpcStream, ChannelName, Endpoint};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::{JsonCodec, PayloadCodec};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

pub struct AsyncClient<Req, Res, C = JsonCodec, S = AsyncIpcStream> {
    framed: Option<Framed<S, FrameCodec>>,
    endpoint: Option<Endpoint>,
    codec: C,
    awaiting_response: bool,
    _payloads: PhantomData<fn(&Req) -> Res>,
}

impl<Req, Res, C, S> AsyncClient<Req, Res, C, S>
where
    Req: Serialize,
    Res: DeserializeOwned,
    C: PayloadCodec,
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-open async stream.
    pub fn from_stream(stream: S, codec: C, max_payload_size: usize) -> Self {
        Self {
            framed: Some(Framed::new(
                stream,
                FrameCodec::with_max_payload(max_payload_size),
            )),
            endpoint: None,
            codec,
            awaiting_response: false,
            _payloads: PhantomData,
        }
    }

    pub async fn send(&mut self, request: &Req) -> Result<Res> {
        self.write(request).await?;
        self.read().await
    }

    pub async fn write(&mut self, request: &Req) -> Result<()> {
        if self.framed.is_none() {
            return Err(ClientError::Closed);
        }
        if self.awaiting_response {
            return Err(ClientError::ResponsePending);
        }

        let payload = Bytes::from(self.codec.encode(request)?);
        let framed = self.framed.as_mut().ok_or(ClientError::Closed)?;
        match framed.send(payload).await {
            Ok(()) => {
                self.awaiting_response = true;
                Ok(())
            }
            Err(err @ (FrameError::PayloadTooLarge { .. } | FrameError::LengthOverflow(_))) => {
                Err(err.into())
            }
            Err(err) => Err(self.drop_connection(err.into())),
        }
    }

    pub async fn read(&mut self) -> Result<Res> {
        let framed = self.framed.as_mut().ok_or(ClientError::Closed)?;
        let frame = match framed.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => return Err(self.drop_connection(err.into())),
            None => return Err(self.drop_connection(ClientError::Disconnected)),
        };
        self.awaiting_response = false;
        Ok(self.codec.decode(&frame.payload)?)
    }

    /// Flush and shut down the write half, then release the connection.
    pub async fn close(&mut self) {
        if let Some(mut framed) = self.framed.take() {
            if let Err(err) = SinkExt::<Bytes>::close(&mut framed).await {
                debug!(error = %err, "error while closing connection");
            }
            debug!(endpoint = ?self.endpoint, "client closed");
        }
        self.awaiting_response = false;
    }

    pub fn is_closed(&self) -> bool {
        self.framed.is_none()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    fn drop_connection(&mut self, err: ClientError) -> ClientError {
        warn!(endpoint = ?self.endpoint, error = %err, "dropping connection");
        self.framed = None;
        self.awaiting_response = false;
        err
    }
}

/// Dial `name` on the tokio runtime.
///
/// Cancelling `cancel` stops the dial between or during attempts and returns
/// `TransportError::Cancelled` wrapped in [`ClientError::Connect`].
pub async fn connect_async<Req, Res, C>(
    name: &ChannelName,
    codec: C,
    config: &ClientConfig,
    cancel: Option<&CancellationToken>,
) -> Result<AsyncClient<Req, Res, C>>
where
    Req: Serialize,
    Res: DeserializeOwned,
    C: PayloadCodec,
{
    let endpoint = Endpoint::resolve(name)?;
    let stream = dial_async(&endpoint, &config.retry, cancel).await?;
    debug!(%endpoint, codec = codec.name(), "async client connected");

    let mut client = AsyncClient::from_stream(stream, codec, config.frame.max_payload_size);
    client.endpoint = Some(endpoint);
    Ok(client)
}
