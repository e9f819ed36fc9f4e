use localchan_frame::FramedChannel;
use localchan_transport::{ChannelName, DialCancel, Dialer, Endpoint};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::codec::{JsonCodec, PayloadCodec};
use crate::config::ClientConfig;
use crate::error::Result;

/// Dial `name` with default settings and a JSON codec.
///
/// Blocks until the endpoint accepts a connection or fails with a
/// non-retryable error; with the default policy a missing endpoint is retried
/// every 100 ms indefinitely.
pub fn connect<Req, Res>(name: &ChannelName) -> Result<Client<Req, Res>>
where
    Req: Serialize,
    Res: DeserializeOwned,
{
    connect_with_config(name, JsonCodec, &ClientConfig::default(), None)
}

/// Dial `name` with explicit codec, configuration and optional cancellation.
pub fn connect_with_config<Req, Res, C>(
    name: &ChannelName,
    codec: C,
    config: &ClientConfig,
    cancel: Option<DialCancel>,
) -> Result<Client<Req, Res, C>>
where
    Req: Serialize,
    Res: DeserializeOwned,
    C: PayloadCodec,
{
    let endpoint = Endpoint::resolve(name)?;
    connect_endpoint(&endpoint, codec, config, cancel)
}

/// Dial an already-resolved endpoint.
pub fn connect_endpoint<Req, Res, C>(
    endpoint: &Endpoint,
    codec: C,
    config: &ClientConfig,
    cancel: Option<DialCancel>,
) -> Result<Client<Req, Res, C>>
where
    Req: Serialize,
    Res: DeserializeOwned,
    C: PayloadCodec,
{
    let mut dialer = Dialer::new(config.retry.clone());
    if let Some(cancel) = cancel {
        dialer = dialer.with_cancel(cancel);
    }

    let stream = dialer.dial(endpoint)?;
    let channel = FramedChannel::with_config_ipc(stream, config.frame.clone())?;
    debug!(%endpoint, codec = codec.name(), "client connected");

    Ok(Client::from_channel(channel, codec).with_endpoint(endpoint.clone()))
}
