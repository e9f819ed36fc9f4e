//! Typed request/response client for local IPC.
//!
//! This is the "just works" layer: dial a named endpoint (waiting for it to
//! come up), then exchange serde values one request at a time over the
//! length-prefixed framing.
//!
//! ```no_run
//! use localchan_client::{connect, Client};
//! use localchan_transport::ChannelName;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Greet { name: String }
//!
//! #[derive(Deserialize)]
//! struct Reply { message: String }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let name = ChannelName::new("svc")?;
//! let mut client: Client<Greet, Reply> = connect(&name)?;
//! let reply = client.send(&Greet { name: "bob".into() })?;
//! println!("{}", reply.message);
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod connector;
pub mod error;

#[cfg(feature = "async")]
pub mod async_client;

pub use client::Client;
#[cfg(feature = "bincode")]
pub use codec::BincodeCodec;
#[cfg(feature = "cbor")]
pub use codec::CborCodec;
#[cfg(feature = "msgpack")]
pub use codec::MessagePackCodec;
pub use codec::{CodecError, JsonCodec, PayloadCodec};
pub use config::ClientConfig;
pub use connector::{connect, connect_endpoint, connect_with_config};
pub use error::{ClientError, Result};

#[cfg(feature = "async")]
pub use async_client::{connect_async, AsyncClient};
