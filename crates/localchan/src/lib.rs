//! Request/response client for local IPC endpoints.
//!
//! localchan dials a named endpoint (a Unix domain socket or a Windows named
//! pipe), waits for it to come up, and exchanges length-prefixed messages one
//! request at a time.
//!
//! # Crate Structure
//!
//! - [`transport`]: endpoint naming and the retrying dialer
//! - [`frame`]: 4-byte big-endian length-prefixed framing
//! - [`client`]: typed `Client<Req, Res>` with pluggable payload codecs

/// Re-export transport types.
pub mod transport {
    pub use localchan_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use localchan_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use localchan_client::*;
}

pub use localchan_client::{connect, connect_with_config, Client, ClientConfig, ClientError};
pub use localchan_transport::{ChannelName, Endpoint, RetryPolicy};
