//! Endpoint naming and connection establishment for local IPC.
//!
//! Maps a symbolic [`ChannelName`] onto a platform endpoint:
//! - Unix domain sockets (Linux/macOS): `/tmp/<name>.sock`
//! - Named pipes (Windows): `\\.\pipe\<name>`
//!
//! and dials it with [`Dialer`], which keeps retrying while the endpoint does
//! not exist yet or refuses connections. This is the lowest layer of
//! localchan; everything else builds on the [`IpcStream`] it returns.

pub mod dialer;
pub mod error;
pub mod name;
pub mod traits;

#[cfg(unix)]
pub mod uds;

#[cfg(windows)]
pub mod pipe;

#[cfg(feature = "async")]
pub mod async_dial;

pub use dialer::{
    dial, is_retryable, Clock, Connector, DialCancel, Dialer, RetryPolicy, SystemClock,
    SystemConnector, DEFAULT_RETRY_INTERVAL,
};
pub use error::{Result, TransportError};
pub use name::{ChannelName, Endpoint, EndpointKind};
pub use traits::{IpcStream, Shutdown};

#[cfg(unix)]
pub use uds::UnixSocketConnector;

#[cfg(windows)]
pub use pipe::NamedPipeConnector;

#[cfg(feature = "async")]
pub use async_dial::{dial_async, AsyncIpcStream};
