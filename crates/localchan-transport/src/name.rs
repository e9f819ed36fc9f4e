use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, TransportError};

/// Directory holding Unix domain socket endpoints.
pub const UNIX_SOCKET_DIR: &str = "/tmp/";
/// Suffix appended to Unix domain socket endpoints.
pub const UNIX_SOCKET_SUFFIX: &str = ".sock";
/// Namespace prefix for Windows named pipes.
pub const PIPE_NAMESPACE: &str = r"\\.\pipe\";

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
const MAX_SOCKET_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_SOCKET_PATH_LEN: usize = 104;

/// Logical name of a local channel.
///
/// The name is opaque to the transport; it only has to be usable as a single
/// path component on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Validate and wrap a channel name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name must not be empty")
        } else if name.contains(['/', '\\']) {
            Some("name must not contain path separators")
        } else if name.contains('\0') {
            Some("name must not contain NUL bytes")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TransportError::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Derive a sub-channel name, `<name>_<qualifier>`.
    ///
    /// An empty qualifier returns the name unchanged.
    pub fn qualified(&self, qualifier: &str) -> Result<Self> {
        if qualifier.is_empty() {
            return Ok(self.clone());
        }
        Self::new(format!("{}_{qualifier}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ChannelName {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// The transport flavor behind an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    UnixSocket,
    NamedPipe,
}

impl EndpointKind {
    /// Transport name for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointKind::UnixSocket => "unix-domain-socket",
            EndpointKind::NamedPipe => "named-pipe",
        }
    }
}

/// A concrete local transport address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    address: PathBuf,
    kind: EndpointKind,
}

impl Endpoint {
    /// Resolve a channel name using the naming rule of the build target.
    #[cfg(unix)]
    pub fn resolve(name: &ChannelName) -> Result<Self> {
        Self::unix_socket(name)
    }

    /// Resolve a channel name using the naming rule of the build target.
    #[cfg(windows)]
    pub fn resolve(name: &ChannelName) -> Result<Self> {
        Ok(Self::named_pipe(name))
    }

    /// `/tmp/<name>.sock`, rejected if it does not fit in `sun_path`.
    pub fn unix_socket(name: &ChannelName) -> Result<Self> {
        let address = PathBuf::from(format!(
            "{UNIX_SOCKET_DIR}{}{UNIX_SOCKET_SUFFIX}",
            name.as_str()
        ));
        Self::from_socket_path(address)
    }

    /// `\\.\pipe\<name>`.
    pub fn named_pipe(name: &ChannelName) -> Self {
        Self {
            address: PathBuf::from(format!("{PIPE_NAMESPACE}{}", name.as_str())),
            kind: EndpointKind::NamedPipe,
        }
    }

    /// Use an explicit Unix socket path instead of a derived one.
    pub fn from_socket_path(path: impl Into<PathBuf>) -> Result<Self> {
        let address = path.into();
        // One byte is reserved for the terminating NUL.
        let len = address.as_os_str().len();
        if len >= MAX_SOCKET_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path: address,
                len,
                max: MAX_SOCKET_PATH_LEN,
            });
        }
        Ok(Self {
            address,
            kind: EndpointKind::UnixSocket,
        })
    }

    pub fn address(&self) -> &Path {
        &self.address
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address.display())
    }
}
