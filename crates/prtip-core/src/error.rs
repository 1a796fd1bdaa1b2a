//! Crate-wide error type

use std::io;
use std::net::AddrParseError;
use thiserror::Error;

/// Result type alias for scanner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type. Fatal variants (`FdExhaustion`, `PollerFailure`) are meant to abort the
/// scan; `Config` is a user error reported with exit code 0; the rest are propagated internally
/// and usually converted to a warning by the caller (see `errors::ScanErrorKind`).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors with automatic conversion
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Parsing errors for IP addresses, CIDR, ports
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed target, invalid port spec, unsupported CIDR width, conflicting target sources
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket creation failed because the process is out of file descriptors
    #[error("too many open files: {0} (try lowering --max-sockets or raising the open-file limit)")]
    FdExhaustion(String),

    /// The readiness poller backend failed irrecoverably
    #[error("poller failure: {0}")]
    PollerFailure(String),
}

impl From<AddrParseError> for Error {
    fn from(err: AddrParseError) -> Self {
        Error::Parse(format!("invalid IP address: {err}"))
    }
}

impl From<ipnetwork::IpNetworkError> for Error {
    fn from(err: ipnetwork::IpNetworkError) -> Self {
        Error::Parse(format!("invalid IP network: {err}"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("TOML parse error: {err}"))
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(format!("TOML serialization error: {err}"))
    }
}
