//! Error types for the channel gateway.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur anywhere in the gateway.
///
/// Variants group by where they arise:
///
/// - **Directory**: [`Lookup`](Self::Lookup), [`MissingChannel`](Self::MissingChannel),
///   [`MalformedSource`](Self::MalformedSource), [`EmptyDirectory`](Self::EmptyDirectory),
///   [`Snapshot`](Self::Snapshot).
/// - **Network**: [`AddressParse`](Self::AddressParse), [`Connect`](Self::Connect),
///   [`Transport`](Self::Transport).
/// - **Upstream RTSP**: [`Parse`](Self::Parse), [`Protocol`](Self::Protocol),
///   [`Forbidden`](Self::Forbidden), [`RedirectLoop`](Self::RedirectLoop).
/// - **Multicast**: [`Join`](Self::Join).
///
/// [`http_status`](Self::http_status) gives the status code the HTTP front
/// end answers with.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No channel with the given key exists in the directory.
    #[error("unknown channel: {0}")]
    Lookup(String),

    /// The request did not carry a channel identifier.
    #[error("missing channel identifier")]
    MissingChannel,

    /// A channel record's URL field does not have the shape the active mode needs.
    #[error("malformed source for channel {channel:?}: {locator:?} ({reason})")]
    MalformedSource {
        channel: String,
        locator: String,
        reason: &'static str,
    },

    /// The channel source produced no records.
    #[error("channel directory is empty")]
    EmptyDirectory,

    /// The channel snapshot could not be read or decoded.
    #[error("failed to load channel snapshot {}: {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },

    /// A multicast or unicast address is not a valid `ipv4:port` / `ip:port`.
    #[error("invalid address: {0}")]
    AddressParse(String),

    /// Could not open the TCP connection to the upstream RTSP server.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket read/write failure after the connection was established.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The upstream response is not a well-formed RTSP response.
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// The upstream answered with something the exchange cannot use.
    #[error("RTSP protocol error: {0}")]
    Protocol(String),

    /// The upstream answered `403 Forbidden`.
    #[error("remote server response: 403 Forbidden")]
    Forbidden,

    /// The redirect chain did not converge within the configured bound.
    #[error("redirect chain exceeded {hops} hops")]
    RedirectLoop { hops: u32 },

    /// Interface resolution or multicast group membership failed.
    #[error("failed to join multicast group {group} on {interface}: {reason}")]
    Join {
        group: String,
        interface: String,
        reason: String,
    },
}

impl GatewayError {
    /// HTTP status for this error: 400 when the client can correct the
    /// request, 500 when the environment or upstream is at fault.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Lookup(_) | Self::MissingChannel | Self::AddressParse(_) => 400,
            _ => 500,
        }
    }
}

/// Specific kind of RTSP response parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Nothing was received before the connection closed.
    EmptyResponse,
    /// Status line did not have the expected `RTSP/x.y Code Reason` format.
    InvalidStatusLine,
    /// A header line did not contain a colon separator.
    InvalidHeader,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "empty response"),
            Self::InvalidStatusLine => write!(f, "invalid status line"),
            Self::InvalidHeader => write!(f, "invalid header"),
        }
    }
}

/// Convenience alias for `Result<T, GatewayError>`.
pub type Result<T> = std::result::Result<T, GatewayError>;
