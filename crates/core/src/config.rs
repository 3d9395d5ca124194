use std::time::Duration;

use crate::transport::multicast::NetworkInterface;

/// Which engine serves channel requests.
///
/// Decided once at startup; it also fixes how channel URLs are
/// interpreted when the directory is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Resolve the channel's RTSP URL with DESCRIBE and return the SDP.
    #[default]
    Describe,
    /// Join the channel's multicast group and stream it to the client.
    Relay,
}

/// Gateway-level configuration used by the resolver, relay, and HTTP layer.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mode: Mode,
    /// Interface multicast groups are joined on.
    pub interface: NetworkInterface,
    /// Maximum number of `302` hops a DESCRIBE exchange follows.
    pub max_redirects: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Upper bound on a buffered RTSP response; larger responses are truncated.
    pub response_buffer: usize,
    /// `User-Agent` sent with DESCRIBE.
    pub user_agent: String,
    /// End a relay when no datagram arrives for this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Duplicate relayed datagrams onto the channel's unicast address.
    pub unicast_repeat: bool,
    /// Receive buffer size for a single multicast datagram.
    pub datagram_size: usize,
}

pub const DEFAULT_MAX_REDIRECTS: u32 = 5;
pub const DEFAULT_RESPONSE_BUFFER: usize = 4096;
pub const DEFAULT_DATAGRAM_SIZE: usize = 65536;
pub const USER_AGENT: &str = concat!("channel-gateway/", env!("CARGO_PKG_VERSION"));

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Describe,
            interface: NetworkInterface::Any,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            response_buffer: DEFAULT_RESPONSE_BUFFER,
            user_agent: USER_AGENT.to_string(),
            idle_timeout: None,
            unicast_repeat: true,
            datagram_size: DEFAULT_DATAGRAM_SIZE,
        }
    }
}
