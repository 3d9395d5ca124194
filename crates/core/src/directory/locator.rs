use std::net::{SocketAddr, SocketAddrV4};

use crate::config::Mode;
use crate::error::{GatewayError, Result};
use crate::protocol::RtspUrl;

/// Separator between the multicast and unicast halves of a channel URL.
pub const PAIR_SEPARATOR: char = '|';

/// Where a channel's media comes from, interpreted for the active [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// An RTSP origin resolved with DESCRIBE.
    Rtsp(RtspUrl),
    /// A multicast group plus an optional unicast repeat destination.
    Multicast(MulticastPair),
}

impl SourceLocator {
    /// Interpret a channel URL field for `mode`.
    ///
    /// `Describe` accepts a bare `rtsp://` URL or a `x|rtsp://...` pair
    /// (the RTSP URL is the second half). `Relay` requires exactly one
    /// `|`; the address halves are validated when a relay starts.
    pub fn parse(channel: &str, raw: &str, mode: Mode) -> Result<Self> {
        let malformed = |reason| GatewayError::MalformedSource {
            channel: channel.to_string(),
            locator: raw.to_string(),
            reason,
        };

        let parts: Vec<&str> = raw.split(PAIR_SEPARATOR).collect();

        match mode {
            Mode::Describe => {
                let url = match parts.as_slice() {
                    [url] => *url,
                    [_, url] => *url,
                    _ => return Err(malformed("expected a URL or exactly two '|'-separated parts")),
                };
                RtspUrl::parse(url)
                    .map(SourceLocator::Rtsp)
                    .ok_or_else(|| malformed("not an rtsp:// URL"))
            }
            Mode::Relay => match parts.as_slice() {
                [group, unicast] if !group.trim().is_empty() => {
                    Ok(SourceLocator::Multicast(MulticastPair {
                        group: group.trim().to_string(),
                        unicast: Some(unicast.trim())
                            .filter(|u| !u.is_empty())
                            .map(str::to_string),
                    }))
                }
                _ => Err(malformed("expected exactly two '|'-separated addresses")),
            },
        }
    }

    pub fn as_rtsp(&self) -> Option<&RtspUrl> {
        match self {
            SourceLocator::Rtsp(url) => Some(url),
            SourceLocator::Multicast(_) => None,
        }
    }

    pub fn as_multicast(&self) -> Option<&MulticastPair> {
        match self {
            SourceLocator::Multicast(pair) => Some(pair),
            SourceLocator::Rtsp(_) => None,
        }
    }
}

/// The `multicast|unicast` address pair of a relay channel, kept as text
/// until a relay session parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastPair {
    pub group: String,
    pub unicast: Option<String>,
}

impl MulticastPair {
    /// The multicast group as `ipv4:port`.
    pub fn group_addr(&self) -> Result<SocketAddrV4> {
        let addr: SocketAddrV4 = self
            .group
            .parse()
            .map_err(|_| GatewayError::AddressParse(format!("{} is not ipv4:port", self.group)))?;
        if !addr.ip().is_multicast() {
            return Err(GatewayError::AddressParse(format!(
                "{} is not a multicast address",
                addr.ip()
            )));
        }
        Ok(addr)
    }

    /// The unicast repeat destination as `ip:port`, if the channel has one.
    pub fn unicast_addr(&self) -> Result<Option<SocketAddr>> {
        let Some(unicast) = &self.unicast else {
            return Ok(None);
        };
        unicast
            .parse::<SocketAddr>()
            .map(Some)
            .map_err(|_| GatewayError::AddressParse(format!("{} is not ip:port", unicast)))
    }
}
