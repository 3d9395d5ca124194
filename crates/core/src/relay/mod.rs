//! Multicast relay engine.
//!
//! A [`RelaySession`] owns one multicast receive socket and up to two
//! sinks: the client stream and, optionally, a [`UnicastSink`] repeating
//! the same datagrams. A single read loop fans every datagram out to both
//! sinks before reading the next one, so both observe the same sequence.
//!
//! ```text
//! multicast group ──recv──► read loop ──write──► client (AsyncWrite)
//!                                     └──send───► unicast repeat (optional)
//! ```
//!
//! The session ends when the client goes away (a failed write or the close
//! token firing), the multicast read fails, or the optional idle window
//! passes without a datagram.
//! Unicast send failures are counted and logged but never end the session.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::directory::MulticastPair;
use crate::error::{GatewayError, Result};
use crate::transport::multicast::{self, NetworkInterface};
use crate::transport::UnicastSink;

/// Relay settings shared by all sessions.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub interface: NetworkInterface,
    pub idle_timeout: Option<Duration>,
    pub unicast_repeat: bool,
    pub datagram_size: usize,
}

impl RelayOptions {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            interface: config.interface.clone(),
            idle_timeout: config.idle_timeout,
            unicast_repeat: config.unicast_repeat,
            datagram_size: config.datagram_size,
        }
    }
}

/// Why a relay session stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The client went away: a write failed or the close token fired.
    ClientClosed,
    /// No datagram arrived within the idle window.
    Idle,
}

/// Totals for a finished relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySummary {
    /// Bytes written to the client.
    pub bytes: u64,
    /// Datagrams written to the client.
    pub datagrams: u64,
    /// Failed sends on the unicast repeat sink.
    pub unicast_errors: u64,
    pub end: EndReason,
}

/// One live binding of a multicast source to its sinks.
pub struct RelaySession {
    source: SocketAddr,
    socket: UdpSocket,
    unicast: Option<UnicastSink>,
    idle_timeout: Option<Duration>,
    datagram_size: usize,
}

impl RelaySession {
    /// Parse the pair's addresses, join the group, and open the unicast
    /// repeat sink.
    ///
    /// Address errors surface as [`GatewayError::AddressParse`] and group
    /// membership errors as [`GatewayError::Join`]. A unicast sink that
    /// cannot be opened is logged and skipped.
    pub async fn open(pair: &MulticastPair, options: &RelayOptions) -> Result<Self> {
        let group = pair.group_addr()?;
        let unicast_addr = if options.unicast_repeat {
            pair.unicast_addr()?
        } else {
            None
        };

        let socket = multicast::join_group(group, &options.interface)?;

        let unicast = match unicast_addr {
            Some(dest) => match UnicastSink::connect(dest).await {
                Ok(sink) => Some(sink),
                Err(e) => {
                    tracing::warn!(%dest, error = %e, "unicast repeat sink unavailable, relaying to client only");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            source: SocketAddr::V4(group),
            socket,
            unicast,
            idle_timeout: options.idle_timeout,
            datagram_size: options.datagram_size,
        })
    }

    pub fn source(&self) -> SocketAddr {
        self.source
    }

    pub fn unicast_dest(&self) -> Option<SocketAddr> {
        self.unicast.as_ref().map(UnicastSink::dest)
    }

    /// Run the read loop until the session ends, consuming the session and
    /// releasing its sockets on return.
    ///
    /// `closed` is cancelled when the reading side of the client stream is
    /// dropped, which ends the session even while the group is silent.
    pub async fn run<W>(self, mut client: W, closed: CancellationToken) -> Result<RelaySummary>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; self.datagram_size];
        let mut bytes = 0u64;
        let mut datagrams = 0u64;
        let mut unicast_errors = 0u64;

        tracing::info!(
            source = %self.source,
            unicast = ?self.unicast_dest(),
            "relay session started"
        );

        let end = loop {
            let received = tokio::select! {
                biased;
                () = closed.cancelled() => {
                    tracing::debug!(source = %self.source, "client stream dropped");
                    break EndReason::ClientClosed;
                }
                received = self.recv(&mut buf) => match received {
                    Some(received) => received,
                    None => break EndReason::Idle,
                },
            };
            let n = received.map_err(|e| {
                tracing::warn!(source = %self.source, error = %e, bytes, "multicast read failed");
                GatewayError::Transport(e)
            })?;
            let payload = &buf[..n];

            if let Err(e) = write_datagram(&mut client, payload).await {
                tracing::debug!(source = %self.source, error = %e, "client sink closed");
                break EndReason::ClientClosed;
            }
            bytes += n as u64;
            datagrams += 1;

            if let Some(sink) = &self.unicast {
                if let Err(e) = sink.send(payload).await {
                    unicast_errors += 1;
                    if unicast_errors == 1 {
                        tracing::warn!(dest = %sink.dest(), error = %e, "unicast repeat failed, continuing");
                    } else {
                        tracing::debug!(dest = %sink.dest(), error = %e, failures = unicast_errors, "unicast repeat failed");
                    }
                }
            }
        };

        tracing::info!(
            source = %self.source,
            bytes,
            datagrams,
            unicast_errors,
            reason = ?end,
            "relay session ended"
        );

        Ok(RelaySummary {
            bytes,
            datagrams,
            unicast_errors,
            end,
        })
    }

    /// `None` when the idle window passes first.
    async fn recv(&self, buf: &mut [u8]) -> Option<std::io::Result<usize>> {
        match self.idle_timeout {
            Some(idle) => timeout(idle, self.socket.recv(buf)).await.ok(),
            None => Some(self.socket.recv(buf).await),
        }
    }
}

async fn write_datagram<W: AsyncWrite + Unpin>(client: &mut W, payload: &[u8]) -> std::io::Result<()> {
    client.write_all(payload).await?;
    client.flush().await
}

/// Open a session for `pair` and run it against `client` until it ends or
/// `closed` is cancelled.
pub async fn relay<W>(
    pair: &MulticastPair,
    options: &RelayOptions,
    client: W,
    closed: CancellationToken,
) -> Result<RelaySummary>
where
    W: AsyncWrite + Unpin,
{
    RelaySession::open(pair, options).await?.run(client, closed).await
}
