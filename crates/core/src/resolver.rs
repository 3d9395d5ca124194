//! RTSP description resolver.
//!
//! Runs one DESCRIBE exchange per hop, following `302` redirects up to a
//! fixed bound:
//!
//! ```text
//! Connecting ──► Requesting ──► AwaitingResponse ──► Classifying
//!     ▲                                                   │
//!     └──────────────── 302 + Location ───────────────────┤
//!                                                         ├─ 2xx ──► SDP
//!                                                         ├─ 403 ──► Forbidden
//!                                                         └─ other ► Protocol
//! ```
//!
//! Each hop's connection is closed before the next one is opened.

use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::protocol::{DescribeRequest, RtspResponse, RtspUrl};
use crate::transport::RtspConnection;

/// SDP payload returned by a successful DESCRIBE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    /// URL that finally answered, after any redirects.
    pub source: RtspUrl,
    pub sdp: Vec<u8>,
    /// Number of `302` hops followed.
    pub redirects: u32,
}

/// Resolves RTSP URLs to session descriptions.
#[derive(Debug, Clone)]
pub struct Resolver {
    max_redirects: u32,
    connect_timeout: Duration,
    read_timeout: Duration,
    buffer_size: usize,
    user_agent: String,
}

impl Resolver {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            max_redirects: config.max_redirects.max(1),
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            buffer_size: config.response_buffer,
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Run the DESCRIBE exchange for `url`.
    pub async fn describe(&self, url: &RtspUrl) -> Result<SessionDescription> {
        let mut target = url.clone();
        let mut redirects = 0u32;

        loop {
            let response = self.exchange(&target).await?;

            tracing::debug!(
                upstream = %target,
                status = response.status_code,
                reason = %response.reason,
                "DESCRIBE response"
            );

            match response.status_code {
                302 => {
                    let location = response
                        .location()
                        .ok_or_else(|| GatewayError::Protocol("missing redirect target".into()))?;
                    if redirects >= self.max_redirects {
                        tracing::warn!(upstream = %url, hops = redirects, "redirect chain did not converge");
                        return Err(GatewayError::RedirectLoop { hops: redirects });
                    }
                    let next = RtspUrl::parse(location).ok_or_else(|| {
                        GatewayError::Protocol(format!("invalid redirect target: {}", location))
                    })?;
                    redirects += 1;
                    tracing::info!(from = %target, to = %next, hop = redirects, "RTSP redirect");
                    target = next;
                }
                403 => return Err(GatewayError::Forbidden),
                code if response.is_success() => {
                    tracing::debug!(upstream = %target, status = code, bytes = response.body.len(), "session description received");
                    return Ok(SessionDescription {
                        source: target,
                        sdp: response.body,
                        redirects,
                    });
                }
                code => {
                    return Err(GatewayError::Protocol(format!(
                        "unexpected status {} {}",
                        code, response.reason
                    )));
                }
            }
        }
    }

    /// One hop: connect, send DESCRIBE, read and parse the reply. The
    /// connection is dropped on return.
    async fn exchange(&self, target: &RtspUrl) -> Result<RtspResponse> {
        let mut conn = RtspConnection::connect(target, self.connect_timeout).await?;
        conn.send(&DescribeRequest::new(target, 1, &self.user_agent))
            .await?;
        let raw = conn.read_response(self.buffer_size, self.read_timeout).await?;
        drop(conn);
        RtspResponse::parse(&raw)
    }
}
