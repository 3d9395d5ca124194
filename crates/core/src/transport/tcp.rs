use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{GatewayError, Result};
use crate::protocol::response::find_header_end;
use crate::protocol::{DescribeRequest, RtspUrl};

/// A single RTSP control connection to one upstream server.
///
/// Opened for one request/response pair; the socket closes when the
/// value is dropped.
pub struct RtspConnection {
    stream: TcpStream,
    target: String,
}

impl RtspConnection {
    /// Open a TCP connection to the URL's host and port (554 by default).
    pub async fn connect(url: &RtspUrl, connect_timeout: Duration) -> Result<Self> {
        let target = url.authority();
        let connect_error = |source: std::io::Error| GatewayError::Connect {
            target: target.clone(),
            source,
        };

        let stream = match timeout(connect_timeout, TcpStream::connect(&target)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_error(e)),
            Err(_) => return Err(connect_error(std::io::ErrorKind::TimedOut.into())),
        };

        tracing::debug!(upstream = %target, "RTSP connection opened");
        Ok(Self { stream, target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub async fn send(&mut self, request: &DescribeRequest) -> Result<()> {
        let text = request.serialize();
        tracing::debug!(upstream = %self.target, "DESCRIBE");
        self.stream.write_all(text.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read one response into a buffer of at most `limit` bytes.
    ///
    /// Stops once the header block and any `Content-Length` body are in,
    /// on EOF, or when the buffer is full; excess bytes are left unread.
    pub async fn read_response(&mut self, limit: usize, read_timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; limit];
        let mut filled = 0;

        while filled < limit {
            let n = match timeout(read_timeout, self.stream.read(&mut buf[filled..])).await {
                Ok(result) => result?,
                Err(_) => return Err(std::io::Error::from(std::io::ErrorKind::TimedOut).into()),
            };
            if n == 0 {
                break;
            }
            filled += n;
            if response_complete(&buf[..filled]) {
                break;
            }
        }

        buf.truncate(filled);
        if filled == limit {
            tracing::debug!(upstream = %self.target, limit, "RTSP response truncated to buffer size");
        }
        Ok(buf)
    }
}

fn response_complete(buf: &[u8]) -> bool {
    let Some(header_end) = find_header_end(buf) else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..header_end]);
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    buf.len() - header_end >= content_length
}
