use crate::error::{GatewayError, ParseErrorKind};

/// A parsed RTSP response (RFC 2326 §7).
///
/// ```text
/// RTSP-Version SP Status-Code SP Reason-Phrase CRLF
/// *(Header: Value CRLF)
/// CRLF
/// [body]
/// ```
///
/// Header lookup is case-insensitive per RFC 2326 §4.2. The body is
/// whatever followed the blank line in the buffered bytes; it may be
/// truncated if the upstream sent more than the read buffer holds.
#[derive(Debug)]
pub struct RtspResponse {
    pub version: String,
    pub status_code: u16,
    pub reason: String,
    /// Headers as ordered (name, value) pairs, names stored as received.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RtspResponse {
    /// Parse a response from raw buffered bytes.
    pub fn parse(raw: &[u8]) -> crate::error::Result<Self> {
        if raw.is_empty() {
            return Err(GatewayError::Parse {
                kind: ParseErrorKind::EmptyResponse,
            });
        }

        let (head, body) = match find_header_end(raw) {
            Some(end) => (&raw[..end], &raw[end..]),
            None => (raw, &[][..]),
        };
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines();

        let status_line = lines.next().ok_or(GatewayError::Parse {
            kind: ParseErrorKind::EmptyResponse,
        })?;
        let (version, status_code, reason) =
            parse_status_line(status_line).ok_or(GatewayError::Parse {
                kind: ParseErrorKind::InvalidStatusLine,
            })?;

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let colon_pos = line.find(':').ok_or(GatewayError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?;
            let name = line[..colon_pos].trim().to_string();
            let value = line[colon_pos + 1..].trim().to_string();
            headers.push((name, value));
        }

        Ok(RtspResponse {
            version,
            status_code,
            reason,
            headers,
            body: body.to_vec(),
        })
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Redirect target of a `3xx` response (RFC 2326 §12.25).
    pub fn location(&self) -> Option<&str> {
        self.get_header("Location").filter(|v| !v.is_empty())
    }

    /// `Content-Length` declared by the upstream, if any.
    pub fn content_length(&self) -> Option<usize> {
        self.get_header("Content-Length")?.parse().ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

fn parse_status_line(line: &str) -> Option<(String, u16, String)> {
    let mut parts = line.trim_end().splitn(3, ' ');
    let version = parts.next()?;
    if !version.starts_with("RTSP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    let code = code.parse::<u16>().ok()?;
    let reason = parts.next().unwrap_or("").to_string();
    Some((version.to_string(), code, reason))
}

/// Offset just past the `\r\n\r\n` (or bare `\n\n`) ending the header block.
pub(crate) fn find_header_end(raw: &[u8]) -> Option<usize> {
    let crlf = raw.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4);
    let lf = raw.windows(2).position(|w| w == b"\n\n").map(|p| p + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
