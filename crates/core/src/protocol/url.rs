use std::fmt;

/// Well-known RTSP port (RFC 2326 §3.2).
pub const DEFAULT_RTSP_PORT: u16 = 554;

/// A parsed `rtsp://[user[:pass]@]host[:port][/path]` URL.
///
/// ```
/// use gateway::protocol::RtspUrl;
///
/// let url = RtspUrl::parse("rtsp://10.0.0.1:554/live/ch1?auth=x").unwrap();
/// assert_eq!(url.host(), "10.0.0.1");
/// assert_eq!(url.port(), 554);
/// assert_eq!(url.request_uri(), "rtsp://10.0.0.1/live/ch1?auth=x");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspUrl {
    /// `user[:pass]`, sent on the request line but never logged.
    userinfo: Option<String>,
    host: String,
    port: Option<u16>,
    /// Path including any query string; always starts with `/`.
    path: String,
}

impl RtspUrl {
    /// Parse an RTSP URL. Returns `None` when the scheme is not `rtsp`,
    /// the host is empty, or the port is not a number.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let scheme_end = raw.find("://")?;
        if !raw[..scheme_end].eq_ignore_ascii_case("rtsp") {
            return None;
        }
        let rest = &raw[scheme_end + 3..];

        let (authority, path) = match rest.find(['/', '?']) {
            Some(idx) if rest.as_bytes()[idx] == b'/' => (&rest[..idx], rest[idx..].to_string()),
            Some(idx) => (&rest[..idx], format!("/{}", &rest[idx..])),
            None => (rest, "/".to_string()),
        };

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo.to_string()), host_port),
            None => (None, authority),
        };

        let (host, port) = match host_port.strip_prefix('[').and_then(|s| s.find(']')) {
            // [v6]:port
            Some(close) => {
                let host = &host_port[..close + 2];
                match &host_port[close + 2..] {
                    "" => (host, None),
                    tail => (host, Some(tail.strip_prefix(':')?.parse::<u16>().ok()?)),
                }
            }
            None => match host_port.rsplit_once(':') {
                Some((host, port)) => (host, Some(port.parse::<u16>().ok()?)),
                None => (host_port, None),
            },
        };

        if host.is_empty() {
            return None;
        }

        Some(Self {
            userinfo,
            host: host.to_string(),
            port,
            path,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port to connect to, [`DEFAULT_RTSP_PORT`] when the URL has none.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_RTSP_PORT)
    }

    /// `host:port` for opening the control connection.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port())
    }

    pub fn userinfo(&self) -> Option<&str> {
        self.userinfo.as_deref()
    }

    /// The URI placed on the DESCRIBE request line, userinfo included.
    ///
    /// An explicit `:554` is dropped; upstream servers compare the
    /// request URI against their canonical form without the default port.
    pub fn request_uri(&self) -> String {
        match &self.userinfo {
            Some(userinfo) => format!("rtsp://{}@{}", userinfo, self.host_and_path()),
            None => format!("rtsp://{}", self.host_and_path()),
        }
    }

    fn host_and_path(&self) -> String {
        match self.port {
            Some(port) if port != DEFAULT_RTSP_PORT => format!("{}:{}{}", self.host, port, self.path),
            _ => format!("{}{}", self.host, self.path),
        }
    }
}

/// Formats without userinfo.
impl fmt::Display for RtspUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rtsp://{}", self.host_and_path())
    }
}
