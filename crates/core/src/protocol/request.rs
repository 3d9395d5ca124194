use super::url::RtspUrl;

/// A DESCRIBE request (RFC 2326 §10.2).
///
/// Serializes to:
///
/// ```text
/// DESCRIBE rtsp://cam/stream RTSP/1.0\r\n
/// CSeq: 1\r\n
/// User-Agent: channel-gateway/0.1.0\r\n
/// Accept: application/sdp\r\n
/// \r\n
/// ```
///
/// Extra headers can be chained with [`add_header`](Self::add_header)
/// before calling [`serialize`](Self::serialize).
#[must_use]
pub struct DescribeRequest {
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

impl DescribeRequest {
    pub fn new(target: &RtspUrl, cseq: u32, user_agent: &str) -> Self {
        DescribeRequest {
            uri: target.request_uri(),
            headers: vec![
                ("CSeq".to_string(), cseq.to_string()),
                ("User-Agent".to_string(), user_agent.to_string()),
                ("Accept".to_string(), "application/sdp".to_string()),
            ],
        }
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Serialize to the RTSP text wire format.
    pub fn serialize(&self) -> String {
        let mut request = format!("DESCRIBE {} RTSP/1.0\r\n", self.uri);
        for (name, value) in &self.headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }
        request.push_str("\r\n");
        request
    }
}
