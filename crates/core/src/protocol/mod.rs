//! RTSP client-side wire format (RFC 2326).
//!
//! The gateway only ever speaks one exchange upstream:
//!
//! ```text
//! DESCRIBE rtsp://server/stream RTSP/1.0\r\n
//! CSeq: 1\r\n
//! User-Agent: channel-gateway/0.1.0\r\n
//! Accept: application/sdp\r\n
//! \r\n
//! ```
//!
//! answered by a `2xx` carrying the SDP body, a `302` with a `Location`
//! header, or a `403`.

pub mod request;
pub mod response;
pub mod url;

pub use request::DescribeRequest;
pub use response::RtspResponse;
pub use url::RtspUrl;
