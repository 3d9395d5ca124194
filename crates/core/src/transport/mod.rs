//! Network transports used by the two engines.
//!
//! - **TCP** ([`tcp`]): one short-lived RTSP control connection per
//!   DESCRIBE hop.
//!
//! - **UDP** ([`udp`]): the unicast repeat sink of a relay session.
//!
//! - **Multicast** ([`multicast`]): interface resolution and IGMP group
//!   membership for the relay's receive socket.
//!
//! Every socket is owned by exactly one resolver exchange or relay
//! session and closed when it is dropped.

pub mod multicast;
pub mod tcp;
pub mod udp;

pub use multicast::NetworkInterface;
pub use tcp::RtspConnection;
pub use udp::UnicastSink;
