//! Channel gateway: resolves channel names to live-media sources and
//! bridges HTTP clients to them, either by returning the RTSP session
//! description or by relaying a multicast stream.

pub mod config;
pub mod directory;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod resolver;
pub mod server;
pub mod transport;

pub use config::{GatewayConfig, Mode};
pub use directory::{ChannelDirectory, ChannelRecord, ChannelSource, JsonSnapshot, SourceLocator};
pub use error::{GatewayError, Result};
pub use relay::{RelayOptions, RelaySession, RelaySummary};
pub use resolver::{Resolver, SessionDescription};
pub use server::AppState;
pub use transport::NetworkInterface;
