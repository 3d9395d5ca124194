//! Channel directory: normalized channel name → [`SourceLocator`].
//!
//! Built once from a [`ChannelSource`] at startup and never mutated
//! afterwards, so request handlers share it through an `Arc` without
//! locking.

pub mod locator;
pub mod source;

use std::collections::HashMap;

use crate::config::Mode;
use crate::error::{GatewayError, Result};

pub use locator::{MulticastPair, SourceLocator};
pub use source::{ChannelRecord, ChannelSource, JsonSnapshot};

/// Normalize a channel name into its lookup key by removing all whitespace.
///
/// `"CCTV 1"` and `"CCTV1"` map to the same key.
pub fn channel_key(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Immutable mapping from channel key to source locator.
#[derive(Debug, Clone)]
pub struct ChannelDirectory {
    mode: Mode,
    channels: HashMap<String, SourceLocator>,
}

impl ChannelDirectory {
    /// Build the directory from `records` in order.
    ///
    /// A record whose URL does not fit `mode` fails the whole load. Names
    /// that normalize to the same key collide; the later record wins.
    pub fn load(records: impl IntoIterator<Item = ChannelRecord>, mode: Mode) -> Result<Self> {
        let mut channels = HashMap::new();

        for record in records {
            let key = channel_key(&record.name);
            let locator = SourceLocator::parse(&record.name, &record.url, mode)?;
            if let Some(previous) = channels.insert(key.clone(), locator) {
                tracing::warn!(channel = %key, ?previous, "duplicate channel key, keeping later record");
            }
        }

        if channels.is_empty() {
            return Err(GatewayError::EmptyDirectory);
        }

        tracing::info!(channels = channels.len(), ?mode, "channel directory loaded");

        Ok(Self { mode, channels })
    }

    /// Pull records from `source` and [`load`](Self::load) them.
    pub fn from_source(source: &dyn ChannelSource, mode: Mode) -> Result<Self> {
        Self::load(source.records()?, mode)
    }

    /// Look up a channel by name; the name is normalized first.
    pub fn lookup(&self, name: &str) -> Option<&SourceLocator> {
        self.channels.get(&channel_key(name))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// All channel keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
