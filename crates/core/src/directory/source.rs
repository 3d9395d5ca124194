use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// One row of the channel snapshot.
///
/// Only `name` and `url` feed the directory; the remaining columns are
/// carried so a snapshot round-trips without loss.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ChannelRecord {
    #[serde(rename = "UserChannelID", default)]
    pub user_channel_id: String,
    #[serde(rename = "ChannelNo", default)]
    pub channel_no: String,
    #[serde(rename = "ChannelName")]
    pub name: String,
    #[serde(rename = "ChannelURL")]
    pub url: String,
    #[serde(rename = "PreviewURL", default)]
    pub preview_url: String,
    #[serde(rename = "ext", default)]
    pub ext: String,
}

impl ChannelRecord {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }
}

/// Anything that can hand over the full list of channel records.
///
/// How the records were produced (database export, query, fixture) is the
/// implementor's business; the directory only sees the finished list.
pub trait ChannelSource {
    fn records(&self) -> Result<Vec<ChannelRecord>>;
}

impl ChannelSource for Vec<ChannelRecord> {
    fn records(&self) -> Result<Vec<ChannelRecord>> {
        Ok(self.clone())
    }
}

/// A JSON array of [`ChannelRecord`]s on disk, as written by the export tool.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChannelSource for JsonSnapshot {
    fn records(&self) -> Result<Vec<ChannelRecord>> {
        let snapshot_error = |reason: String| GatewayError::Snapshot {
            path: self.path.clone(),
            reason,
        };
        let raw = std::fs::read(&self.path).map_err(|e| snapshot_error(e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| snapshot_error(e.to_string()))
    }
}
