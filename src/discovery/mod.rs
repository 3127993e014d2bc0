//! Discovered media items and the interface that produces them.
//!
//! Walking directories and probing files is left to whatever implements
//! [`Discover`]. [`StaticCatalog`] serves a fixed list, such as one posted to
//! the dashboard.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("missing media metadata for {0}")]
    MissingMetadata(String),

    #[error("invalid item: {0}")]
    InvalidItem(String),
}

/// Stream properties of a video file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    /// Duration of the recording in whole seconds
    pub duration_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub name: String,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub info: Option<MediaInfo>,
}

impl MediaItem {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            modified_at,
            info: None,
        }
    }

    pub fn with_info(mut self, info: MediaInfo) -> Self {
        self.info = Some(info);
        self
    }
}

/// Produces the items of one batch, oldest modification time first.
#[async_trait]
pub trait Discover: Send + Sync {
    async fn discover(&self) -> Result<Vec<MediaItem>, DiscoveryError>;
}

/// A fixed set of items.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: Vec<MediaItem>,
    allow_missing_metadata: bool,
}

impl StaticCatalog {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            allow_missing_metadata: false,
        }
    }

    pub fn allow_missing_metadata(mut self, allow: bool) -> Self {
        self.allow_missing_metadata = allow;
        self
    }

    fn validate(&self, item: &MediaItem) -> Result<(), DiscoveryError> {
        if item.name.trim().is_empty() {
            return Err(DiscoveryError::InvalidItem(format!(
                "empty name for {}",
                item.path.display()
            )));
        }
        if item.info.is_none() && !self.allow_missing_metadata {
            return Err(DiscoveryError::MissingMetadata(item.name.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl Discover for StaticCatalog {
    async fn discover(&self) -> Result<Vec<MediaItem>, DiscoveryError> {
        for item in &self.items {
            self.validate(item)?;
        }
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.modified_at);
        Ok(items)
    }
}
