use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{config::Config, store::VideoStore, views::ViewCounter};

/// Placeholder thumbnail until thumbnails are generated.
pub const DEFAULT_THUMBNAIL: &str = "/static/images/default-thumbnail.jpg";
/// Placeholder duration until media is inspected.
pub const DEFAULT_DURATION: &str = "0:00";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub file_path: PathBuf,
    pub thumbnail: String,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub created_at: DateTime<Utc>,
    pub duration: String,
    pub author: String,
}

/// Client-controlled part of a video. The store fills in the rest.
#[derive(Clone, Debug)]
pub struct VideoDraft {
    pub title: String,
    pub description: String,
    pub author: String,
    pub file_path: PathBuf,
    pub thumbnail: String,
    pub duration: String,
}

impl VideoDraft {
    pub fn new(title: impl Into<String>, author: impl Into<String>, file_path: PathBuf) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            author: author.into(),
            file_path,
            thumbnail: DEFAULT_THUMBNAIL.to_string(),
            duration: DEFAULT_DURATION.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VideoStore>,
    pub views: ViewCounter,
    pub config: Config,
}

impl AppState {
    /// Builds the state and starts the view counter worker. Must run inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(VideoStore::with_capacity_limit(config.max_videos));
        let views = ViewCounter::spawn(store.clone());
        Self {
            store,
            views,
            config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
