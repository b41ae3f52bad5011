//! Discovered media items.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recognized still-image extensions (lowercase, without dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
/// Recognized video extensions (lowercase, without dot).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];

/// Shared handle to a catalog item; planners hold these instead of copies.
pub type MediaRef = Arc<MediaItem>;

/// Catalog-local identifier, assigned in scan order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct MediaId(pub u32);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// One image or video available to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MediaItem {
    pub id: MediaId,
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Probed duration in seconds; `None` for images and for videos that could not be probed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl MediaItem {
    pub fn image(id: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            id: MediaId(id),
            path: path.into(),
            kind: MediaKind::Image,
            duration: None,
        }
    }

    pub fn video(id: u32, path: impl Into<PathBuf>, duration: Option<f64>) -> Self {
        Self {
            id: MediaId(id),
            path: path.into(),
            kind: MediaKind::Video,
            duration,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}
