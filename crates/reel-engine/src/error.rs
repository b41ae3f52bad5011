//! Engine error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

use reel_media::MediaError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No media found under {roots}")]
    NoMediaFound { roots: String },

    #[error("Insufficient materials: {available} available, {required} required")]
    InsufficientMaterials { available: usize, required: usize },

    /// Carries the reason a single file was skipped; never aborts a run.
    #[error("Unreadable media {}: {reason}", .path.display())]
    UnreadableMedia { path: PathBuf, reason: String },

    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn no_media_found(roots: &[PathBuf]) -> Self {
        let roots = roots
            .iter()
            .map(|r| r.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::NoMediaFound { roots }
    }

    pub fn insufficient(available: usize, required: usize) -> Self {
        Self::InsufficientMaterials {
            available,
            required,
        }
    }

    pub fn unreadable(path: &Path, reason: impl Into<String>) -> Self {
        Self::UnreadableMedia {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn render_failure(msg: impl Into<String>) -> Self {
        Self::RenderFailure(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map a backend error raised while rendering.
    ///
    /// Cancellation stays distinguishable; everything else is a render failure.
    pub fn from_render(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => Self::Cancelled,
            other => Self::render_failure(other.to_string()),
        }
    }

    /// Check if the error ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::UnreadableMedia { .. })
    }

    pub fn is_render_failure(&self) -> bool {
        matches!(self, EngineError::RenderFailure(_))
    }
}
