//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reel_engine::QualityScorer;
use reel_media::{MediaBackend, MediaError, MediaResult, RenderControl};
use reel_models::{EncodingConfig, MediaItem, MediaRef, ScoreResult, Timeline};

/// How a [`FakeBackend`] render ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    Succeed,
    /// Writes a partial file at the output path, then fails
    FailAfterPartialWrite,
}

/// What the fake saw of one render call.
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub output: PathBuf,
    pub segments: usize,
    pub total_duration: f64,
    pub timeout: Option<Duration>,
}

/// In-memory backend: durations come from a table keyed by file name.
pub struct FakeBackend {
    durations: HashMap<String, f64>,
    outcome: RenderOutcome,
    calls: Mutex<Vec<RenderCall>>,
}

impl FakeBackend {
    pub fn new(outcome: RenderOutcome) -> Self {
        Self {
            durations: HashMap::new(),
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_duration(mut self, file_name: &str, seconds: f64) -> Self {
        self.durations.insert(file_name.to_string(), seconds);
        self
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn probe(&self, path: &Path) -> MediaResult<f64> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.durations
            .get(&name)
            .copied()
            .ok_or_else(|| MediaError::InvalidMedia(format!("cannot probe {}", name)))
    }

    async fn render(
        &self,
        timeline: &Timeline,
        output: &Path,
        _encoding: &EncodingConfig,
        control: RenderControl,
    ) -> MediaResult<()> {
        self.calls.lock().unwrap().push(RenderCall {
            output: output.to_path_buf(),
            segments: timeline.segments.len(),
            total_duration: timeline.total_duration(),
            timeout: control.timeout,
        });

        match self.outcome {
            RenderOutcome::Succeed => {
                tokio::fs::write(output, b"rendered").await?;
                Ok(())
            }
            RenderOutcome::FailAfterPartialWrite => {
                tokio::fs::write(output, b"partial").await?;
                Err(MediaError::ffmpeg_failed(
                    "encoder crashed",
                    Some("Conversion failed!".to_string()),
                    Some(1),
                ))
            }
        }
    }

    async fn preview(&self, _video: &Path, preview: &Path, _duration: f64) -> MediaResult<()> {
        tokio::fs::write(preview, b"GIF89a").await?;
        Ok(())
    }
}

/// Accepts every image.
pub struct AcceptAll;

impl QualityScorer for AcceptAll {
    fn score(&self, _path: &Path) -> ScoreResult {
        ScoreResult::from_parts(30.0, 40.0, 10.0, true)
    }
}

pub fn image(id: u32) -> MediaRef {
    Arc::new(MediaItem::image(id, format!("/media/images/img_{:02}.jpg", id)))
}

pub fn video(id: u32, duration: f64) -> MediaRef {
    Arc::new(MediaItem::video(
        id,
        format!("/media/videos/clip_{:02}.mp4", id),
        Some(duration),
    ))
}

/// Catalog items: `videos` with the given durations, then `images` stills.
pub fn pool(videos: &[f64], images: u32) -> Vec<MediaItem> {
    let mut items: Vec<MediaItem> = videos
        .iter()
        .enumerate()
        .map(|(i, d)| {
            MediaItem::video(
                i as u32,
                format!("/media/videos/clip_{:02}.mp4", i),
                Some(*d),
            )
        })
        .collect();
    let offset = items.len() as u32;
    items.extend(
        (0..images).map(|i| MediaItem::image(offset + i, format!("/media/images/img_{:02}.jpg", i))),
    );
    items
}
