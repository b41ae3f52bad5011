//! FFmpeg rendering backend for highlight timelines.
//!
//! This crate provides:
//! - The [`MediaBackend`] contract (probe and render) used by the engine
//! - Type-safe FFmpeg command building with cancellation and timeouts
//! - Progress parsing from `-progress pipe:2`
//! - Timeline to filter graph translation (stills, collages, clips, transitions, audio bed)
//! - Atomic output placement and preview generation

pub mod backend;
pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod graph;
pub mod preview;
pub mod probe;
pub mod progress;

pub use backend::{FfmpegBackend, MediaBackend, RenderControl};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use graph::{InputHandle, RenderGraph, RenderPlan};
pub use preview::{generate_preview, preview_path_for};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
