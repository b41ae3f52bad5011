//! Shared data models for the highlight reel engine.
//!
//! This crate provides Serde-serializable types for:
//! - Media items and quality verdicts
//! - Planning budgets and pacing constants
//! - Segments, timelines and the transition catalog
//! - Encoding configuration and run results

pub mod budget;
pub mod encoding;
pub mod media;
pub mod resolution;
pub mod run;
pub mod score;
pub mod segment;
pub mod timeline;
pub mod transition;

// Re-export common types
pub use budget::{AudioBedSettings, ImagePacing, SelectionBudget, TransitionSettings};
pub use encoding::EncodingConfig;
pub use media::{MediaId, MediaItem, MediaKind, MediaRef};
pub use resolution::{Resolution, ResolutionParseError};
pub use run::{RenderResult, RunId};
pub use score::ScoreResult;
pub use segment::{Segment, SegmentKind, DURATION_EPSILON};
pub use timeline::{AudioBed, AudioFit, OutroClip, Timeline};
pub use transition::{BlendBehavior, TransitionEffect, TRANSITION_CATALOG};
