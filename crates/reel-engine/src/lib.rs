//! Selection and composition engine for automatic highlight videos.
//!
//! This crate provides:
//! - Media discovery and the quality-gated material selector
//! - Two-phase video carving over per-source free-interval sets
//! - Image pacing with randomized grouping for dense material
//! - Transition scheduling under a hard duration cap
//! - Timeline composition (outro, audio bed) and render dispatch
//! - Run configuration, error taxonomy and structured run logging

pub mod catalog;
pub mod composer;
pub mod compositor;
pub mod config;
pub mod error;
pub mod image_planner;
pub mod intervals;
pub mod logging;
pub mod music;
pub mod pipeline;
pub mod sampling;
pub mod scorer;
pub mod selector;
pub mod transitions;
pub mod video_planner;

pub use catalog::MediaCatalog;
pub use composer::{dispatch, load_outro, output_file_name, Composer};
pub use compositor::{Compositor, GridCompositor};
pub use config::RunConfig;
pub use error::{EngineError, EngineResult};
pub use image_planner::ImageSequencePlanner;
pub use intervals::{FreeIntervalSet, Interval};
pub use logging::RunLogger;
pub use music::MusicTrack;
pub use pipeline::{HighlightPipeline, PlanInputs, RunPlan};
pub use sampling::run_rng;
pub use scorer::{DimensionScorer, QualityScorer};
pub use selector::{Backfill, MaterialSelector, Selection, SelectionReport};
pub use transitions::{TransitionReport, TransitionScheduler};
pub use video_planner::{VideoPlan, VideoSegmentPlanner};
