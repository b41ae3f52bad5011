//! Planning budgets and pacing constants.
//!
//! Every struct here is read-only for the duration of a run. Defaults match
//! the production tuning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Duration and material-count limits for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct SelectionBudget {
    /// Intended length of the highlight, outro excluded
    #[validate(range(min = 1.0))]
    pub target_duration: f64,
    /// Shortest acceptable highlight
    #[validate(range(min = 0.0))]
    pub min_duration: f64,
    /// Ceiling on the sum of carved video clips
    #[validate(range(min = 0.0))]
    pub max_video_budget: f64,
    /// Hard ceiling on the assembled timeline, outro included
    #[validate(range(min = 1.0))]
    pub max_total_duration: f64,
    /// Below this pool size the whole pool is used
    #[validate(range(min = 1))]
    pub min_materials: usize,
    #[validate(range(min = 1))]
    pub max_materials: usize,
    /// Smallest pool the randomized selector accepts
    pub min_viable_materials: usize,
    #[validate(range(min = 0.1))]
    pub min_clip_len: f64,
    #[validate(range(min = 0.1))]
    pub max_clip_len: f64,
    /// Spacing kept between carved intervals of one video
    #[validate(range(min = 0.0))]
    pub min_gap: f64,
    /// Videos shorter than this are dropped
    #[validate(range(min = 0.0))]
    pub min_source_duration: f64,
    /// Replacement draws per rejected image
    #[validate(range(max = 16))]
    pub max_replacement_attempts: u32,
}

impl Default for SelectionBudget {
    fn default() -> Self {
        Self {
            target_duration: 90.0,
            min_duration: 75.0,
            max_video_budget: 52.0,
            max_total_duration: 100.0,
            min_materials: 15,
            max_materials: 30,
            min_viable_materials: 5,
            min_clip_len: 8.0,
            max_clip_len: 12.0,
            min_gap: 1.0,
            min_source_duration: 5.0,
            max_replacement_attempts: 3,
        }
    }
}

/// Image time allocation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct ImagePacing {
    /// Lower clamp on the image budget
    #[validate(range(min = 0.0))]
    pub min_image_budget: f64,
    /// Upper clamp on the image budget
    #[validate(range(min = 0.0))]
    pub max_image_budget: f64,
    #[validate(range(min = 0.1))]
    pub min_group_duration: f64,
    #[validate(range(min = 0.1))]
    pub max_group_duration: f64,
    /// Leading groups forced to a single image in the dense branch
    pub forced_singles: usize,
    #[validate(range(min = 1))]
    pub max_group_size: usize,
    /// Seconds per image that must stay available for images not yet grouped
    #[validate(range(min = 0.0))]
    pub lookahead_floor: f64,
    /// Shortest leftover that still gets its own collage
    #[validate(range(min = 0.0))]
    pub min_collage_leftover: f64,
}

impl Default for ImagePacing {
    fn default() -> Self {
        Self {
            min_image_budget: 13.0,
            max_image_budget: 44.0,
            min_group_duration: 3.0,
            max_group_duration: 5.0,
            forced_singles: 3,
            max_group_size: 4,
            lookahead_floor: 1.8,
            min_collage_leftover: 1.8,
        }
    }
}

impl ImagePacing {
    /// Image budget left after videos, clamped to the configured range.
    pub fn remaining_budget(&self, target_duration: f64, video_total: f64) -> f64 {
        (target_duration - video_total).clamp(self.min_image_budget, self.max_image_budget)
    }
}

/// Transition insertion constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct TransitionSettings {
    /// Chance that an adjacent pair receives a transition
    #[validate(range(min = 0.0, max = 1.0))]
    pub probability: f64,
    #[validate(range(min = 0.0))]
    pub min_duration: f64,
    #[validate(range(min = 0.0))]
    pub max_duration: f64,
    /// Largest share of a neighbor a transition may overlap
    #[validate(range(min = 0.0, max = 0.5))]
    pub overlap_share: f64,
    /// Overlaps shorter than this are skipped
    #[validate(range(min = 0.0))]
    pub min_overlap: f64,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            probability: 0.3,
            min_duration: 1.0,
            max_duration: 2.5,
            overlap_share: 0.3,
            min_overlap: 0.1,
        }
    }
}

/// Audio bed and outro constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct AudioBedSettings {
    #[validate(range(min = 0.0))]
    pub fade_in: f64,
    #[validate(range(min = 0.0))]
    pub fade_out: f64,
    #[validate(range(min = 0.0))]
    pub max_outro_duration: f64,
}

impl Default for AudioBedSettings {
    fn default() -> Self {
        Self {
            fade_in: 2.0,
            fade_out: 5.0,
            max_outro_duration: 5.0,
        }
    }
}
