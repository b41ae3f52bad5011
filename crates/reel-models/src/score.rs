//! Image quality verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MAX_FACE_SCORE: f64 = 40.0;
pub const MAX_QUALITY_SCORE: f64 = 50.0;
pub const MAX_RESOLUTION_SCORE: f64 = 10.0;
/// Minimum total score for an image to pass the quality gate.
pub const ACCEPTANCE_THRESHOLD: f64 = 40.0;

/// Verdict returned by a quality scorer for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// 0-40
    pub face_score: f64,
    /// 0-50
    pub quality_score: f64,
    /// 0-10
    pub resolution_score: f64,
    /// 0-100
    pub total: f64,
    pub acceptable: bool,
    pub reason: String,
}

impl ScoreResult {
    /// Build a result from sub-scores, clamping each to its range.
    ///
    /// `resolution_ok` is the separate resolution gate; an image must pass both
    /// it and [`ACCEPTANCE_THRESHOLD`].
    pub fn from_parts(
        face_score: f64,
        quality_score: f64,
        resolution_score: f64,
        resolution_ok: bool,
    ) -> Self {
        let face_score = face_score.clamp(0.0, MAX_FACE_SCORE);
        let quality_score = quality_score.clamp(0.0, MAX_QUALITY_SCORE);
        let resolution_score = resolution_score.clamp(0.0, MAX_RESOLUTION_SCORE);
        let total = face_score + quality_score + resolution_score;
        let acceptable = resolution_ok && total >= ACCEPTANCE_THRESHOLD;
        let reason = if acceptable {
            format!("accepted with total {:.1}", total)
        } else if !resolution_ok {
            "resolution below 80% of target".to_string()
        } else {
            format!("total {:.1} below threshold {:.0}", total, ACCEPTANCE_THRESHOLD)
        };

        Self {
            face_score,
            quality_score,
            resolution_score,
            total,
            acceptable,
            reason,
        }
    }

    /// Zero-score rejection, used whenever scoring itself fails.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            face_score: 0.0,
            quality_score: 0.0,
            resolution_score: 0.0,
            total: 0.0,
            acceptable: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_clamps_and_accepts() {
        let score = ScoreResult::from_parts(55.0, 20.0, 10.0, true);
        assert!((score.face_score - 40.0).abs() < f64::EPSILON);
        assert!((score.total - 70.0).abs() < 0.001);
        assert!(score.acceptable);
    }

    #[test]
    fn test_resolution_gate_overrides_total() {
        let score = ScoreResult::from_parts(40.0, 50.0, 1.0, false);
        assert!(!score.acceptable);
        assert!(score.reason.contains("resolution"));
    }

    #[test]
    fn test_rejected() {
        let score = ScoreResult::rejected("unreadable");
        assert_eq!(score.total, 0.0);
        assert!(!score.acceptable);
    }
}
