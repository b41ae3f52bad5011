//! Image quality gate.
//!
//! The selector only depends on [`QualityScorer`]. Pixel-level face and
//! sharpness metrics live outside this crate; [`DimensionScorer`] is the
//! built-in gate that checks readability and resolution.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use reel_models::score::MAX_RESOLUTION_SCORE;
use reel_models::{Resolution, ScoreResult};

use crate::error::{EngineError, EngineResult};

/// Files shorter than this are treated as truncated.
const MIN_HEADER_BYTES: usize = 10;

/// Share of the target short side an image needs to be accepted.
pub const MIN_ACCEPTABLE_RATIO: f64 = 0.8;

/// Scores one image.
///
/// Implementations must not fail: any internal error is reported as a
/// rejected [`ScoreResult`] with a total of zero.
#[cfg_attr(test, mockall::automock)]
pub trait QualityScorer: Send + Sync {
    fn score(&self, path: &Path) -> ScoreResult;
}

/// Resolution-only scorer based on the image header.
#[derive(Debug, Clone, Copy)]
pub struct DimensionScorer {
    target: Resolution,
}

impl DimensionScorer {
    pub fn new(target: Resolution) -> Self {
        Self { target }
    }
}

impl QualityScorer for DimensionScorer {
    fn score(&self, path: &Path) -> ScoreResult {
        let (width, height) = match read_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => return ScoreResult::rejected(e.to_string()),
        };

        let ratio = width.min(height) as f64 / self.target.short_side() as f64;
        let resolution_score = resolution_score(ratio);
        let acceptable = ratio >= MIN_ACCEPTABLE_RATIO;
        let reason = if acceptable {
            format!("{}x{} meets the {} target", width, height, self.target)
        } else {
            format!(
                "{}x{} is below {:.0}% of the {} target",
                width,
                height,
                MIN_ACCEPTABLE_RATIO * 100.0,
                self.target
            )
        };

        ScoreResult {
            face_score: 0.0,
            quality_score: 0.0,
            resolution_score,
            total: resolution_score,
            acceptable,
            reason,
        }
    }
}

/// Resolution sub-score for an image whose short side is `ratio` of the target's.
pub fn resolution_score(ratio: f64) -> f64 {
    if ratio >= 1.0 {
        MAX_RESOLUTION_SCORE
    } else if ratio >= 0.8 {
        7.0
    } else if ratio >= 0.6 {
        4.0
    } else {
        1.0
    }
}

fn read_dimensions(path: &Path) -> EngineResult<(u32, u32)> {
    check_readable(path)?;
    image::image_dimensions(path).map_err(|e| EngineError::unreadable(path, e.to_string()))
}

fn check_readable(path: &Path) -> EngineResult<()> {
    if !path.exists() {
        return Err(EngineError::unreadable(path, "file does not exist"));
    }
    if !path.is_file() {
        return Err(EngineError::unreadable(path, "not a regular file"));
    }
    let mut header = [0u8; MIN_HEADER_BYTES];
    let read = File::open(path)
        .and_then(|mut f| f.read(&mut header))
        .map_err(|e| EngineError::unreadable(path, format!("read failed: {}", e)))?;
    if read < MIN_HEADER_BYTES {
        return Err(EngineError::unreadable(path, "file is empty or truncated"));
    }
    Ok(())
}
