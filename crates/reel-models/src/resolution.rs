//! Output resolution presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target frame shape of the rendered highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// 1280x720 landscape
    #[default]
    Horizontal,
    /// 720x1280 portrait
    Vertical,
    /// 720x720
    Square,
}

impl Resolution {
    pub const ALL: &'static [Resolution] = &[
        Resolution::Horizontal,
        Resolution::Vertical,
        Resolution::Square,
    ];

    /// Frame size as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::Horizontal => (1280, 720),
            Resolution::Vertical => (720, 1280),
            Resolution::Square => (720, 720),
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// Shorter frame edge, used when comparing source image sizes.
    pub fn short_side(&self) -> u32 {
        let (w, h) = self.dimensions();
        w.min(h)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Horizontal => "horizontal",
            Resolution::Vertical => "vertical",
            Resolution::Square => "square",
        }
    }

    /// Outro file names to try for this shape, most specific first.
    ///
    /// Square output reuses the horizontal outro when no dedicated file exists.
    pub fn outro_candidates(&self) -> &'static [&'static str] {
        match self {
            Resolution::Horizontal => &["outro_horizontal.mp4"],
            Resolution::Vertical => &["outro_vertical.mp4"],
            Resolution::Square => &["outro_square.mp4", "outro_horizontal.mp4"],
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} ({}x{})", self.as_str(), w, h)
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horizontal" | "landscape" | "16:9" => Ok(Resolution::Horizontal),
            "vertical" | "portrait" | "9:16" => Ok(Resolution::Vertical),
            "square" | "1:1" => Ok(Resolution::Square),
            _ => Err(ResolutionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown resolution: {0}")]
pub struct ResolutionParseError(String);
