//! Run identity and results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::resolution::Resolution;

/// Unique run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for file names.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured outcome of a highlight run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub run_id: RunId,
    pub success: bool,
    pub output_path: PathBuf,
    /// Seconds, outro included
    pub total_duration: f64,
    /// Planned segments, transitions included, outro excluded
    pub segments_used: usize,
    pub resolution: Resolution,
    /// Wall-clock seconds spent on the run
    pub processing_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_short() {
        let id = RunId::from_string("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(RunId::from_string("abc").short(), "abc");
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = RenderResult {
            run_id: RunId::from_string("r1"),
            success: true,
            output_path: "out.mp4".into(),
            total_duration: 92.5,
            segments_used: 17,
            resolution: Resolution::Vertical,
            processing_time: 41.0,
            preview_path: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"outputPath\":\"out.mp4\""));
        assert!(json.contains("\"segmentsUsed\":17"));
        assert!(!json.contains("previewPath"));
    }
}
