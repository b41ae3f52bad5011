//! Run configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use reel_models::{
    AudioBedSettings, EncodingConfig, ImagePacing, Resolution, SelectionBudget,
    TransitionSettings,
};

use crate::error::{EngineError, EngineResult};

/// Everything one highlight run needs to know, fixed for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub budget: SelectionBudget,
    pub pacing: ImagePacing,
    pub transitions: TransitionSettings,
    pub audio: AudioBedSettings,
    pub resolution: Resolution,
    pub encoding: EncodingConfig,
    /// Directories scanned for media, in both selection modes
    pub media_roots: Vec<PathBuf>,
    /// Explicit selection; skips randomized selection and scoring
    pub manual_files: Option<Vec<String>>,
    /// Directory a background track is drawn from
    pub music_dir: Option<PathBuf>,
    /// Track used as-is, takes precedence over `music_dir`
    pub music_track: Option<PathBuf>,
    pub outro_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Parent for render scratch directories; system temp when unset
    pub scratch_dir: Option<PathBuf>,
    pub render_timeout: Duration,
    /// Fixes every random draw of the run
    pub seed: Option<u64>,
    pub preview: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget: SelectionBudget::default(),
            pacing: ImagePacing::default(),
            transitions: TransitionSettings::default(),
            audio: AudioBedSettings::default(),
            resolution: Resolution::default(),
            encoding: EncodingConfig::default(),
            media_roots: vec![PathBuf::from("./media")],
            manual_files: None,
            music_dir: Some(PathBuf::from("./music")),
            music_track: None,
            outro_dir: Some(PathBuf::from("./outro")),
            output_dir: PathBuf::from("./output"),
            scratch_dir: None,
            render_timeout: Duration::from_secs(1800), // 30 minutes
            seed: None,
            preview: true,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
}

impl RunConfig {
    /// Create config from `REEL_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut budget = defaults.budget.clone();
        budget.target_duration =
            env_parse("REEL_TARGET_DURATION").unwrap_or(budget.target_duration);
        budget.min_duration = env_parse("REEL_MIN_DURATION").unwrap_or(budget.min_duration);
        budget.max_video_budget =
            env_parse("REEL_MAX_VIDEO_BUDGET").unwrap_or(budget.max_video_budget);
        budget.max_total_duration =
            env_parse("REEL_MAX_TOTAL_DURATION").unwrap_or(budget.max_total_duration);
        budget.min_materials = env_parse("REEL_MIN_MATERIALS").unwrap_or(budget.min_materials);
        budget.max_materials = env_parse("REEL_MAX_MATERIALS").unwrap_or(budget.max_materials);

        let mut encoding = defaults.encoding.clone();
        if let Some(threads) = env_parse("REEL_THREADS") {
            encoding = encoding.with_threads(threads);
        }
        if let Some(crf) = env_parse("REEL_CRF") {
            encoding = encoding.with_crf(crf);
        }
        if env_parse("REEL_USE_NVENC").unwrap_or(false) {
            encoding = encoding.with_nvenc();
        }

        Self {
            budget,
            encoding,
            resolution: env_parse("REEL_RESOLUTION").unwrap_or(defaults.resolution),
            media_roots: env_list("REEL_MEDIA_ROOTS")
                .map(|roots| roots.into_iter().map(PathBuf::from).collect())
                .unwrap_or(defaults.media_roots),
            manual_files: env_list("REEL_MANUAL_FILES").filter(|files| !files.is_empty()),
            music_dir: env_parse("REEL_MUSIC_DIR").or(defaults.music_dir),
            music_track: env_parse("REEL_MUSIC_TRACK"),
            outro_dir: env_parse("REEL_OUTRO_DIR").or(defaults.outro_dir),
            output_dir: env_parse("REEL_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            scratch_dir: env_parse("REEL_SCRATCH_DIR"),
            render_timeout: env_parse("REEL_RENDER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.render_timeout),
            seed: env_parse("REEL_SEED"),
            preview: env_parse("REEL_PREVIEW").unwrap_or(defaults.preview),
            ..defaults
        }
    }

    /// Reject ranges the planners cannot work with.
    pub fn validate(&self) -> EngineResult<()> {
        self.budget
            .validate()
            .map_err(|e| EngineError::config_error(format!("budget: {}", e)))?;
        self.pacing
            .validate()
            .map_err(|e| EngineError::config_error(format!("pacing: {}", e)))?;
        self.transitions
            .validate()
            .map_err(|e| EngineError::config_error(format!("transitions: {}", e)))?;
        self.audio
            .validate()
            .map_err(|e| EngineError::config_error(format!("audio: {}", e)))?;

        let b = &self.budget;
        if b.min_clip_len > b.max_clip_len {
            return Err(EngineError::config_error(format!(
                "min_clip_len ({}) exceeds max_clip_len ({})",
                b.min_clip_len, b.max_clip_len
            )));
        }
        if b.min_materials > b.max_materials {
            return Err(EngineError::config_error(format!(
                "min_materials ({}) exceeds max_materials ({})",
                b.min_materials, b.max_materials
            )));
        }
        if b.min_duration > b.target_duration || b.target_duration > b.max_total_duration {
            return Err(EngineError::config_error(format!(
                "durations must satisfy min ({}) <= target ({}) <= max ({})",
                b.min_duration, b.target_duration, b.max_total_duration
            )));
        }

        let p = &self.pacing;
        if p.min_image_budget > p.max_image_budget {
            return Err(EngineError::config_error("image budget range is empty"));
        }
        if p.min_group_duration > p.max_group_duration {
            return Err(EngineError::config_error("group duration range is empty"));
        }

        let t = &self.transitions;
        if t.min_duration > t.max_duration {
            return Err(EngineError::config_error(
                "transition duration range is empty",
            ));
        }

        // Manual files are resolved against the scanned catalog too
        if self.media_roots.is_empty() {
            return Err(EngineError::config_error("no media roots configured"));
        }

        Ok(())
    }
}
