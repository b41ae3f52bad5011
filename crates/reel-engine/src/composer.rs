//! Final timeline assembly and render dispatch.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::Path;
use tracing::{info, warn};

use reel_media::{MediaBackend, RenderControl};
use reel_models::{
    AudioBed, AudioBedSettings, EncodingConfig, OutroClip, Resolution, RunId, Segment,
    SelectionBudget, Timeline, DURATION_EPSILON,
};

use crate::error::{EngineError, EngineResult};
use crate::music::MusicTrack;

/// `highlight_<HHMM_DDMM>_<run-id-prefix>.mp4`
pub fn output_file_name<Tz>(run_id: &RunId, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("highlight_{}_{}.mp4", at.format("%H%M_%d%m"), run_id.short())
}

/// Outro clip for `resolution` from `dir`, capped at `max_duration`.
///
/// A missing or unreadable outro is not an error; the highlight simply ends
/// with its last segment.
pub async fn load_outro(
    dir: &Path,
    resolution: Resolution,
    backend: &dyn MediaBackend,
    max_duration: f64,
) -> Option<OutroClip> {
    for name in resolution.outro_candidates() {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        match backend.probe(&path).await {
            Ok(duration) => {
                let duration = duration.min(max_duration);
                info!(outro = %path.display(), duration, "Outro selected");
                return Some(OutroClip { path, duration });
            }
            Err(e) => warn!(outro = %path.display(), error = %e, "Outro probe failed"),
        }
    }
    warn!(dir = %dir.display(), %resolution, "No outro found, continuing without one");
    None
}

pub struct Composer<'a> {
    budget: &'a SelectionBudget,
    audio: &'a AudioBedSettings,
    resolution: Resolution,
}

impl<'a> Composer<'a> {
    pub fn new(
        budget: &'a SelectionBudget,
        audio: &'a AudioBedSettings,
        resolution: Resolution,
    ) -> Self {
        Self {
            budget,
            audio,
            resolution,
        }
    }

    /// Freeze the segment order into a timeline with outro and audio bed.
    pub fn compose(
        &self,
        segments: Vec<Segment>,
        outro: Option<OutroClip>,
        music: Option<&MusicTrack>,
    ) -> Timeline {
        let mut timeline = Timeline {
            resolution: self.resolution,
            segments,
            outro,
            audio: None,
        };
        let total = timeline.total_duration();

        timeline.audio = music.map(|track| {
            AudioBed::fit_to(
                track.path.clone(),
                track.duration,
                total,
                self.audio.fade_in,
                self.audio.fade_out,
            )
        });

        if total > self.budget.max_total_duration + DURATION_EPSILON {
            warn!(
                total,
                max = self.budget.max_total_duration,
                "Timeline exceeds the duration cap"
            );
        } else if total + DURATION_EPSILON < self.budget.min_duration {
            warn!(
                total,
                min = self.budget.min_duration,
                "Timeline is shorter than the minimum duration"
            );
        }

        info!(
            segments = timeline.segments.len(),
            transitions = timeline.transition_count(),
            total,
            audio = timeline.audio.is_some(),
            outro = timeline.outro.is_some(),
            "Timeline composed"
        );
        timeline
    }
}

/// Hand `timeline` to the backend.
///
/// On failure nothing is left at `output` unless a file was already there
/// before the call.
pub async fn dispatch(
    backend: &dyn MediaBackend,
    timeline: &Timeline,
    output: &Path,
    encoding: &EncodingConfig,
    control: RenderControl,
) -> EngineResult<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let existed = output.exists();

    match backend.render(timeline, output, encoding, control).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if !existed && output.exists() {
                if let Err(rm) = tokio::fs::remove_file(output).await {
                    warn!(output = %output.display(), error = %rm, "Failed to remove partial output");
                }
            }
            Err(EngineError::from_render(e))
        }
    }
}
