//! The assembled timeline handed to a renderer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolution::Resolution;
use crate::segment::{self, Segment};

/// Muted closing clip appended after the last segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutroClip {
    pub path: PathBuf,
    /// Seconds used from the start of the file
    pub duration: f64,
}

/// How the music track is fitted to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AudioFit {
    /// Track is longer than the timeline and is cut.
    Trim,
    /// Track is repeated whole `repeats` times, then cut.
    Loop { repeats: u32 },
}

/// Background music for the whole timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBed {
    pub track: PathBuf,
    pub track_duration: f64,
    pub fit: AudioFit,
    /// Seconds of audio played, equal to the timeline total
    pub duration: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

impl AudioBed {
    /// Fit `track` to `total` seconds.
    pub fn fit_to(
        track: PathBuf,
        track_duration: f64,
        total: f64,
        fade_in: f64,
        fade_out: f64,
    ) -> Self {
        let fit = if track_duration >= total || track_duration <= 0.0 {
            AudioFit::Trim
        } else {
            AudioFit::Loop {
                repeats: (total / track_duration).floor() as u32 + 1,
            }
        };

        Self {
            track,
            track_duration,
            fit,
            duration: total,
            fade_in: fade_in.min(total),
            fade_out: fade_out.min(total),
        }
    }

    /// Fade-out start, so the fade ends exactly at the outro boundary.
    pub fn fade_out_start(&self) -> f64 {
        (self.duration - self.fade_out).max(0.0)
    }
}

/// Final ordered plan for one highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub resolution: Resolution,
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro: Option<OutroClip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioBed>,
}

impl Timeline {
    /// Seconds covered by the planned segments, outro excluded.
    pub fn content_duration(&self) -> f64 {
        segment::total_duration(&self.segments)
    }

    /// Seconds of the rendered file, outro included.
    pub fn total_duration(&self) -> f64 {
        self.content_duration() + self.outro.as_ref().map_or(0.0, |o| o.duration)
    }

    pub fn transition_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_transition()).count()
    }
}
