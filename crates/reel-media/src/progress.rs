//! Parsing of FFmpeg `-progress pipe:2` output.

use serde::{Deserialize, Serialize};

/// Snapshot of encoder progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    /// Output position in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime
    pub speed: f64,
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Completed share of a timeline of `total_secs`, in `[0, 1]`.
    pub fn fraction(&self, total_secs: f64) -> f64 {
        if total_secs <= 0.0 {
            return 0.0;
        }
        if self.is_complete {
            return 1.0;
        }
        (self.out_time_ms as f64 / 1000.0 / total_secs).clamp(0.0, 1.0)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + 'static>;

/// Whether a stderr line is a `key=value` progress field rather than a log message.
pub fn is_progress_field(line: &str) -> bool {
    line.trim()
        .split_once('=')
        .is_some_and(|(key, value)| !key.is_empty() && !key.contains(' ') && !value.contains(' '))
}

/// Fold one progress line into `current`.
///
/// Returns a snapshot when FFmpeg closes a progress block (`progress=...`).
pub fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        // FFmpeg reports microseconds under both names
        "out_time_us" | "out_time_ms" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            current.is_complete = value == "end";
            return Some(current.clone());
        }
        _ => {}
    }

    None
}
