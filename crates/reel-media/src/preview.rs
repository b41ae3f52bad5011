//! Animated preview generation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use reel_models::encoding::{PREVIEW_FPS, PREVIEW_MAX_SECONDS, PREVIEW_SCALE_WIDTH};

const PREVIEW_TIMEOUT: Duration = Duration::from_secs(60);

/// `preview_<stem>.gif` next to `output`.
pub fn preview_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "highlight".to_string());
    output.with_file_name(format!("preview_{}.gif", stem))
}

fn preview_filter() -> String {
    format!(
        "fps={},scale='min({},iw)':-2:flags=lanczos",
        PREVIEW_FPS, PREVIEW_SCALE_WIDTH
    )
}

/// Write a short looping GIF of the start of `video`.
pub async fn generate_preview(
    video: impl AsRef<Path>,
    preview: impl AsRef<Path>,
    video_duration: f64,
) -> MediaResult<()> {
    let seconds = video_duration.clamp(0.1, PREVIEW_MAX_SECONDS);

    let cmd = FfmpegCommand::new(preview.as_ref())
        .input_with_args(["-t".to_string(), format!("{:.3}", seconds)], video.as_ref())
        .video_filter(preview_filter())
        .output_args(["-loop", "0"]);

    FfmpegRunner::new()
        .with_timeout(PREVIEW_TIMEOUT)
        .run(&cmd)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_path() {
        let path = preview_path_for(Path::new("/out/highlight_1200_0105_abcd.mp4"));
        assert_eq!(path, PathBuf::from("/out/preview_highlight_1200_0105_abcd.gif"));
    }

    #[test]
    fn test_preview_filter() {
        let filter = preview_filter();
        assert!(filter.starts_with("fps=8"));
        assert!(filter.contains("320"));
    }
}
