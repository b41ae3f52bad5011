//! Background track selection.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use reel_media::MediaBackend;

/// Recognized audio extensions (lowercase, without dot).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicTrack {
    pub path: PathBuf,
    pub duration: f64,
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Audio files directly inside `dir`, sorted by path.
pub fn list_tracks(dir: &Path) -> Vec<PathBuf> {
    let mut tracks: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_audio(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    tracks.sort();
    tracks
}

/// The explicit track when set, otherwise a random one from `dir`.
pub fn choose_track<R: Rng + ?Sized>(
    explicit: Option<&Path>,
    dir: Option<&Path>,
    rng: &mut R,
) -> Option<PathBuf> {
    if let Some(track) = explicit {
        return Some(track.to_path_buf());
    }
    let dir = dir?;
    let tracks = list_tracks(dir);
    let chosen = tracks.choose(rng).cloned();
    if chosen.is_none() {
        info!(dir = %dir.display(), "No music found, rendering without an audio bed");
    }
    chosen
}

/// Probe `path`; a track that cannot be probed is skipped.
pub async fn load_track(path: &Path, backend: &dyn MediaBackend) -> Option<MusicTrack> {
    match backend.probe(path).await {
        Ok(duration) => {
            info!(track = %path.display(), duration, "Music selected");
            Some(MusicTrack {
                path: path.to_path_buf(),
                duration,
            })
        }
        Err(e) => {
            warn!(track = %path.display(), error = %e, "Music probe failed, continuing without audio");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::run_rng;
    use tempfile::TempDir;

    #[test]
    fn test_lists_only_audio() {
        let dir = TempDir::new().unwrap();
        for name in ["b.MP3", "a.flac", "cover.jpg", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.mp3"), b"x").unwrap();

        let names: Vec<_> = list_tracks(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.flac", "b.MP3"]);
    }

    #[test]
    fn test_explicit_track_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        let chosen = choose_track(
            Some(Path::new("/music/theme.wav")),
            Some(dir.path()),
            &mut run_rng(Some(1)),
        );
        assert_eq!(chosen, Some(PathBuf::from("/music/theme.wav")));
    }

    #[test]
    fn test_empty_directory_means_no_track() {
        let dir = TempDir::new().unwrap();
        assert_eq!(choose_track(None, Some(dir.path()), &mut run_rng(Some(1))), None);
        assert_eq!(choose_track(None, None, &mut run_rng(Some(1))), None);
    }
}
