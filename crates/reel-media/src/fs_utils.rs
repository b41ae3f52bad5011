//! Placing finished renders at their final path.
//!
//! Renders are written inside a scratch directory and only moved into place
//! once complete, so the output path never holds a partial file.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a finished file from `src` to `dst`.
///
/// A plain rename is tried first. When `src` and `dst` are on different
/// filesystems (EXDEV) the file is copied into a staging file next to `dst`
/// and renamed over it; the staging file is removed on any failure.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename, staging copy: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_across_devices(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_across_devices(src: &Path, dst: &Path) -> MediaResult<()> {
    let dir = dst
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Deleted on drop unless persisted
    let staging = tempfile::Builder::new()
        .prefix(".reel-")
        .suffix(".partial")
        .tempfile_in(dir)?
        .into_temp_path();

    fs::copy(src, &staging).await?;
    staging.persist(dst).map_err(|e| MediaError::Io(e.error))?;

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(
            "Failed to remove source after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
