//! Media discovery.
//!
//! The catalog is a pure read of the media roots: files are classified by
//! extension, videos are probed for their duration through the backend, and
//! the result is sorted by path so a seeded run always sees the same pool.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use reel_media::MediaBackend;
use reel_models::{MediaItem, MediaKind, MediaRef};

use crate::error::{EngineError, EngineResult};

/// Subfolders of a root that are scanned in addition to the root itself.
pub const MEDIA_SUBFOLDERS: &[&str] = &["images", "videos"];

/// Every media item available to one run.
#[derive(Debug, Clone, Default)]
pub struct MediaCatalog {
    items: Vec<MediaRef>,
}

impl MediaCatalog {
    /// Build a catalog from already-classified items.
    pub fn from_items(items: impl IntoIterator<Item = MediaItem>) -> Self {
        Self {
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    /// Scan `roots`, probing every video through `backend`.
    ///
    /// Videos that fail to probe stay in the catalog without a duration; the
    /// video planner drops them later.
    pub async fn scan(roots: &[PathBuf], backend: &dyn MediaBackend) -> EngineResult<Self> {
        let owned = roots.to_vec();
        let paths = tokio::task::spawn_blocking(move || discover(&owned))
            .await
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;

        if paths.is_empty() {
            return Err(EngineError::no_media_found(roots));
        }

        let mut items = Vec::with_capacity(paths.len());
        for (index, (path, kind)) in paths.into_iter().enumerate() {
            let id = index as u32;
            let item = match kind {
                MediaKind::Image => MediaItem::image(id, path),
                MediaKind::Video => {
                    let duration = match backend.probe(&path).await {
                        Ok(duration) => Some(duration),
                        Err(e) => {
                            let err = EngineError::unreadable(&path, e.to_string());
                            warn!(error = %err, "Video probe failed");
                            None
                        }
                    };
                    MediaItem::video(id, path, duration)
                }
            };
            items.push(item);
        }

        let catalog = Self::from_items(items);
        info!(
            images = catalog.images().count(),
            videos = catalog.videos().count(),
            "Media catalog scanned"
        );
        Ok(catalog)
    }

    pub fn items(&self) -> &[MediaRef] {
        &self.items
    }

    pub fn images(&self) -> impl Iterator<Item = &MediaRef> {
        self.items.iter().filter(|item| item.is_image())
    }

    pub fn videos(&self) -> impl Iterator<Item = &MediaRef> {
        self.items.iter().filter(|item| item.is_video())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look an item up by file name, or by path when `name` has directories.
    pub fn find(&self, name: &str) -> Option<&MediaRef> {
        let wanted = Path::new(name);
        let by_path = wanted.components().count() > 1;
        self.items.iter().find(|item| {
            if by_path {
                item.path == wanted || item.path.ends_with(wanted)
            } else {
                item.file_name() == Some(name)
            }
        })
    }
}

/// Classified media files under `roots` and their named subfolders, sorted by path.
fn discover(roots: &[PathBuf]) -> Vec<(PathBuf, MediaKind)> {
    let mut found = BTreeSet::new();

    for root in roots {
        // The root itself is not descended into; its named subfolders are.
        collect(root, Some(1), &mut found);
        for sub in MEDIA_SUBFOLDERS {
            let dir = root.join(sub);
            if dir.is_dir() {
                collect(&dir, None, &mut found);
            }
        }
    }

    found
        .into_iter()
        .filter_map(|path| MediaKind::from_path(&path).map(|kind| (path, kind)))
        .collect()
}

fn collect(dir: &Path, max_depth: Option<usize>, found: &mut BTreeSet<PathBuf>) {
    let mut walker = WalkDir::new(dir).follow_links(true);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry during scan");
                continue;
            }
        };
        if entry.file_type().is_file() && MediaKind::from_path(entry.path()).is_some() {
            found.insert(entry.into_path());
        }
    }
}
