//! Material selection.
//!
//! Picks the working set of images and videos for a run. In randomized mode
//! every selected image passes through the quality gate, and rejects are
//! replaced from the unused part of the pool a bounded number of times
//! before the last candidate is kept. In explicit mode the listed files are
//! used as given.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use reel_models::{MediaKind, MediaRef, SelectionBudget};

use crate::catalog::MediaCatalog;
use crate::error::{EngineError, EngineResult};
use crate::sampling::take_random;
use crate::scorer::QualityScorer;

/// Supplies replacement material when planned items turn out unusable.
pub trait Backfill {
    /// Draw up to `count` unused items into the selection.
    ///
    /// Returns the drawn videos, which still need planning; drawn images are
    /// added to the selection directly.
    fn backfill<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<MediaRef>;
}

/// A listed file that explicit mode could not use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedFile {
    pub name: String,
    pub reason: String,
}

/// What the selector did, for the run log and result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionReport {
    /// Items chosen before quality gating
    pub requested: usize,
    pub rejected: usize,
    pub replaced: usize,
    pub force_accepted: usize,
    pub backfilled: usize,
    /// An image was swapped for a video to keep at least one video
    pub video_swapped: bool,
    pub dropped: Vec<DroppedFile>,
}

/// The working set of one run.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub images: Vec<MediaRef>,
    pub videos: Vec<MediaRef>,
    /// Unused pool items available for backfill
    reserve: Vec<MediaRef>,
    pub report: SelectionReport,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.images.len() + self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty()
    }

    pub fn reserve_len(&self) -> usize {
        self.reserve.len()
    }
}

impl Backfill for Selection {
    fn backfill<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<MediaRef> {
        let drawn = take_random(&mut self.reserve, count, rng);
        self.report.backfilled += drawn.len();

        let mut videos = Vec::new();
        for item in drawn {
            info!(path = %item.path.display(), kind = item.kind.as_str(), "Backfilled material");
            if item.is_video() {
                self.videos.push(item.clone());
                videos.push(item);
            } else {
                self.images.push(item);
            }
        }
        videos
    }
}

/// Chooses materials under a [`SelectionBudget`].
pub struct MaterialSelector<'a> {
    budget: &'a SelectionBudget,
    scorer: &'a dyn QualityScorer,
}

impl<'a> MaterialSelector<'a> {
    pub fn new(budget: &'a SelectionBudget, scorer: &'a dyn QualityScorer) -> Self {
        Self { budget, scorer }
    }

    /// How many items a randomized selection takes from a pool of `available`.
    pub fn selection_count<R: Rng + ?Sized>(
        &self,
        available: usize,
        rng: &mut R,
    ) -> EngineResult<usize> {
        let b = self.budget;
        if available == 0 {
            return Err(EngineError::insufficient(0, b.min_viable_materials));
        }
        if available < b.min_materials {
            Ok(available)
        } else if available < b.min_viable_materials {
            Err(EngineError::insufficient(available, b.min_viable_materials))
        } else {
            let hi = b.max_materials.min(available);
            if hi > b.min_materials {
                Ok(rng.random_range(b.min_materials..=hi))
            } else {
                Ok(hi)
            }
        }
    }

    /// Randomized selection over the whole pool.
    pub fn select_random<R: Rng + ?Sized>(
        &self,
        pool: &[MediaRef],
        rng: &mut R,
    ) -> EngineResult<Selection> {
        let count = self.selection_count(pool.len(), rng)?;

        let mut shuffled = pool.to_vec();
        shuffled.shuffle(rng);
        let unused = shuffled.split_off(count);

        info!(pool = pool.len(), count, "Selecting materials");
        Ok(self.gate(shuffled, unused, rng))
    }

    /// Quality-gate a preliminary selection, replacing rejects from `unused`.
    pub fn gate<R: Rng + ?Sized>(
        &self,
        preliminary: Vec<MediaRef>,
        unused: Vec<MediaRef>,
        rng: &mut R,
    ) -> Selection {
        let (mut backups, mut spare_videos): (Vec<_>, Vec<_>) =
            unused.into_iter().partition(|item| item.is_image());

        let mut report = SelectionReport {
            requested: preliminary.len(),
            ..SelectionReport::default()
        };
        let mut images = Vec::new();
        let mut videos = Vec::new();

        for item in preliminary {
            if item.is_video() {
                videos.push(item);
            } else {
                images.push(self.gate_image(item, &mut backups, &mut report, rng));
            }
        }

        if videos.is_empty() && !spare_videos.is_empty() {
            if let Some(displaced) = images.pop() {
                let index = rng.random_range(0..spare_videos.len());
                let video = spare_videos.swap_remove(index);
                info!(
                    image = %displaced.path.display(),
                    video = %video.path.display(),
                    "No video selected, swapping one image for a video"
                );
                videos.push(video);
                backups.push(displaced);
                report.video_swapped = true;
            }
        }

        backups.append(&mut spare_videos);
        info!(
            images = images.len(),
            videos = videos.len(),
            rejected = report.rejected,
            replaced = report.replaced,
            force_accepted = report.force_accepted,
            "Materials selected"
        );

        Selection {
            images,
            videos,
            reserve: backups,
            report,
        }
    }

    /// Score `original`, drawing replacements until one passes or attempts run out.
    ///
    /// Rejected candidates are discarded and never offered for backfill.
    fn gate_image<R: Rng + ?Sized>(
        &self,
        original: MediaRef,
        backups: &mut Vec<MediaRef>,
        report: &mut SelectionReport,
        rng: &mut R,
    ) -> MediaRef {
        let mut candidate = original;
        let mut attempts = 0;

        loop {
            let verdict = self.scorer.score(&candidate.path);
            if verdict.acceptable {
                debug!(path = %candidate.path.display(), total = verdict.total, "Image accepted");
                return candidate;
            }

            report.rejected += 1;
            metrics::counter!("reel_images_rejected_total").increment(1);
            info!(
                path = %candidate.path.display(),
                reason = %verdict.reason,
                attempt = attempts,
                "Image rejected"
            );

            if attempts >= self.budget.max_replacement_attempts || backups.is_empty() {
                report.force_accepted += 1;
                metrics::counter!("reel_images_force_accepted_total").increment(1);
                warn!(
                    path = %candidate.path.display(),
                    "No acceptable replacement left, keeping last candidate"
                );
                return candidate;
            }

            attempts += 1;
            let index = rng.random_range(0..backups.len());
            candidate = backups.swap_remove(index);
            report.replaced += 1;
        }
    }

    /// Use exactly the listed files, without scoring.
    pub fn select_manual(&self, catalog: &MediaCatalog, files: &[String]) -> EngineResult<Selection> {
        let mut selection = Selection::default();
        selection.report.requested = files.len();
        let mut seen = HashSet::new();

        for name in files {
            let reason = if MediaKind::from_path(Path::new(name)).is_none() {
                Some("unsupported format")
            } else {
                match catalog.find(name) {
                    Some(item) => {
                        if seen.insert(item.id) {
                            if item.is_video() {
                                selection.videos.push(item.clone());
                            } else {
                                selection.images.push(item.clone());
                            }
                        }
                        None
                    }
                    None => Some("not found"),
                }
            };

            if let Some(reason) = reason {
                warn!(file = %name, reason, "Dropping listed file");
                selection.report.dropped.push(DroppedFile {
                    name: name.clone(),
                    reason: reason.to_string(),
                });
            }
        }

        if selection.is_empty() {
            return Err(EngineError::insufficient(0, 1));
        }

        info!(
            images = selection.images.len(),
            videos = selection.videos.len(),
            dropped = selection.report.dropped.len(),
            "Using listed materials"
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::run_rng;
    use crate::scorer::MockQualityScorer;
    use reel_models::{MediaItem, ScoreResult};
    use std::sync::Arc;

    fn image(id: u32, name: &str) -> MediaRef {
        Arc::new(MediaItem::image(id, format!("/media/{}", name)))
    }

    fn video(id: u32, name: &str) -> MediaRef {
        Arc::new(MediaItem::video(id, format!("/media/{}", name), Some(20.0)))
    }

    fn accepting() -> MockQualityScorer {
        let mut scorer = MockQualityScorer::new();
        scorer
            .expect_score()
            .returning(|_| ScoreResult::from_parts(30.0, 40.0, 10.0, true));
        scorer
    }

    /// Rejects every file whose name starts with "bad".
    fn rejecting_bad() -> MockQualityScorer {
        let mut scorer = MockQualityScorer::new();
        scorer.expect_score().returning(|path| {
            let name = path.file_name().unwrap().to_string_lossy();
            if name.starts_with("bad") {
                ScoreResult::rejected("blurry")
            } else {
                ScoreResult::from_parts(30.0, 40.0, 10.0, true)
            }
        });
        scorer
    }

    #[test]
    fn test_count_small_pool_takes_everything() {
        let budget = SelectionBudget::default();
        let scorer = accepting();
        let selector = MaterialSelector::new(&budget, &scorer);
        let mut rng = run_rng(Some(1));

        assert_eq!(selector.selection_count(4, &mut rng).unwrap(), 4);
        assert_eq!(selector.selection_count(14, &mut rng).unwrap(), 14);
        assert!(matches!(
            selector.selection_count(0, &mut rng),
            Err(EngineError::InsufficientMaterials { .. })
        ));
    }

    #[test]
    fn test_count_large_pool_within_bounds() {
        let budget = SelectionBudget::default();
        let scorer = accepting();
        let selector = MaterialSelector::new(&budget, &scorer);
        let mut rng = run_rng(Some(2));

        for _ in 0..100 {
            let count = selector.selection_count(50, &mut rng).unwrap();
            assert!((15..=30).contains(&count));
            let count = selector.selection_count(20, &mut rng).unwrap();
            assert!((15..=20).contains(&count));
        }
    }

    #[test]
    fn test_count_below_viable_minimum_fails() {
        let budget = SelectionBudget {
            min_materials: 2,
            max_materials: 10,
            ..SelectionBudget::default()
        };
        let scorer = accepting();
        let selector = MaterialSelector::new(&budget, &scorer);
        let err = selector.selection_count(3, &mut run_rng(Some(3))).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientMaterials {
                available: 3,
                required: 5
            }
        ));
    }

    #[test]
    fn test_replacements_bounded_per_image() {
        let budget = SelectionBudget::default();
        let scorer = rejecting_bad();
        let selector = MaterialSelector::new(&budget, &scorer);

        let preliminary = vec![image(0, "bad0.jpg")];
        let unused: Vec<_> = (1..10).map(|i| image(i, &format!("bad{}.jpg", i))).collect();
        let selection = selector.gate(preliminary, unused, &mut run_rng(Some(4)));

        assert_eq!(selection.images.len(), 1);
        assert_eq!(selection.report.replaced, 3);
        assert_eq!(selection.report.rejected, 4);
        assert_eq!(selection.report.force_accepted, 1);
        // Examined candidates are not offered for backfill
        assert_eq!(selection.reserve_len(), 6);
        // The kept image is the last one examined, not the original
        assert_ne!(selection.images[0].id.0, 0);
    }

    #[test]
    fn test_accepted_replacement_is_kept() {
        let budget = SelectionBudget::default();
        let scorer = rejecting_bad();
        let selector = MaterialSelector::new(&budget, &scorer);

        let selection = selector.gate(
            vec![image(0, "bad0.jpg"), image(1, "ok1.jpg")],
            vec![image(2, "ok2.jpg")],
            &mut run_rng(Some(5)),
        );

        let ids: Vec<_> = selection.images.iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(selection.report.force_accepted, 0);
    }

    #[test]
    fn test_swaps_in_a_video_when_none_selected() {
        let budget = SelectionBudget::default();
        let scorer = accepting();
        let selector = MaterialSelector::new(&budget, &scorer);

        let selection = selector.gate(
            vec![image(0, "a.jpg"), image(1, "b.jpg")],
            vec![video(2, "v.mp4")],
            &mut run_rng(Some(6)),
        );

        assert_eq!(selection.videos.len(), 1);
        assert_eq!(selection.images.len(), 1);
        assert!(selection.report.video_swapped);
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_backfill_routes_by_kind() {
        let budget = SelectionBudget::default();
        let scorer = accepting();
        let selector = MaterialSelector::new(&budget, &scorer);

        let mut selection = selector.gate(
            vec![video(0, "v0.mp4")],
            vec![image(1, "a.jpg"), video(2, "v2.mp4")],
            &mut run_rng(Some(7)),
        );
        let videos = selection.backfill(5, &mut run_rng(Some(8)));

        assert_eq!(videos.len(), 1);
        assert_eq!(selection.images.len(), 1);
        assert_eq!(selection.videos.len(), 2);
        assert_eq!(selection.reserve_len(), 0);
        assert_eq!(selection.report.backfilled, 2);
    }

    #[test]
    fn test_manual_selection_skips_scoring() {
        let budget = SelectionBudget::default();
        let mut scorer = MockQualityScorer::new();
        scorer.expect_score().never();
        let selector = MaterialSelector::new(&budget, &scorer);

        let catalog = MediaCatalog::from_items([
            MediaItem::image(0, "/media/a.jpg"),
            MediaItem::video(1, "/media/videos/v.mp4", Some(30.0)),
        ]);
        let files = vec![
            "a.jpg".to_string(),
            "videos/v.mp4".to_string(),
            "a.jpg".to_string(),
            "missing.png".to_string(),
            "notes.txt".to_string(),
        ];

        let selection = selector.select_manual(&catalog, &files).unwrap();
        assert_eq!(selection.images.len(), 1);
        assert_eq!(selection.videos.len(), 1);
        assert_eq!(selection.report.dropped.len(), 2);
        assert_eq!(selection.report.dropped[1].reason, "unsupported format");
    }

    #[test]
    fn test_manual_selection_with_nothing_usable_fails() {
        let budget = SelectionBudget::default();
        let scorer = accepting();
        let selector = MaterialSelector::new(&budget, &scorer);
        let catalog = MediaCatalog::from_items([MediaItem::image(0, "/media/a.jpg")]);

        let result = selector.select_manual(&catalog, &["z.jpg".to_string()]);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientMaterials { .. })
        ));
    }
}
