//! Carving sub-clips out of the selected videos.
//!
//! Phase 1 takes one clip from every usable video. Videos that are too short
//! or could not be probed are dropped and replaced through [`Backfill`].
//! Phase 2 then revisits sources with unused time and carves more clips from
//! their free gaps until the video budget is nearly used up.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use reel_models::{MediaRef, Segment, SelectionBudget, DURATION_EPSILON};

use crate::error::EngineError;
use crate::intervals::{FreeIntervalSet, Interval};
use crate::sampling::uniform;
use crate::selector::Backfill;

/// Carved clips and what was left out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoPlan {
    pub segments: Vec<Segment>,
    /// Sum of carved clip durations
    pub total: f64,
    #[serde(skip)]
    pub dropped: Vec<MediaRef>,
    /// Clips carved in the gap-fill pass
    pub gap_fill_clips: usize,
}

/// A source that may still yield clips, with its carved intervals.
struct OpenSource {
    source: MediaRef,
    intervals: FreeIntervalSet,
}

pub struct VideoSegmentPlanner<'a> {
    budget: &'a SelectionBudget,
    open: Vec<OpenSource>,
    plan: VideoPlan,
    budget_reached: bool,
}

impl<'a> VideoSegmentPlanner<'a> {
    pub fn new(budget: &'a SelectionBudget) -> Self {
        Self {
            budget,
            open: Vec::new(),
            plan: VideoPlan::default(),
            budget_reached: false,
        }
    }

    /// Run both phases over `videos`, asking `backfill` to replace drops.
    pub fn plan<B: Backfill, R: Rng + ?Sized>(
        mut self,
        videos: &[MediaRef],
        backfill: &mut B,
        rng: &mut R,
    ) -> VideoPlan {
        let mut pending = videos.to_vec();

        // Each round draws from a shrinking reserve, so this ends.
        while !pending.is_empty() {
            let dropped = self.carve_primary(&pending, rng);
            if dropped == 0 || self.budget_reached {
                break;
            }
            pending = backfill.backfill(dropped, rng);
        }

        self.fill_gaps(rng);
        self.finish()
    }

    /// Phase 1. Returns how many videos were dropped.
    fn carve_primary<R: Rng + ?Sized>(&mut self, videos: &[MediaRef], rng: &mut R) -> usize {
        let b = self.budget;
        let mut dropped = 0;

        for video in videos {
            let duration = match video.duration {
                Some(d) if d >= b.min_source_duration => d,
                Some(d) => {
                    info!(path = %video.path.display(), duration = d, "Video too short, dropping");
                    self.drop_video(video);
                    dropped += 1;
                    continue;
                }
                None => {
                    let err = EngineError::unreadable(&video.path, "duration could not be probed");
                    warn!(error = %err, "Dropping video");
                    self.drop_video(video);
                    dropped += 1;
                    continue;
                }
            };

            let (start, len) = if duration > b.max_clip_len {
                let len = uniform(rng, b.min_clip_len, b.max_clip_len);
                (uniform(rng, 0.0, duration - len), len)
            } else {
                (0.0, duration)
            };

            if self.plan.total + len > b.max_video_budget + DURATION_EPSILON {
                info!(
                    total = self.plan.total,
                    budget = b.max_video_budget,
                    "Video budget reached"
                );
                self.budget_reached = true;
                break;
            }

            let mut intervals = FreeIntervalSet::new(duration, b.min_gap);
            intervals.reserve(Interval::new(start, start + len));
            self.push_clip(video, start, len);

            if intervals.has_room(b.min_clip_len) {
                self.open.push(OpenSource {
                    source: video.clone(),
                    intervals,
                });
            } else {
                debug!(path = %video.path.display(), "Source fully used after first clip");
            }
        }

        dropped
    }

    /// Phase 2: carve more clips from free gaps while budget headroom remains.
    fn fill_gaps<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let b = self.budget;
        let floor = b.max_video_budget - b.min_clip_len;

        // Every pass either carves at least one clip or stops.
        while self.plan.total < floor && !self.open.is_empty() {
            let mut carved = false;

            'sources: for open in self.open.iter_mut() {
                for gap in open.intervals.gaps_at_least(b.min_clip_len) {
                    if self.plan.total >= floor {
                        break 'sources;
                    }
                    // Headroom is above min_clip_len here, so the clip never
                    // drops below the minimum length.
                    let headroom = b.max_video_budget - self.plan.total;
                    let len = uniform(rng, b.min_clip_len, b.max_clip_len)
                        .min(gap.len())
                        .min(headroom);
                    let start = uniform(rng, gap.start, gap.end - len);
                    if !open.intervals.reserve(Interval::new(start, start + len)) {
                        continue;
                    }

                    self.plan
                        .segments
                        .push(Segment::video_clip(open.source.clone(), start, start + len));
                    self.plan.total += len;
                    self.plan.gap_fill_clips += 1;
                    carved = true;
                }
            }

            // Release sources with no usable gap left
            self.open
                .retain(|open| open.intervals.has_room(b.min_clip_len));

            if !carved {
                break;
            }
        }
    }

    fn push_clip(&mut self, video: &MediaRef, start: f64, len: f64) {
        debug!(path = %video.path.display(), start, len, "Carved clip");
        self.plan
            .segments
            .push(Segment::video_clip(video.clone(), start, start + len));
        self.plan.total += len;
    }

    fn drop_video(&mut self, video: &MediaRef) {
        metrics::counter!("reel_videos_dropped_total").increment(1);
        self.plan.dropped.push(video.clone());
    }

    fn finish(mut self) -> VideoPlan {
        self.open.clear();
        info!(
            clips = self.plan.segments.len(),
            total = self.plan.total,
            dropped = self.plan.dropped.len(),
            "Video plan complete"
        );
        self.plan
    }
}
