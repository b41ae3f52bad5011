//! Spreading the image budget over the selected images.
//!
//! Three regimes, chosen by the average time per image:
//! - between the min and max group duration: one single per image;
//! - above the max: singles at the max, leftovers folded into a collage;
//! - below the min (dense): a randomized grouping pass that opens with a
//!   few forced singles and keeps enough time in hand for the images still
//!   waiting, then shuffles the group order.
//!
//! Every image lands in exactly one segment and the durations always sum to
//! the budget.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use reel_models::{ImagePacing, MediaRef, Resolution, Segment, DURATION_EPSILON};

use crate::compositor::Compositor;
use crate::sampling::{take_random, uniform};

pub struct ImageSequencePlanner<'a> {
    pacing: &'a ImagePacing,
    compositor: &'a dyn Compositor,
    resolution: Resolution,
}

/// Size and duration of the next dense-branch group.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GroupDraw {
    size: usize,
    duration: f64,
}

impl<'a> ImageSequencePlanner<'a> {
    pub fn new(
        pacing: &'a ImagePacing,
        compositor: &'a dyn Compositor,
        resolution: Resolution,
    ) -> Self {
        Self {
            pacing,
            compositor,
            resolution,
        }
    }

    /// Segments covering `images` that together last exactly `budget` seconds.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        images: &[MediaRef],
        budget: f64,
        rng: &mut R,
    ) -> Vec<Segment> {
        if images.is_empty() || budget <= 0.0 {
            return Vec::new();
        }

        let p = self.pacing;
        let per_image = budget / images.len() as f64;
        debug!(images = images.len(), budget, per_image, "Planning image segments");

        if per_image > p.max_group_duration + DURATION_EPSILON {
            self.plan_sparse(images, budget)
        } else if per_image + DURATION_EPSILON >= p.min_group_duration {
            images
                .iter()
                .map(|image| Segment::single(image.clone(), per_image))
                .collect()
        } else {
            self.plan_dense(images, budget, rng)
        }
    }

    /// Singles at the max duration, remainder folded into the tail.
    fn plan_sparse(&self, images: &[MediaRef], budget: f64) -> Vec<Segment> {
        let p = self.pacing;
        let single_count = ((budget / p.max_group_duration).floor() as usize)
            .clamp(1, images.len());
        let (singles, leftover_images) = images.split_at(single_count);
        let leftover_time = budget - single_count as f64 * p.max_group_duration;

        let mut segments: Vec<Segment> = singles
            .iter()
            .map(|image| Segment::single(image.clone(), p.max_group_duration))
            .collect();

        if !leftover_images.is_empty() {
            if leftover_time + DURATION_EPSILON >= p.min_collage_leftover {
                segments.push(self.compose(leftover_images, leftover_time));
            } else if let Some(last) = segments.pop() {
                let mut group = last.members().into_iter().cloned().collect::<Vec<_>>();
                group.extend(leftover_images.iter().cloned());
                segments.push(self.compose(&group, last.duration + leftover_time));
            }
        } else if leftover_time > DURATION_EPSILON {
            if let Some(last) = segments.last_mut() {
                last.duration += leftover_time;
            }
        }

        segments
    }

    fn plan_dense<R: Rng + ?Sized>(
        &self,
        images: &[MediaRef],
        budget: f64,
        rng: &mut R,
    ) -> Vec<Segment> {
        let p = self.pacing;
        let mut remaining = images.to_vec();
        let mut time_left = budget;
        let mut groups = Vec::new();

        while !remaining.is_empty() {
            let left = remaining.len();
            let step = groups.len();

            let forced = if left > 1 && step < p.forced_singles {
                self.forced_single(left, time_left, step, rng)
            } else {
                None
            };
            let draw = match forced {
                Some(draw) => draw,
                None if left == 1 || time_left <= p.max_group_duration + DURATION_EPSILON => {
                    GroupDraw {
                        size: left,
                        duration: time_left,
                    }
                }
                None => self.free_group(left, time_left, rng),
            };

            let members = take_random(&mut remaining, draw.size, rng);
            groups.push(self.compose(&members, draw.duration));
            time_left -= draw.duration;
        }

        groups.shuffle(rng);
        groups
    }

    /// A single image that leaves time for the singles still owed and a
    /// final group. `None` when no such duration exists.
    fn forced_single<R: Rng + ?Sized>(
        &self,
        left: usize,
        time_left: f64,
        step: usize,
        rng: &mut R,
    ) -> Option<GroupDraw> {
        let p = self.pacing;
        let singles_after = (p.forced_singles - step - 1).min(left - 1);
        let rest = left - 1 - singles_after;
        let reserve = singles_after as f64 * p.min_group_duration
            + if rest > 0 { p.lookahead_floor } else { 0.0 };

        let lo = p
            .min_group_duration
            .max(time_left - p.max_group_duration * (left - 1) as f64);
        let hi = p.max_group_duration.min(time_left - reserve);
        if lo > hi + DURATION_EPSILON {
            return None;
        }

        Some(GroupDraw {
            size: 1,
            duration: uniform(rng, lo, hi),
        })
    }

    fn free_group<R: Rng + ?Sized>(&self, left: usize, time_left: f64, rng: &mut R) -> GroupDraw {
        let p = self.pacing;

        let lo = p
            .min_group_duration
            .max(time_left - p.max_group_duration * (left - 1) as f64);
        let hi = p.max_group_duration.min(time_left);
        let mut duration = if lo > hi { hi } else { uniform(rng, lo, hi) };

        let max_size = p.max_group_size.min(left - 1).max(1);
        let mut size = rng.random_range(1..=max_size);

        // Grow the group while the images after it would be starved.
        while size < left && time_left - duration < p.lookahead_floor * (left - size) as f64 {
            size += 1;
        }
        if size == left {
            duration = time_left;
        } else {
            // Shrink it while the images after it could not absorb the time.
            while size > 1 && time_left - duration > p.max_group_duration * (left - size) as f64 {
                size -= 1;
            }
        }

        GroupDraw { size, duration }
    }

    fn compose(&self, images: &[MediaRef], duration: f64) -> Segment {
        self.compositor.compose(images, duration, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::GridCompositor;
    use crate::sampling::run_rng;
    use reel_models::{MediaItem, SegmentKind};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn images(n: u32) -> Vec<MediaRef> {
        (0..n)
            .map(|i| Arc::new(MediaItem::image(i, format!("/media/{}.jpg", i))))
            .collect()
    }

    fn assert_covers(segments: &[Segment], images: &[MediaRef], budget: f64) {
        let members: Vec<u32> = segments
            .iter()
            .flat_map(|s| s.members().into_iter().map(|m| m.id.0))
            .collect();
        let unique: HashSet<u32> = members.iter().copied().collect();
        assert_eq!(members.len(), images.len(), "an image appears twice");
        assert_eq!(unique.len(), images.len(), "an image is missing");

        let total: f64 = segments.iter().map(|s| s.duration).sum();
        assert!((total - budget).abs() < 1e-6, "total {} != {}", total, budget);
        assert!(segments.iter().all(|s| s.duration > 0.0));
    }

    fn planner(pacing: &ImagePacing) -> ImageSequencePlanner<'_> {
        ImageSequencePlanner::new(pacing, &GridCompositor, Resolution::Horizontal)
    }

    #[test]
    fn test_even_singles() {
        let pacing = ImagePacing::default();
        let set = images(8);
        let segments = planner(&pacing).plan(&set, 32.0, &mut run_rng(Some(1)));
        assert_eq!(segments.len(), 8);
        assert!(segments.iter().all(|s| (s.duration - 4.0).abs() < 1e-9));
        assert_covers(&segments, &set, 32.0);
    }

    #[test]
    fn test_sparse_extends_last_single() {
        let pacing = ImagePacing::default();
        let set = images(3);
        let segments = planner(&pacing).plan(&set, 17.0, &mut run_rng(Some(1)));
        assert_eq!(segments.len(), 3);
        assert!((segments[2].duration - 7.0).abs() < 1e-9);
        assert_covers(&segments, &set, 17.0);
    }

    #[test]
    fn test_exact_max_pacing_is_singles() {
        let pacing = ImagePacing::default();
        let set = images(4);
        let segments = planner(&pacing).plan(&set, 20.0, &mut run_rng(Some(1)));
        assert_eq!(segments.len(), 4);
        assert_covers(&segments, &set, 20.0);
    }

    #[test]
    fn test_scenario_c_dense_opens_with_singles() {
        let pacing = ImagePacing::default();
        let set = images(5);
        let compositor = GridCompositor;
        let planner = ImageSequencePlanner::new(&pacing, &compositor, Resolution::Horizontal);

        for seed in 0..300 {
            let mut rng = run_rng(Some(seed));
            let segments = planner.plan(&set, 12.0, &mut rng);
            assert_covers(&segments, &set, 12.0);

            let singles = segments
                .iter()
                .filter(|s| matches!(s.kind, SegmentKind::SingleImage { .. }))
                .count();
            assert!(singles >= 3, "seed {}: {} singles", seed, singles);
        }
    }

    #[test]
    fn test_dense_covers_many_images() {
        let pacing = ImagePacing::default();
        for (n, budget) in [(20u32, 13.0), (12, 30.0), (30, 44.0), (6, 13.0), (2, 5.5)] {
            let set = images(n);
            for seed in 0..100 {
                let segments = planner(&pacing).plan(&set, budget, &mut run_rng(Some(seed)));
                assert_covers(&segments, &set, budget);
            }
        }
    }

    #[test]
    fn test_dense_groups_respect_size_cap_before_final() {
        let pacing = ImagePacing::default();
        let set = images(12);
        let segments = planner(&pacing).plan(&set, 30.0, &mut run_rng(Some(42)));
        let oversized = segments
            .iter()
            .filter(|s| s.members().len() > pacing.max_group_size)
            .count();
        assert!(oversized <= 1);
    }

    /// Every non-final free group leaves the floor per waiting image.
    #[test]
    fn test_free_group_keeps_lookahead_floor() {
        let pacing = ImagePacing::default();
        let planner = planner(&pacing);

        for left in 2..=30usize {
            for step in 0..=190 {
                let time_left = 5.5 + step as f64 * 0.5;
                for seed in 0..10 {
                    let draw = planner.free_group(left, time_left, &mut run_rng(Some(seed)));
                    let state = format!("left {} time {} seed {}", left, time_left, seed);

                    assert!(draw.size >= 1 && draw.size <= left, "{}", state);
                    assert!(draw.duration > 0.0, "{}", state);
                    assert!(draw.duration <= time_left + 1e-9, "{}", state);
                    if draw.size < left {
                        let after = time_left - draw.duration;
                        let waiting = (left - draw.size) as f64;
                        assert!(
                            after + 1e-9 >= pacing.lookahead_floor * waiting,
                            "{}: {:.3}s for {} images",
                            state,
                            after,
                            waiting
                        );
                    } else {
                        assert!((draw.duration - time_left).abs() < 1e-9, "{}", state);
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let pacing = ImagePacing::default();
        assert!(planner(&pacing)
            .plan(&[], 20.0, &mut run_rng(Some(1)))
            .is_empty());
    }
}
