//! Transition insertion between adjacent segments.
//!
//! Each pair gets a transition with a fixed probability. A transition trims
//! an overlap window off the tail of the left neighbor and the head of the
//! right one and replays both pieces blended. The running timeline total
//! must stay under the hard cap; the first transition that would break it
//! ends insertion for the rest of the sequence.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use reel_models::segment::total_duration;
use reel_models::{
    Segment, TransitionEffect, TransitionSettings, DURATION_EPSILON, TRANSITION_CATALOG,
};

use crate::sampling::uniform;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransitionReport {
    pub inserted: usize,
    /// Drawn but skipped because a neighbor was too short to overlap
    pub skipped_short: usize,
    /// Index of the pair at which the duration cap stopped insertion
    pub capped_at: Option<usize>,
    /// Timeline total after insertion, reserved time included
    pub running_total: f64,
}

pub struct TransitionScheduler<'a> {
    settings: &'a TransitionSettings,
    max_total: f64,
}

impl<'a> TransitionScheduler<'a> {
    pub fn new(settings: &'a TransitionSettings, max_total: f64) -> Self {
        Self {
            settings,
            max_total,
        }
    }

    /// Insert transitions into `segments`.
    ///
    /// `reserved` is time outside the segment list that still counts toward
    /// the cap, such as the outro.
    pub fn schedule<R: Rng + ?Sized>(
        &self,
        segments: Vec<Segment>,
        reserved: f64,
        rng: &mut R,
    ) -> (Vec<Segment>, TransitionReport) {
        let s = self.settings;
        let mut report = TransitionReport {
            running_total: total_duration(&segments) + reserved,
            ..TransitionReport::default()
        };

        let mut out: Vec<Segment> = Vec::with_capacity(segments.len() * 2);
        for (pair, mut next) in segments.into_iter().enumerate() {
            // `pair` is the index of the right-hand segment
            let Some(prev_duration) = out.last().map(|prev| prev.duration) else {
                out.push(next);
                continue;
            };
            if report.capped_at.is_some() || !rng.random_bool(s.probability) {
                out.push(next);
                continue;
            }

            let duration = uniform(rng, s.min_duration, s.max_duration);
            let effect = TRANSITION_CATALOG
                .choose(rng)
                .copied()
                .unwrap_or(TransitionEffect::Crossfade);

            if report.running_total + duration > self.max_total + DURATION_EPSILON {
                info!(
                    pair,
                    running_total = report.running_total,
                    max_total = self.max_total,
                    "Transition cap reached, no further transitions"
                );
                report.capped_at = Some(pair);
                out.push(next);
                continue;
            }

            let overlap = duration
                .min(s.overlap_share * prev_duration)
                .min(s.overlap_share * next.duration);
            if overlap < s.min_overlap {
                report.skipped_short += 1;
                out.push(next);
                continue;
            }

            if let Some(prev) = out.last_mut() {
                let outgoing = prev.split_tail(overlap);
                let incoming = next.split_head(overlap);
                debug!(%effect, duration, overlap, "Inserting transition");
                out.push(Segment::transition(effect, outgoing, incoming, duration));
                report.running_total += duration - 2.0 * overlap;
                report.inserted += 1;
            }
            out.push(next);
        }

        metrics::counter!("reel_transitions_inserted_total").increment(report.inserted as u64);
        info!(
            inserted = report.inserted,
            skipped = report.skipped_short,
            total = report.running_total,
            "Transitions scheduled"
        );
        (out, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::run_rng;
    use reel_models::{MediaItem, SegmentKind};
    use std::sync::Arc;

    fn singles(n: u32, duration: f64) -> Vec<Segment> {
        (0..n)
            .map(|i| {
                Segment::single(
                    Arc::new(MediaItem::image(i, format!("/media/{}.jpg", i))),
                    duration,
                )
            })
            .collect()
    }

    fn always() -> TransitionSettings {
        TransitionSettings {
            probability: 1.0,
            ..TransitionSettings::default()
        }
    }

    #[test]
    fn test_total_tracks_trimmed_neighbors() {
        let settings = always();
        let scheduler = TransitionScheduler::new(&settings, 1000.0);
        let input = singles(6, 4.0);
        let (out, report) = scheduler.schedule(input, 5.0, &mut run_rng(Some(1)));

        assert_eq!(report.inserted, 5);
        assert_eq!(out.len(), 11);
        let total = total_duration(&out) + 5.0;
        assert!((total - report.running_total).abs() < 1e-6);
        // Transitions alternate with content
        for (i, segment) in out.iter().enumerate() {
            assert_eq!(segment.is_transition(), i % 2 == 1);
        }
    }

    #[test]
    fn test_overlap_bounded_by_neighbor_share() {
        let settings = always();
        let scheduler = TransitionScheduler::new(&settings, 1000.0);
        let (out, _) = scheduler.schedule(singles(2, 3.0), 0.0, &mut run_rng(Some(2)));

        match &out[1].kind {
            SegmentKind::Transition {
                outgoing, incoming, ..
            } => {
                assert!(outgoing.duration <= 0.9 + 1e-9);
                assert!(incoming.duration <= 0.9 + 1e-9);
            }
            other => panic!("expected a transition, got {:?}", other),
        }
        assert!(out[0].duration >= 2.1 - 1e-9);
    }

    #[test]
    fn test_cap_stops_all_later_pairs() {
        let settings = always();
        // Content is 40s plus 5s reserved; one transition can add up to 2.5s
        let scheduler = TransitionScheduler::new(&settings, 46.0);
        for seed in 0..100 {
            let (out, report) =
                scheduler.schedule(singles(10, 4.0), 5.0, &mut run_rng(Some(seed)));
            assert!(report.running_total <= 46.0 + 1e-6, "seed {}", seed);

            if let Some(pair) = report.capped_at {
                let after_cap = out
                    .iter()
                    .skip_while(|s| !s.members().iter().any(|m| m.id.0 as usize == pair))
                    .filter(|s| s.is_transition())
                    .count();
                assert_eq!(after_cap, 0, "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_short_neighbors_skipped() {
        let settings = always();
        let scheduler = TransitionScheduler::new(&settings, 1000.0);
        let (out, report) = scheduler.schedule(singles(3, 0.2), 0.0, &mut run_rng(Some(3)));
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped_short, 2);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_zero_probability_leaves_sequence_alone() {
        let settings = TransitionSettings {
            probability: 0.0,
            ..TransitionSettings::default()
        };
        let scheduler = TransitionScheduler::new(&settings, 100.0);
        let input = singles(5, 4.0);
        let (out, report) = scheduler.schedule(input.clone(), 0.0, &mut run_rng(Some(4)));
        assert_eq!(out, input);
        assert_eq!(report.inserted, 0);
    }
}
