//! Per-video bookkeeping of carved time.
//!
//! [`FreeIntervalSet`] keeps the intervals already carved from one source as
//! a sorted, disjoint list where neighbors are at least `min_gap` apart. Free
//! time is always derived as the complement of that list.

use reel_models::DURATION_EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= DURATION_EPSILON
    }

    fn contains(&self, other: &Interval) -> bool {
        other.start >= self.start - DURATION_EPSILON && other.end <= self.end + DURATION_EPSILON
    }
}

#[derive(Debug, Clone)]
pub struct FreeIntervalSet {
    duration: f64,
    min_gap: f64,
    used: Vec<Interval>,
}

impl FreeIntervalSet {
    pub fn new(duration: f64, min_gap: f64) -> Self {
        Self {
            duration,
            min_gap,
            used: Vec::new(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn used(&self) -> &[Interval] {
        &self.used
    }

    pub fn used_total(&self) -> f64 {
        self.used.iter().map(Interval::len).sum()
    }

    /// Free gaps, keeping `min_gap` clear on each side of every used interval.
    pub fn free(&self) -> Vec<Interval> {
        let mut free = Vec::with_capacity(self.used.len() + 1);
        let mut cursor = 0.0_f64;

        for used in &self.used {
            let gap_end = used.start - self.min_gap;
            if gap_end > cursor {
                free.push(Interval::new(cursor, gap_end));
            }
            cursor = cursor.max(used.end + self.min_gap);
        }
        if cursor < self.duration {
            free.push(Interval::new(cursor, self.duration));
        }

        free.retain(|gap| !gap.is_empty());
        free
    }

    /// Free gaps at least `min_len` long.
    pub fn gaps_at_least(&self, min_len: f64) -> Vec<Interval> {
        self.free()
            .into_iter()
            .filter(|gap| gap.len() + DURATION_EPSILON >= min_len)
            .collect()
    }

    pub fn has_room(&self, min_len: f64) -> bool {
        !self.gaps_at_least(min_len).is_empty()
    }

    /// Record `interval` as carved.
    ///
    /// Returns `false`, leaving the set unchanged, when the interval does not
    /// lie inside a single free gap.
    pub fn reserve(&mut self, interval: Interval) -> bool {
        if interval.is_empty() || !self.free().iter().any(|gap| gap.contains(&interval)) {
            return false;
        }
        let at = self.used.partition_point(|u| u.start < interval.start);
        self.used.insert(at, interval);
        true
    }
}
