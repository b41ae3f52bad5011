//! Timeline segments produced by the planners.

use serde::{Deserialize, Serialize};

use crate::media::MediaRef;
use crate::transition::TransitionEffect;

/// Tolerance used when comparing accumulated durations.
pub const DURATION_EPSILON: f64 = 1e-6;

/// What a segment shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    SingleImage {
        image: MediaRef,
    },
    Collage {
        images: Vec<MediaRef>,
    },
    /// Sub-interval `[start, end)` of a source video, in source seconds.
    VideoClip {
        source: MediaRef,
        start: f64,
        end: f64,
    },
    /// Blend from the tail of one neighbor into the head of the next.
    ///
    /// `outgoing` and `incoming` are the pieces trimmed off the neighbors.
    Transition {
        effect: TransitionEffect,
        outgoing: Box<Segment>,
        incoming: Box<Segment>,
    },
}

/// One timed unit of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(flatten)]
    pub kind: SegmentKind,
    /// Seconds this segment occupies on the output timeline
    pub duration: f64,
}

impl Segment {
    pub fn single(image: MediaRef, duration: f64) -> Self {
        Self {
            kind: SegmentKind::SingleImage { image },
            duration,
        }
    }

    /// Multi-image segment. A one-image group degrades to a single image.
    pub fn collage(mut images: Vec<MediaRef>, duration: f64) -> Self {
        if images.len() == 1 {
            if let Some(image) = images.pop() {
                return Self::single(image, duration);
            }
        }
        Self {
            kind: SegmentKind::Collage { images },
            duration,
        }
    }

    pub fn video_clip(source: MediaRef, start: f64, end: f64) -> Self {
        Self {
            kind: SegmentKind::VideoClip { source, start, end },
            duration: end - start,
        }
    }

    pub fn transition(
        effect: TransitionEffect,
        outgoing: Segment,
        incoming: Segment,
        duration: f64,
    ) -> Self {
        Self {
            kind: SegmentKind::Transition {
                effect,
                outgoing: Box::new(outgoing),
                incoming: Box::new(incoming),
            },
            duration,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self.kind, SegmentKind::Transition { .. })
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, SegmentKind::VideoClip { .. })
    }

    /// Media items shown by this segment, transition pieces included.
    pub fn members(&self) -> Vec<&MediaRef> {
        match &self.kind {
            SegmentKind::SingleImage { image } => vec![image],
            SegmentKind::Collage { images } => images.iter().collect(),
            SegmentKind::VideoClip { source, .. } => vec![source],
            SegmentKind::Transition {
                outgoing, incoming, ..
            } => {
                let mut members = outgoing.members();
                members.extend(incoming.members());
                members
            }
        }
    }

    /// Cut `length` seconds off the end of this segment and return them.
    pub fn split_tail(&mut self, length: f64) -> Segment {
        let length = length.clamp(0.0, self.duration);
        self.duration -= length;
        let kind = match &mut self.kind {
            SegmentKind::VideoClip { source, end, .. } => {
                let piece_end = *end;
                *end -= length;
                SegmentKind::VideoClip {
                    source: source.clone(),
                    start: *end,
                    end: piece_end,
                }
            }
            other => other.clone(),
        };
        Segment {
            kind,
            duration: length,
        }
    }

    /// Cut `length` seconds off the start of this segment and return them.
    pub fn split_head(&mut self, length: f64) -> Segment {
        let length = length.clamp(0.0, self.duration);
        self.duration -= length;
        let kind = match &mut self.kind {
            SegmentKind::VideoClip { source, start, .. } => {
                let piece_start = *start;
                *start += length;
                SegmentKind::VideoClip {
                    source: source.clone(),
                    start: piece_start,
                    end: *start,
                }
            }
            other => other.clone(),
        };
        Segment {
            kind,
            duration: length,
        }
    }
}

/// Sum of segment durations.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(|s| s.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaItem;
    use std::sync::Arc;

    fn video() -> MediaRef {
        Arc::new(MediaItem::video(1, "v.mp4", Some(30.0)))
    }

    #[test]
    fn test_split_video_tail_and_head() {
        let mut clip = Segment::video_clip(video(), 10.0, 20.0);

        let tail = clip.split_tail(2.0);
        assert!((clip.duration - 8.0).abs() < DURATION_EPSILON);
        match (&clip.kind, &tail.kind) {
            (
                SegmentKind::VideoClip { end, .. },
                SegmentKind::VideoClip { start: t0, end: t1, .. },
            ) => {
                assert!((end - 18.0).abs() < DURATION_EPSILON);
                assert!((t0 - 18.0).abs() < DURATION_EPSILON);
                assert!((t1 - 20.0).abs() < DURATION_EPSILON);
            }
            other => panic!("unexpected kinds: {:?}", other),
        }

        let head = clip.split_head(1.5);
        assert!((head.duration - 1.5).abs() < DURATION_EPSILON);
        assert!((clip.duration - 6.5).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_split_image_keeps_kind() {
        let image = Arc::new(MediaItem::image(2, "a.jpg"));
        let mut single = Segment::single(image.clone(), 4.0);
        let tail = single.split_tail(1.0);
        assert_eq!(tail.members(), vec![&image]);
        assert!((single.duration - 3.0).abs() < DURATION_EPSILON);
    }

    #[test]
    fn test_single_member_collage_is_single() {
        let image = Arc::new(MediaItem::image(2, "a.jpg"));
        let seg = Segment::collage(vec![image], 3.0);
        assert!(matches!(seg.kind, SegmentKind::SingleImage { .. }));
    }

    #[test]
    fn test_transition_members() {
        let a = Arc::new(MediaItem::image(1, "a.jpg"));
        let b = Arc::new(MediaItem::image(2, "b.jpg"));
        let t = Segment::transition(
            TransitionEffect::Fade,
            Segment::single(a, 0.5),
            Segment::single(b, 0.5),
            1.2,
        );
        assert!(t.is_transition());
        assert_eq!(t.members().len(), 2);
    }
}
