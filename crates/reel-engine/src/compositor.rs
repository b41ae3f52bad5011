//! Turning an image group into a timed segment.

use reel_models::{MediaRef, Resolution, Segment};

/// Builds the segment shown for a group of images.
///
/// The returned segment must last exactly `duration` seconds. Layout and
/// cropping are the renderer's concern.
pub trait Compositor: Send + Sync {
    fn compose(&self, images: &[MediaRef], duration: f64, resolution: Resolution) -> Segment;
}

/// Grid collage, laid out by the FFmpeg backend at render time.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridCompositor;

impl Compositor for GridCompositor {
    fn compose(&self, images: &[MediaRef], duration: f64, _resolution: Resolution) -> Segment {
        Segment::collage(images.to_vec(), duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{MediaItem, SegmentKind};
    use std::sync::Arc;

    #[test]
    fn test_group_sizes() {
        let images: Vec<MediaRef> = (0..3)
            .map(|i| Arc::new(MediaItem::image(i, format!("{}.jpg", i))))
            .collect();

        let single = GridCompositor.compose(&images[..1], 4.0, Resolution::Square);
        assert!(matches!(single.kind, SegmentKind::SingleImage { .. }));

        let collage = GridCompositor.compose(&images, 2.5, Resolution::Vertical);
        assert_eq!(collage.duration, 2.5);
        assert_eq!(collage.members().len(), 3);
    }
}
