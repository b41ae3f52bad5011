//! Transition effect catalog.
//!
//! Effects are named identifiers; how each one blends is looked up in
//! [`BLEND_TABLE`]. Names without an entry render as a plain cross-fade.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named transition effects that can be drawn for an adjacent segment pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEffect {
    Fade,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    PushLeft,
    PushRight,
    PushUp,
    PushDown,
    ZoomIn,
    ZoomOut,
    Crossfade,
    FadeInOut,
    SoftFade,
    DoubleFade,
    FadeZoom,
    FadeSlide,
    Dissolve,
    SoftDissolve,
    BlurFade,
    GentleSlide,
    SmoothPush,
    SoftWipe,
    FadeWipe,
    ElasticFade,
    BounceFade,
    ScaleFade,
    AlphaBlend,
    GradientFade,
    FeatherFade,
    SoftZoom,
    GentleMorph,
}

/// Every effect the scheduler may draw from.
pub const TRANSITION_CATALOG: &[TransitionEffect] = &[
    TransitionEffect::Fade,
    TransitionEffect::SlideLeft,
    TransitionEffect::SlideRight,
    TransitionEffect::SlideUp,
    TransitionEffect::SlideDown,
    TransitionEffect::PushLeft,
    TransitionEffect::PushRight,
    TransitionEffect::PushUp,
    TransitionEffect::PushDown,
    TransitionEffect::ZoomIn,
    TransitionEffect::ZoomOut,
    TransitionEffect::Crossfade,
    TransitionEffect::FadeInOut,
    TransitionEffect::SoftFade,
    TransitionEffect::DoubleFade,
    TransitionEffect::FadeZoom,
    TransitionEffect::FadeSlide,
    TransitionEffect::Dissolve,
    TransitionEffect::SoftDissolve,
    TransitionEffect::BlurFade,
    TransitionEffect::GentleSlide,
    TransitionEffect::SmoothPush,
    TransitionEffect::SoftWipe,
    TransitionEffect::FadeWipe,
    TransitionEffect::ElasticFade,
    TransitionEffect::BounceFade,
    TransitionEffect::ScaleFade,
    TransitionEffect::AlphaBlend,
    TransitionEffect::GradientFade,
    TransitionEffect::FeatherFade,
    TransitionEffect::SoftZoom,
    TransitionEffect::GentleMorph,
];

/// Closed set of blend behaviors a renderer has to implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlendBehavior {
    CrossFade,
    Dissolve,
    FadeThroughBlack,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    SmoothLeft,
    SmoothRight,
    ZoomIn,
    Wipe,
    Blur,
}

impl BlendBehavior {
    /// Behavior used for effects missing from [`BLEND_TABLE`].
    pub const FALLBACK: BlendBehavior = BlendBehavior::CrossFade;

    /// FFmpeg `xfade` transition name.
    pub fn xfade_name(&self) -> &'static str {
        match self {
            BlendBehavior::CrossFade => "fade",
            BlendBehavior::Dissolve => "dissolve",
            BlendBehavior::FadeThroughBlack => "fadeblack",
            BlendBehavior::SlideLeft => "slideleft",
            BlendBehavior::SlideRight => "slideright",
            BlendBehavior::SlideUp => "slideup",
            BlendBehavior::SlideDown => "slidedown",
            BlendBehavior::SmoothLeft => "smoothleft",
            BlendBehavior::SmoothRight => "smoothright",
            BlendBehavior::ZoomIn => "zoomin",
            BlendBehavior::Wipe => "wipeleft",
            BlendBehavior::Blur => "hblur",
        }
    }
}

/// Effect to blend mapping. Effects not listed fall back to [`BlendBehavior::FALLBACK`].
pub const BLEND_TABLE: &[(TransitionEffect, BlendBehavior)] = &[
    (TransitionEffect::Fade, BlendBehavior::CrossFade),
    (TransitionEffect::Crossfade, BlendBehavior::CrossFade),
    (TransitionEffect::SoftFade, BlendBehavior::CrossFade),
    (TransitionEffect::FadeInOut, BlendBehavior::FadeThroughBlack),
    (TransitionEffect::DoubleFade, BlendBehavior::FadeThroughBlack),
    (TransitionEffect::SlideLeft, BlendBehavior::SlideLeft),
    (TransitionEffect::SlideRight, BlendBehavior::SlideRight),
    (TransitionEffect::SlideUp, BlendBehavior::SlideUp),
    (TransitionEffect::SlideDown, BlendBehavior::SlideDown),
    (TransitionEffect::FadeSlide, BlendBehavior::SlideLeft),
    (TransitionEffect::PushLeft, BlendBehavior::SmoothLeft),
    (TransitionEffect::PushRight, BlendBehavior::SmoothRight),
    (TransitionEffect::SmoothPush, BlendBehavior::SmoothLeft),
    (TransitionEffect::GentleSlide, BlendBehavior::SmoothRight),
    (TransitionEffect::ZoomIn, BlendBehavior::ZoomIn),
    (TransitionEffect::ZoomOut, BlendBehavior::ZoomIn),
    (TransitionEffect::FadeZoom, BlendBehavior::ZoomIn),
    (TransitionEffect::SoftZoom, BlendBehavior::ZoomIn),
    (TransitionEffect::Dissolve, BlendBehavior::Dissolve),
    (TransitionEffect::SoftDissolve, BlendBehavior::Dissolve),
    (TransitionEffect::AlphaBlend, BlendBehavior::Dissolve),
    (TransitionEffect::SoftWipe, BlendBehavior::Wipe),
    (TransitionEffect::FadeWipe, BlendBehavior::Wipe),
    (TransitionEffect::BlurFade, BlendBehavior::Blur),
    (TransitionEffect::FeatherFade, BlendBehavior::Blur),
];

impl TransitionEffect {
    /// Blend behavior for this effect, falling back to a cross-fade.
    pub fn blend(&self) -> BlendBehavior {
        BLEND_TABLE
            .iter()
            .find(|(effect, _)| effect == self)
            .map(|(_, blend)| *blend)
            .unwrap_or(BlendBehavior::FALLBACK)
    }

    /// Whether the effect has its own entry in the blend table.
    pub fn is_mapped(&self) -> bool {
        BLEND_TABLE.iter().any(|(effect, _)| effect == self)
    }
}

impl fmt::Display for TransitionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde names double as display names
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => f.write_str(&name),
            _ => write!(f, "{:?}", self),
        }
    }
}
