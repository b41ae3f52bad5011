//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "faster";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default video bitrate
pub const DEFAULT_VIDEO_BITRATE: &str = "12M";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "256k";
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default encoder thread count
pub const DEFAULT_THREADS: u32 = 44;
/// Default pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// NVENC settings used by [`EncodingConfig::with_nvenc`].
pub const NVENC_CODEC: &str = "h264_nvenc";
pub const NVENC_PRESET: &str = "p4";
pub const NVENC_CQ: u8 = 20;
pub const NVENC_VIDEO_BITRATE: &str = "6M";

/// Preview GIF settings
pub const PREVIEW_SCALE_WIDTH: u32 = 320;
pub const PREVIEW_FPS: u32 = 8;
pub const PREVIEW_MAX_SECONDS: f64 = 3.0;

/// Codec configuration handed to the rendering backend.
///
/// The engine never interprets these values; they are passed through to the
/// encoder as recognized options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "faster", "medium", "p4")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Target video bitrate
    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: String,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Encoder thread count
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Use hardware acceleration (NVENC)
    #[serde(default)]
    pub use_nvenc: bool,

    /// Move the moov atom to the front for progressive playback
    #[serde(default = "default_faststart")]
    pub faststart: bool,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_video_bitrate() -> String {
    DEFAULT_VIDEO_BITRATE.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_threads() -> u32 {
    DEFAULT_THREADS
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_faststart() -> bool {
    true
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            crf: DEFAULT_CRF,
            video_bitrate: default_video_bitrate(),
            fps: DEFAULT_FPS,
            threads: DEFAULT_THREADS,
            pixel_format: default_pixel_format(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            use_nvenc: false,
            faststart: true,
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with a different thread count.
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Enable NVENC hardware acceleration.
    pub fn with_nvenc(mut self) -> Self {
        self.use_nvenc = true;
        self.codec = NVENC_CODEC.to_string();
        self.preset = NVENC_PRESET.to_string();
        self.crf = NVENC_CQ;
        self.video_bitrate = NVENC_VIDEO_BITRATE.to_string();
        self
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];

        // CRF is not used with NVENC, use -cq instead
        if self.use_nvenc {
            args.extend_from_slice(&["-cq".to_string(), self.crf.to_string()]);
        } else {
            args.extend_from_slice(&["-crf".to_string(), self.crf.to_string()]);
        }

        args.extend_from_slice(&[
            "-b:v".to_string(),
            self.video_bitrate.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ]);

        if self.threads > 0 {
            args.extend_from_slice(&["-threads".to_string(), self.threads.to_string()]);
        }

        args.extend_from_slice(&[
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]);

        if self.faststart {
            args.extend_from_slice(&["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend(self.extra_args.clone());

        args
    }
}
