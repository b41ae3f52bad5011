//! Translation of a [`Timeline`] into one FFmpeg filter graph.

use std::path::Path;

use reel_models::{AudioBed, AudioFit, EncodingConfig, OutroClip, Segment, SegmentKind, Timeline};

use crate::command::{FfmpegCommand, FfmpegInput};
use crate::error::{MediaError, MediaResult};
use crate::filters;

/// Graphs longer than this are passed through `-filter_complex_script`.
pub const MAX_INLINE_GRAPH_LEN: usize = 8 * 1024;

/// Index of an opened FFmpeg input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputHandle(pub usize);

/// Accumulates inputs and filter chains for one render.
#[derive(Debug)]
pub struct RenderGraph {
    width: u32,
    height: u32,
    fps: u32,
    inputs: Vec<FfmpegInput>,
    chains: Vec<String>,
    next_label: usize,
}

/// Everything needed to build the final command.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub inputs: Vec<FfmpegInput>,
    pub filter_graph: String,
    pub video_label: String,
    pub audio_label: Option<String>,
    /// Seconds, outro included
    pub total_duration: f64,
}

impl RenderGraph {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            inputs: Vec::new(),
            chains: Vec::new(),
            next_label: 0,
        }
    }

    /// Build the graph for a whole timeline.
    pub fn build(timeline: &Timeline, encoding: &EncodingConfig) -> MediaResult<RenderPlan> {
        if timeline.segments.is_empty() && timeline.outro.is_none() {
            return Err(MediaError::invalid_timeline("timeline has no segments"));
        }

        let (width, height) = timeline.resolution.dimensions();
        let mut graph = Self::new(width, height, encoding.fps);

        let mut labels = Vec::with_capacity(timeline.segments.len() + 1);
        for segment in &timeline.segments {
            labels.push(graph.add_segment(segment)?);
        }
        if let Some(outro) = &timeline.outro {
            labels.push(graph.add_outro(outro));
        }

        let video_label = graph.label("vout");
        graph.chains.push(format!(
            "{}{}{}",
            labels.concat(),
            filters::concat_video(labels.len()),
            video_label
        ));

        let audio_label = timeline.audio.as_ref().map(|bed| graph.add_audio(bed));

        Ok(RenderPlan {
            inputs: graph.inputs,
            filter_graph: graph.chains.join(";\n"),
            video_label,
            audio_label,
            total_duration: timeline.total_duration(),
        })
    }

    /// Register a bounded read of `path` between `start` and `end` seconds.
    pub fn open_segment(&mut self, path: &Path, start: f64, end: f64) -> InputHandle {
        self.push_input(
            vec![
                "-ss".to_string(),
                format!("{:.3}", start),
                "-t".to_string(),
                format!("{:.3}", (end - start).max(0.0)),
            ],
            path,
        )
    }

    /// Register a still image looped for `seconds`.
    pub fn open_still(&mut self, path: &Path, seconds: f64) -> InputHandle {
        self.push_input(
            vec![
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                self.fps.to_string(),
                "-t".to_string(),
                format!("{:.3}", seconds),
            ],
            path,
        )
    }

    /// Register an audio track, repeated `loops` extra times.
    pub fn open_audio(&mut self, path: &Path, loops: u32) -> InputHandle {
        let args = if loops > 0 {
            vec!["-stream_loop".to_string(), loops.to_string()]
        } else {
            Vec::new()
        };
        self.push_input(args, path)
    }

    fn push_input(&mut self, args: Vec<String>, path: &Path) -> InputHandle {
        self.inputs.push(FfmpegInput {
            args,
            path: path.to_path_buf(),
        });
        InputHandle(self.inputs.len() - 1)
    }

    fn label(&mut self, prefix: &str) -> String {
        self.next_label += 1;
        format!("[{}{}]", prefix, self.next_label)
    }

    /// Add one segment; returns the label of its normalized video stream.
    pub fn add_segment(&mut self, segment: &Segment) -> MediaResult<String> {
        let duration = segment.duration;
        if duration.is_nan() || duration <= 0.0 {
            return Err(MediaError::invalid_timeline(format!(
                "segment with non-positive duration {:.3}",
                duration
            )));
        }

        let fill = filters::fill_frame(self.width, self.height, self.fps);

        let label = match &segment.kind {
            SegmentKind::SingleImage { image } => {
                let input = self.open_still(&image.path, duration);
                let out = self.label("v");
                self.chains.push(format!(
                    "[{}:v]{},{}{}",
                    input.0,
                    fill,
                    filters::trim_to(duration),
                    out
                ));
                out
            }
            SegmentKind::Collage { images } => self.add_collage(images, duration),
            SegmentKind::VideoClip { source, start, end } => {
                let input = self.open_segment(&source.path, *start, *end);
                let out = self.label("v");
                self.chains.push(format!(
                    "[{}:v]{},{}{}",
                    input.0,
                    fill,
                    filters::trim_to(duration),
                    out
                ));
                out
            }
            SegmentKind::Transition {
                effect,
                outgoing,
                incoming,
            } => {
                let from = self.add_segment(outgoing)?;
                let to = self.add_segment(incoming)?;
                let held_from = self.label("t");
                let held_to = self.label("t");
                self.chains.push(format!(
                    "{}{}{}",
                    from,
                    filters::hold_last_frame((duration - outgoing.duration).max(0.0)),
                    held_from
                ));
                self.chains.push(format!(
                    "{}{}{}",
                    to,
                    filters::hold_first_frame((duration - incoming.duration).max(0.0)),
                    held_to
                ));
                let out = self.label("v");
                self.chains.push(format!(
                    "{}{}{},{}{}",
                    held_from,
                    held_to,
                    filters::blend(effect.blend(), duration),
                    filters::trim_to(duration),
                    out
                ));
                out
            }
        };

        Ok(label)
    }

    fn add_collage(&mut self, images: &[reel_models::MediaRef], duration: f64) -> String {
        let cells = filters::collage_layout(images.len(), self.width, self.height);

        let mut canvas = self.label("bg");
        self.chains.push(format!(
            "{}{}",
            filters::background(self.width, self.height, self.fps, duration),
            canvas
        ));

        for (image, cell) in images.iter().zip(&cells) {
            let input = self.open_still(&image.path, duration);
            let tile = self.label("c");
            self.chains.push(format!(
                "[{}:v]{},{}{}",
                input.0,
                filters::fill_frame(cell.width, cell.height, self.fps),
                filters::trim_to(duration),
                tile
            ));
            let next = self.label("bg");
            self.chains.push(format!(
                "{}{}overlay={}:{}:shortest=1{}",
                canvas, tile, cell.x, cell.y, next
            ));
            canvas = next;
        }

        let out = self.label("v");
        self.chains.push(format!(
            "{}format=yuv420p,setsar=1,{}{}",
            canvas,
            filters::trim_to(duration),
            out
        ));
        out
    }

    fn add_outro(&mut self, outro: &OutroClip) -> String {
        let input = self.open_segment(&outro.path, 0.0, outro.duration);
        let out = self.label("v");
        self.chains.push(format!(
            "[{}:v]{},{}{}",
            input.0,
            filters::fill_frame(self.width, self.height, self.fps),
            filters::trim_to(outro.duration),
            out
        ));
        out
    }

    fn add_audio(&mut self, bed: &AudioBed) -> String {
        let loops = match bed.fit {
            AudioFit::Trim => 0,
            AudioFit::Loop { repeats } => repeats.saturating_sub(1),
        };
        let input = self.open_audio(&bed.track, loops);
        let out = self.label("aout");
        self.chains.push(format!(
            "[{}:a]{}{}",
            input.0,
            filters::audio_bed(bed.duration, bed.fade_in, bed.fade_out_start(), bed.fade_out),
            out
        ));
        out
    }
}

impl RenderPlan {
    /// Whether the graph is too long to pass inline.
    pub fn needs_script(&self) -> bool {
        self.filter_graph.len() > MAX_INLINE_GRAPH_LEN
    }

    /// Build the FFmpeg command writing to `output`.
    ///
    /// When `script` is given the graph is read from that file instead of
    /// the command line; the caller is responsible for writing it.
    pub fn into_command(
        self,
        output: &Path,
        encoding: &EncodingConfig,
        script: Option<&Path>,
    ) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output);
        for input in self.inputs {
            cmd = cmd.input_with_args(input.args, input.path);
        }

        cmd = match script {
            Some(path) => cmd.filter_complex_script(path),
            None => cmd.filter_complex(self.filter_graph),
        };

        cmd = cmd.map(self.video_label);
        if let Some(audio) = self.audio_label {
            cmd = cmd.map(audio);
        }

        cmd.output_args(encoding.to_ffmpeg_args())
            .max_duration(self.total_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{MediaItem, Resolution, TransitionEffect};
    use std::sync::Arc;

    fn image(id: u32) -> reel_models::MediaRef {
        Arc::new(MediaItem::image(id, format!("img{}.jpg", id)))
    }

    fn sample_timeline() -> Timeline {
        let video = Arc::new(MediaItem::video(10, "clip.mp4", Some(30.0)));
        Timeline {
            resolution: Resolution::Horizontal,
            segments: vec![
                Segment::single(image(1), 4.0),
                Segment::transition(
                    TransitionEffect::SlideLeft,
                    Segment::single(image(1), 0.6),
                    Segment::video_clip(video.clone(), 5.0, 5.6),
                    1.5,
                ),
                Segment::video_clip(video, 5.6, 14.0),
                Segment::collage(vec![image(2), image(3), image(4)], 3.5),
            ],
            outro: Some(OutroClip {
                path: "outro_horizontal.mp4".into(),
                duration: 5.0,
            }),
            audio: Some(AudioBed::fit_to("song.mp3".into(), 40.0, 22.4, 2.0, 5.0)),
        }
    }

    #[test]
    fn test_build_counts_inputs() {
        let plan = RenderGraph::build(&sample_timeline(), &EncodingConfig::default()).unwrap();
        // 1 still, transition (still + clip), clip, 3 collage stills, outro, audio
        assert_eq!(plan.inputs.len(), 9);
        assert!(plan.filter_graph.contains("xfade=transition=slideleft"));
        assert!(plan.filter_graph.contains("concat=n=5:v=1:a=0"));
        assert!(plan.audio_label.is_some());
        assert!((plan.total_duration - 22.4).abs() < 1e-9);
    }

    #[test]
    fn test_audio_loops_are_extra_repeats() {
        let plan = RenderGraph::build(&sample_timeline(), &EncodingConfig::default()).unwrap();
        let audio = plan.inputs.last().unwrap();
        // 22.4s over a 40s track is a trim, no loop flag
        assert!(audio.args.is_empty());

        let mut timeline = sample_timeline();
        timeline.audio = Some(AudioBed::fit_to("short.mp3".into(), 10.0, 22.4, 2.0, 5.0));
        let plan = RenderGraph::build(&timeline, &EncodingConfig::default()).unwrap();
        assert_eq!(plan.inputs.last().unwrap().args, vec!["-stream_loop", "2"]);
    }

    #[test]
    fn test_video_clip_opens_bounded_input() {
        let mut graph = RenderGraph::new(1280, 720, 30);
        let handle = graph.open_segment(Path::new("clip.mp4"), 2.0, 10.5);
        assert_eq!(handle, InputHandle(0));
        assert_eq!(graph.inputs[0].args, vec!["-ss", "2.000", "-t", "8.500"]);
    }

    #[test]
    fn test_empty_timeline_rejected() {
        let timeline = Timeline {
            resolution: Resolution::Square,
            segments: Vec::new(),
            outro: None,
            audio: None,
        };
        assert!(RenderGraph::build(&timeline, &EncodingConfig::default()).is_err());
    }

    #[test]
    fn test_command_maps_outputs() {
        let plan = RenderGraph::build(&sample_timeline(), &EncodingConfig::default()).unwrap();
        let video_label = plan.video_label.clone();
        let cmd = plan.into_command(Path::new("out.mp4"), &EncodingConfig::default(), None);
        let args = cmd.build_args();
        assert!(args.contains(&video_label));
        assert!(args.contains(&"-filter_complex".to_string()));
        let t = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "22.400");
    }
}
