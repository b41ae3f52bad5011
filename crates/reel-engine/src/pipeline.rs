//! One highlight run, end to end.
//!
//! A run has three stages:
//! 1. `prepare`: scan and probe media, pick and probe the music track and
//!    the outro (async, touches the filesystem and the backend)
//! 2. `plan`: selection, video carving, image pacing, shuffling, transitions
//!    and composition (sync, deterministic for a given seed and inputs)
//! 3. render dispatch and preview, bounded by the configured timeout and an
//!    optional cancellation signal

use chrono::Local;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::Instrument;

use reel_media::{MediaBackend, RenderControl};
use reel_models::{OutroClip, RenderResult, RunId, Timeline};

use crate::catalog::MediaCatalog;
use crate::composer::{self, Composer};
use crate::compositor::{Compositor, GridCompositor};
use crate::config::RunConfig;
use crate::error::{EngineError, EngineResult};
use crate::image_planner::ImageSequencePlanner;
use crate::logging::RunLogger;
use crate::music::{self, MusicTrack};
use crate::sampling::run_rng;
use crate::scorer::{DimensionScorer, QualityScorer};
use crate::selector::{MaterialSelector, SelectionReport};
use crate::transitions::{TransitionReport, TransitionScheduler};
use crate::video_planner::VideoSegmentPlanner;

/// Everything planning reads besides the configuration.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub catalog: MediaCatalog,
    pub music: Option<MusicTrack>,
    pub outro: Option<OutroClip>,
}

/// A finished plan and how it was reached.
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub timeline: Timeline,
    pub selection: SelectionReport,
    /// Seconds of carved video
    pub video_total: f64,
    /// Seconds given to images
    pub image_budget: f64,
    pub dropped_videos: usize,
    pub transitions: TransitionReport,
}

pub struct HighlightPipeline {
    config: RunConfig,
    backend: Arc<dyn MediaBackend>,
    scorer: Arc<dyn QualityScorer>,
    compositor: Arc<dyn Compositor>,
}

impl HighlightPipeline {
    /// Pipeline with the dimension scorer and grid compositor.
    pub fn new(config: RunConfig, backend: Arc<dyn MediaBackend>) -> Self {
        let scorer = Arc::new(DimensionScorer::new(config.resolution));
        Self {
            config,
            backend,
            scorer,
            compositor: Arc::new(GridCompositor),
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn QualityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Gather the media pool, music and outro.
    pub async fn prepare(&self, rng: &mut StdRng) -> EngineResult<PlanInputs> {
        let c = &self.config;
        let backend = self.backend.as_ref();

        let catalog = MediaCatalog::scan(&c.media_roots, backend).await?;

        let track = music::choose_track(c.music_track.as_deref(), c.music_dir.as_deref(), rng);
        let music = match track {
            Some(path) => music::load_track(&path, backend).await,
            None => None,
        };

        let outro = match &c.outro_dir {
            Some(dir) => {
                composer::load_outro(dir, c.resolution, backend, c.audio.max_outro_duration).await
            }
            None => None,
        };

        Ok(PlanInputs {
            catalog,
            music,
            outro,
        })
    }

    /// Build the timeline. Same inputs and RNG state give the same plan.
    pub fn plan(&self, inputs: &PlanInputs, rng: &mut StdRng) -> EngineResult<RunPlan> {
        let c = &self.config;

        let selector = MaterialSelector::new(&c.budget, self.scorer.as_ref());
        let mut selection = match &c.manual_files {
            Some(files) => selector.select_manual(&inputs.catalog, files)?,
            None => selector.select_random(inputs.catalog.items(), rng)?,
        };

        let videos = selection.videos.clone();
        let video_plan = VideoSegmentPlanner::new(&c.budget).plan(&videos, &mut selection, rng);

        let image_budget = c
            .pacing
            .remaining_budget(c.budget.target_duration, video_plan.total);
        let image_segments =
            ImageSequencePlanner::new(&c.pacing, self.compositor.as_ref(), c.resolution).plan(
                &selection.images,
                image_budget,
                rng,
            );

        let mut segments = video_plan.segments;
        segments.extend(image_segments);
        segments.shuffle(rng);

        let reserved = inputs.outro.as_ref().map_or(0.0, |o| o.duration);
        let (segments, transitions) =
            TransitionScheduler::new(&c.transitions, c.budget.max_total_duration)
                .schedule(segments, reserved, rng);

        let timeline = Composer::new(&c.budget, &c.audio, c.resolution).compose(
            segments,
            inputs.outro.clone(),
            inputs.music.as_ref(),
        );

        Ok(RunPlan {
            timeline,
            selection: selection.report,
            video_total: video_plan.total,
            image_budget,
            dropped_videos: video_plan.dropped.len(),
            transitions,
        })
    }

    /// Path the rendered file for `run_id` is written to.
    pub fn output_path(&self, run_id: &RunId) -> PathBuf {
        self.config
            .output_dir
            .join(composer::output_file_name(run_id, &Local::now()))
    }

    /// Plan and render one highlight.
    pub async fn run(&self, cancel: Option<watch::Receiver<bool>>) -> EngineResult<RenderResult> {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "highlight");
        let span = logger.create_span();

        let result = self
            .run_inner(&run_id, &logger, cancel)
            .instrument(span)
            .await;
        if let Err(e) = &result {
            logger.log_error(&e.to_string());
        }
        result
    }

    async fn run_inner(
        &self,
        run_id: &RunId,
        logger: &RunLogger,
        cancel: Option<watch::Receiver<bool>>,
    ) -> EngineResult<RenderResult> {
        let started = Instant::now();
        let c = &self.config;
        c.validate()?;

        logger.log_start(&format!(
            "{} target {}s",
            c.resolution, c.budget.target_duration
        ));
        let mut rng = run_rng(c.seed);

        let inputs = self.prepare(&mut rng).await?;
        let plan = self.plan(&inputs, &mut rng)?;
        let total_duration = plan.timeline.total_duration();
        logger.log_progress(&format!(
            "planned {} segments, {:.1}s",
            plan.timeline.segments.len(),
            total_duration
        ));

        if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(EngineError::Cancelled);
        }

        let output = self.output_path(run_id);
        let mut control = RenderControl::default().with_timeout(c.render_timeout);
        if let Some(cancel) = cancel {
            control = control.with_cancel(cancel);
        }
        composer::dispatch(
            self.backend.as_ref(),
            &plan.timeline,
            &output,
            &c.encoding,
            control,
        )
        .await?;

        let preview_path = if c.preview {
            self.preview(&output, total_duration, logger).await
        } else {
            None
        };

        let processing_time = started.elapsed().as_secs_f64();
        logger.log_completion(&format!(
            "{} in {:.1}s",
            output.display(),
            processing_time
        ));

        Ok(RenderResult {
            run_id: run_id.clone(),
            success: true,
            output_path: output,
            total_duration,
            segments_used: plan.timeline.segments.len(),
            resolution: c.resolution,
            processing_time,
            preview_path,
        })
    }

    async fn preview(&self, output: &Path, duration: f64, logger: &RunLogger) -> Option<PathBuf> {
        let path = reel_media::preview_path_for(output);
        match self.backend.preview(output, &path, duration).await {
            Ok(()) => Some(path),
            Err(e) => {
                logger.log_warning(&format!("preview failed: {}", e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::MockQualityScorer;
    use async_trait::async_trait;
    use reel_media::MediaResult;
    use reel_models::{EncodingConfig, MediaItem, ScoreResult};

    /// Planning never reaches the backend.
    struct NullBackend;

    #[async_trait]
    impl MediaBackend for NullBackend {
        async fn probe(&self, _path: &Path) -> MediaResult<f64> {
            Ok(0.0)
        }

        async fn render(
            &self,
            _timeline: &Timeline,
            _output: &Path,
            _encoding: &EncodingConfig,
            _control: RenderControl,
        ) -> MediaResult<()> {
            Ok(())
        }

        async fn preview(&self, _video: &Path, _preview: &Path, _duration: f64) -> MediaResult<()> {
            Ok(())
        }
    }

    fn inputs() -> PlanInputs {
        let mut items = vec![
            MediaItem::video(0, "/media/videos/a.mp4", Some(40.0)),
            MediaItem::video(1, "/media/videos/b.mp4", Some(9.0)),
        ];
        items.extend((2..22).map(|i| MediaItem::image(i, format!("/media/images/{}.jpg", i))));
        PlanInputs {
            catalog: MediaCatalog::from_items(items),
            music: Some(MusicTrack {
                path: "/music/a.mp3".into(),
                duration: 200.0,
            }),
            outro: Some(OutroClip {
                path: "/outro/outro_horizontal.mp4".into(),
                duration: 5.0,
            }),
        }
    }

    fn pipeline() -> HighlightPipeline {
        let mut scorer = MockQualityScorer::new();
        scorer
            .expect_score()
            .returning(|_| ScoreResult::from_parts(30.0, 30.0, 10.0, true));
        HighlightPipeline::new(RunConfig::default(), Arc::new(NullBackend))
            .with_scorer(Arc::new(scorer))
    }

    #[test]
    fn test_plan_within_bounds() {
        let pipeline = pipeline();
        for seed in 0..50 {
            let plan = pipeline.plan(&inputs(), &mut run_rng(Some(seed))).unwrap();
            let total = plan.timeline.total_duration();
            assert!(total <= 100.0 + 1e-6, "seed {}: {}", seed, total);
            assert!(plan.video_total <= 52.0 + 1e-6);
            assert!((13.0..=44.0).contains(&plan.image_budget));
            assert!(plan.timeline.audio.is_some());
        }
    }

    #[test]
    fn test_manual_mode_uses_listed_files() {
        let mut config = RunConfig::default();
        config.manual_files = Some(vec!["a.mp4".into(), "2.jpg".into(), "3.jpg".into()]);
        let pipeline = HighlightPipeline::new(config, Arc::new(NullBackend));

        let plan = pipeline.plan(&inputs(), &mut run_rng(Some(1))).unwrap();
        let mut members: Vec<u32> = plan
            .timeline
            .segments
            .iter()
            .flat_map(|s| s.members().into_iter().map(|m| m.id.0))
            .collect();
        members.sort();
        members.dedup();
        assert_eq!(members, vec![0, 2, 3]);
    }
}
