//! Rendering backend contract and its FFmpeg implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use reel_models::{EncodingConfig, Timeline};

use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::fs_utils::move_file;
use crate::graph::RenderGraph;
use crate::preview::generate_preview;
use crate::probe::probe_duration;

/// Caller-supplied limits for one render.
#[derive(Debug, Clone, Default)]
pub struct RenderControl {
    pub timeout: Option<Duration>,
    /// The render stops once this becomes `true`
    pub cancel: Option<watch::Receiver<bool>>,
}

impl RenderControl {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Probe and render capabilities the engine relies on.
///
/// `render` must either leave a complete file at `output` or nothing at all,
/// and must release every input it opened before returning, including when
/// cancelled or timed out.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Duration of a video or audio file in seconds.
    async fn probe(&self, path: &Path) -> MediaResult<f64>;

    /// Render `timeline` into `output`.
    async fn render(
        &self,
        timeline: &Timeline,
        output: &Path,
        encoding: &EncodingConfig,
        control: RenderControl,
    ) -> MediaResult<()>;

    /// Write a short animated preview of a finished render.
    async fn preview(&self, video: &Path, preview: &Path, duration: f64) -> MediaResult<()>;
}

/// Backend driving the `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    /// Parent for per-render scratch directories; system temp when unset
    scratch_root: Option<PathBuf>,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("reel-render-");
        match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(path).await
    }

    async fn render(
        &self,
        timeline: &Timeline,
        output: &Path,
        encoding: &EncodingConfig,
        control: RenderControl,
    ) -> MediaResult<()> {
        let plan = RenderGraph::build(timeline, encoding)?;
        let total = plan.total_duration;

        // Removed with everything in it when this function returns
        let scratch = self.scratch_dir()?;
        let extension = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let partial = scratch.path().join(format!("render.{}", extension));

        let script = if plan.needs_script() {
            let path = scratch.path().join("graph.txt");
            tokio::fs::write(&path, &plan.filter_graph).await?;
            Some(path)
        } else {
            None
        };

        debug!(
            inputs = plan.inputs.len(),
            graph_len = plan.filter_graph.len(),
            "Render graph built"
        );
        let cmd = plan.into_command(&partial, encoding, script.as_deref());

        let mut runner = FfmpegRunner::new();
        if let Some(timeout) = control.timeout {
            runner = runner.with_timeout(timeout);
        }
        if let Some(cancel) = control.cancel {
            runner = runner.with_cancel(cancel);
        }

        let started = Instant::now();
        let result = runner
            .run_with_progress(&cmd, move |progress| {
                debug!(
                    percent = (progress.fraction(total) * 100.0).round(),
                    speed = progress.speed,
                    "Render progress"
                );
            })
            .await;

        match result {
            Ok(()) => {
                move_file(&partial, output).await?;
                let elapsed = started.elapsed().as_secs_f64();
                metrics::counter!("reel_renders_total", "status" => "success").increment(1);
                metrics::histogram!("reel_render_seconds").record(elapsed);
                info!(
                    output = %output.display(),
                    duration = total,
                    elapsed_secs = elapsed,
                    "Render complete"
                );
                Ok(())
            }
            Err(e) => {
                metrics::counter!("reel_renders_total", "status" => "failure").increment(1);
                warn!(error = %e, "Render failed, discarding scratch output");
                Err(e)
            }
        }
    }

    async fn preview(&self, video: &Path, preview: &Path, duration: f64) -> MediaResult<()> {
        generate_preview(video, preview, duration).await
    }
}
