//! Highlight render binary: one run per invocation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_engine::{EngineError, HighlightPipeline, RunConfig};
use reel_media::{check_ffmpeg, check_ffprobe, FfmpegBackend};

/// Exit code for a run stopped by a signal.
const EXIT_CANCELLED: i32 = 130;

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reel_engine=info,reel_media=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting reel-worker");

    let config = RunConfig::from_env();
    config.validate()?;
    info!(
        resolution = %config.resolution,
        target = config.budget.target_duration,
        roots = ?config.media_roots,
        seed = ?config.seed,
        "Run config loaded"
    );

    let ffmpeg = check_ffmpeg()?;
    check_ffprobe()?;
    info!(ffmpeg = %ffmpeg.display(), "FFmpeg found");

    let mut backend = FfmpegBackend::new();
    if let Some(dir) = &config.scratch_dir {
        backend = backend.with_scratch_root(dir);
    }
    let pipeline = HighlightPipeline::new(config, Arc::new(backend));

    // Ctrl-C flips the cancel flag; the render kills FFmpeg and cleans up
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let run = pipeline.run(Some(cancel_rx));
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            cancel_tx.send(true).ok();
            run.await
        }
    };

    match result {
        Ok(render) => {
            println!("{}", serde_json::to_string_pretty(&render)?);
            info!(output = %render.output_path.display(), "Worker finished");
            Ok(())
        }
        Err(EngineError::Cancelled) => {
            warn!("Run cancelled");
            std::process::exit(EXIT_CANCELLED);
        }
        Err(e) => {
            error!(fatal = e.is_fatal(), "Run failed: {}", e);
            Err(e.into())
        }
    }
}
