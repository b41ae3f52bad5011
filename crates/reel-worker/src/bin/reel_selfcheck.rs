use std::path::Path;

use reel_engine::RunConfig;
use reel_media::{check_ffmpeg, check_ffprobe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = RunConfig::from_env();

    println!(
        "reel-selfcheck: starting with output_dir={}",
        config.output_dir.display()
    );
    config.validate()?;
    ensure_dir(&config.output_dir).await?;
    if let Some(scratch) = &config.scratch_dir {
        ensure_dir(scratch).await?;
    }
    ensure_roots(&config.media_roots)?;
    check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    check_ffprobe().map_err(|e| anyhow::anyhow!("ffprobe not available: {}", e))?;

    println!("reel-selfcheck: ok");
    Ok(())
}

async fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_roots<P: AsRef<Path>>(roots: &[P]) -> anyhow::Result<()> {
    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(anyhow::anyhow!("media root {} is not a directory", root.display()));
        }
    }
    Ok(())
}
