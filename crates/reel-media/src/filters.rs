//! FFmpeg filter graph fragments.

use reel_models::BlendBehavior;

/// Scale and crop to fill a `width`x`height` frame at a fixed rate and format.
pub fn fill_frame(width: u32, height: u32, fps: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps},format=yuv420p",
        w = width,
        h = height,
        fps = fps
    )
}

/// Cut a stream to exactly `seconds` and restart its timestamps.
pub fn trim_to(seconds: f64) -> String {
    format!("trim=duration={:.3},setpts=PTS-STARTPTS", seconds)
}

/// Black background of the given size and length.
pub fn background(width: u32, height: u32, fps: u32, seconds: f64) -> String {
    format!("color=c=black:s={}x{}:r={}:d={:.3}", width, height, fps, seconds)
}

/// Freeze the last frame for `seconds`.
pub fn hold_last_frame(seconds: f64) -> String {
    format!("tpad=stop_mode=clone:stop_duration={:.3}", seconds)
}

/// Freeze the first frame for `seconds`.
pub fn hold_first_frame(seconds: f64) -> String {
    format!("tpad=start_mode=clone:start_duration={:.3}", seconds)
}

/// Blend two equally long inputs over their whole length.
pub fn blend(behavior: BlendBehavior, seconds: f64) -> String {
    format!(
        "xfade=transition={}:duration={:.3}:offset=0",
        behavior.xfade_name(),
        seconds
    )
}

/// Concatenate `count` video-only inputs.
pub fn concat_video(count: usize) -> String {
    format!("concat=n={}:v=1:a=0", count)
}

/// Trim the music bed and fade it in at the start and out at `fade_out_start`.
pub fn audio_bed(total: f64, fade_in: f64, fade_out_start: f64, fade_out: f64) -> String {
    format!(
        "atrim=duration={:.3},asetpts=PTS-STARTPTS,afade=t=in:st=0:d={:.3},afade=t=out:st={:.3}:d={:.3}",
        total, fade_in, fade_out_start, fade_out
    )
}

/// Placement of one collage image inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Grid layout for `count` images inside a `width`x`height` frame.
///
/// The grid leans toward more columns in landscape frames and more rows in
/// portrait ones. A short last row is centered. Cell sizes are even.
pub fn collage_layout(count: usize, width: u32, height: u32) -> Vec<Cell> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Cell {
            x: 0,
            y: 0,
            width,
            height,
        }];
    }

    let margin = (width.min(height) / 100).max(10);
    let spacing = margin / 2;

    let long = (count as f64).sqrt().ceil() as usize;
    let short = count.div_ceil(long);
    let (cols, rows) = if width >= height {
        (long, short)
    } else {
        (short, long)
    };

    let avail_w = width.saturating_sub(2 * margin + spacing * (cols as u32 - 1));
    let avail_h = height.saturating_sub(2 * margin + spacing * (rows as u32 - 1));
    let cell_w = (avail_w / cols as u32) & !1;
    let cell_h = (avail_h / rows as u32) & !1;

    let mut cells = Vec::with_capacity(count);
    for index in 0..count {
        let row = index / cols;
        let col = index % cols;
        let in_row = (count - row * cols).min(cols) as u32;
        let row_width = in_row * cell_w + in_row.saturating_sub(1) * spacing;
        let grid_width = cols as u32 * cell_w + (cols as u32 - 1) * spacing;
        let offset = (grid_width - row_width) / 2;

        cells.push(Cell {
            x: margin + offset + col as u32 * (cell_w + spacing),
            y: margin + row as u32 * (cell_h + spacing),
            width: cell_w,
            height: cell_h,
        });
    }
    cells
}
