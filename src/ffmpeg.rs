use crate::error::StudioError;
use crate::overlay::{Overlay, OverlayPosition};
use crate::timeline::Timeline;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

const CRF: &str = "22";
const PRESET: &str = "veryfast";
const STILL_ZOOM_STEP: f64 = 0.0015;
const STILL_ZOOM_MAX: f64 = 1.15;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let output = cmd
        .output()
        .await
        .with_context(|| format!("Command execution failed: {}", args[0]))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(StudioError::Ffmpeg(format!("{} exited with {}: {}", args[0], output.status, stderr)).into());
    }

    Ok(())
}

fn ffmpeg_base_args() -> Vec<String> {
    ["ffmpeg", "-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn h264_output_args(out_mp4: &Path) -> Vec<String> {
    vec![
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        PRESET.to_string(),
        "-crf".to_string(),
        CRF.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ]
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe execution failed")?;

    if !output.status.success() {
        return Err(StudioError::Ffmpeg(format!("ffprobe failed for {}", path.display())).into());
    }

    parse_dimensions(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| StudioError::Ffmpeg(format!("invalid dimensions for {}", path.display())).into())
}

fn parse_dimensions(text: &str) -> Option<(u32, u32)> {
    let mut parts = text.trim().split('x');
    let w = parts.next()?.trim().parse::<u32>().ok()?;
    let h = parts.next()?.trim().parse::<u32>().ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    Some((w, h))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(StudioError::Ffmpeg(format!("ffprobe failed for {}", path.display())).into());
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(StudioError::Ffmpeg(format!("invalid duration for {}: {text:?}", path.display())).into());
    }
    Ok(duration)
}

/// Writes a single-colour still image.
pub async fn ffmpeg_solid_image(rgb: (u8, u8, u8), width: u32, height: u32, out_image: &Path) -> Result<bool> {
    let mut args = ffmpeg_base_args();
    args.extend([
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "color=c=0x{:02X}{:02X}{:02X}:s={}x{}",
            rgb.0, rgb.1, rgb.2, width, height
        ),
        "-frames:v".to_string(),
        "1".to_string(),
        out_image.display().to_string(),
    ]);
    run_cmd(&args).await?;
    Ok(out_image.exists())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Turns a still image into a short clip with a slow centre push-in.
pub async fn ffmpeg_still_to_clip(image: &Path, geometry: &Geometry, frames: u32, out_mp4: &Path) -> Result<bool> {
    let mut args = ffmpeg_base_args();
    args.extend([
        "-i".to_string(),
        image.display().to_string(),
        "-vf".to_string(),
        still_motion_filter(geometry, frames),
        "-frames:v".to_string(),
        frames.to_string(),
    ]);
    args.extend(h264_output_args(out_mp4));
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

fn still_motion_filter(geometry: &Geometry, frames: u32) -> String {
    let Geometry { width: w, height: h, fps } = geometry;
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},\
zoompan=z='min(zoom+{STILL_ZOOM_STEP},{STILL_ZOOM_MAX})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d={frames}:s={w}x{h}:fps={fps},\
format=yuv420p"
    )
}

/// Everything ffmpeg needs to turn a [`Timeline`] into one video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub inputs: Vec<PathBuf>,
    pub filter_complex: String,
    pub output_label: String,
}

/// Builds the `-filter_complex` graph: normalise every clip, chain `xfade`
/// across marked crossfades, apply the whole-timeline fades, then draw the
/// overlays on top of the blended result.
pub fn build_timeline_filter(timeline: &Timeline, geometry: &Geometry, font_file: Option<&Path>) -> FilterGraph {
    let Geometry { width: w, height: h, fps } = geometry;
    let mut filters = Vec::new();
    let mut inputs = Vec::new();

    for (idx, entry) in timeline.entries.iter().enumerate() {
        inputs.push(entry.clip.source_path.clone());
        filters.push(format!(
            "[{idx}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p[v{idx}]"
        ));
    }

    let mut current = "v0".to_string();
    let mut elapsed = timeline
        .entries
        .first()
        .map(|e| e.clip.duration)
        .unwrap_or(0.0);
    // Part of the previous clip not already blended into the one before it.
    let mut prev_free = elapsed;

    for (idx, entry) in timeline.entries.iter().enumerate().skip(1) {
        let next = format!("x{idx}");
        let overlap = entry
            .crossfade_in
            .map(|t| clamp_overlap(t, prev_free, entry.clip.duration))
            .unwrap_or(0.0);

        if overlap > 0.0 {
            let offset = (elapsed - overlap).max(0.0);
            filters.push(format!(
                "[{current}][v{idx}]xfade=transition=fade:duration={overlap:.3}:offset={offset:.3}[{next}]"
            ));
        } else {
            filters.push(format!("[{current}][v{idx}]concat=n=2:v=1:a=0[{next}]"));
        }
        elapsed += entry.clip.duration - overlap;
        prev_free = entry.clip.duration - overlap;
        current = next;
    }

    let fade_out_start = (elapsed - timeline.fade_out_seconds).max(0.0);
    filters.push(format!(
        "[{current}]fade=t=in:st=0:d={:.3},fade=t=out:st={fade_out_start:.3}:d={:.3}[base]",
        timeline.fade_in_seconds, timeline.fade_out_seconds
    ));

    let output_label = if timeline.overlays.is_empty() {
        "base".to_string()
    } else {
        let draws: Vec<String> = timeline
            .overlays
            .iter()
            .map(|o| drawtext(o, *h, font_file))
            .collect();
        filters.push(format!("[base]{}[outv]", draws.join(",")));
        "outv".to_string()
    };

    FilterGraph {
        inputs,
        filter_complex: filters.join(";"),
        output_label,
    }
}

/// Keeps an overlap within half of the previous clip's unblended tail and
/// half of the next clip, so a crossfade never reaches past its neighbour.
fn clamp_overlap(requested: f64, previous_free: f64, next: f64) -> f64 {
    let limit = previous_free.min(next) / 2.0;
    requested.min(limit).max(0.0)
}

fn drawtext(overlay: &Overlay, height: u32, font_file: Option<&Path>) -> String {
    let (font_size, x, y) = match overlay.position {
        OverlayPosition::CenterTop => (height / 12, "(w-text_w)/2", "h/12".to_string()),
        OverlayPosition::CenterBottom => (height / 20, "(w-text_w)/2", "h-text_h-h/12".to_string()),
        OverlayPosition::RightTop => (height / 22, "w-text_w-h/24", "h/24".to_string()),
    };
    let start = overlay.start_seconds;
    let end = overlay.end_seconds();

    let mut parts = Vec::new();
    if let Some(font) = font_file {
        parts.push(format!("fontfile='{}'", escape_drawtext(&font.display().to_string())));
    }
    parts.push(format!("text='{}'", escape_drawtext(&overlay.text)));
    parts.push("expansion=none".to_string());
    parts.push(format!("fontsize={}", font_size.max(8)));
    parts.push("fontcolor=white".to_string());
    parts.push("borderw=2".to_string());
    parts.push("bordercolor=black@0.6".to_string());
    parts.push(format!("x={x}"));
    parts.push(format!("y={y}"));
    parts.push(format!("enable='between(t,{start:.3},{end:.3})'"));
    parts.push(format!("alpha='{}'", fade_alpha(overlay)));

    format!("drawtext={}", parts.join(":"))
}

fn fade_alpha(overlay: &Overlay) -> String {
    let start = overlay.start_seconds;
    let end = overlay.end_seconds();
    let fade_in = overlay.fade_in_seconds.max(0.001);
    let fade_out = overlay.fade_out_seconds.max(0.001);
    let hold_until = end - fade_out;
    format!(
        "if(lt(t,{start:.3}),0,if(lt(t,{:.3}),(t-{start:.3})/{fade_in:.3},if(lt(t,{hold_until:.3}),1,if(lt(t,{end:.3}),({end:.3}-t)/{fade_out:.3},0))))",
        start + fade_in
    )
}

/// Escapes text for a single-quoted drawtext option value.
fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '\'' => out.push('\u{2019}'),
            '\n' | '\r' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

pub async fn ffmpeg_render_timeline(graph: &FilterGraph, out_mp4: &Path) -> Result<bool> {
    let mut args = ffmpeg_base_args();
    for input in &graph.inputs {
        args.push("-i".to_string());
        args.push(input.display().to_string());
    }
    args.extend([
        "-filter_complex".to_string(),
        graph.filter_complex.clone(),
        "-map".to_string(),
        format!("[{}]", graph.output_label),
    ]);
    args.extend(h264_output_args(out_mp4));
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}
