use crate::error::{Result, StudioError};
use crate::ffmpeg::{self, Geometry};
use crate::timeline::Timeline;
use crate::{logi, logok};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// What an encoded timeline looks like on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub path: PathBuf,
    pub duration_seconds: f64,
    /// `"{width}x{height}"` as probed from the file.
    pub resolution: String,
    pub file_size_bytes: u64,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, timeline: &Timeline, out_path: &Path) -> Result<RenderOutput>;
}

pub struct FfmpegRenderer {
    geometry: Geometry,
    font_file: Option<PathBuf>,
}

impl FfmpegRenderer {
    pub fn new(geometry: Geometry, font_file: Option<PathBuf>) -> Self {
        Self { geometry, font_file }
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render(&self, timeline: &Timeline, out_path: &Path) -> Result<RenderOutput> {
        if timeline.entries.is_empty() {
            return Err(StudioError::NoInputClips);
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let graph = ffmpeg::build_timeline_filter(timeline, &self.geometry, self.font_file.as_deref());
        logi(format!(
            "Rendering {} clips ({} crossfades, {} overlays, ~{:.2}s) -> {}",
            timeline.total_clips(),
            timeline.crossfade_count(),
            timeline.overlays.len(),
            timeline.blended_duration(),
            out_path.display()
        ));

        let written = ffmpeg::ffmpeg_render_timeline(&graph, out_path)
            .await
            .map_err(|e| StudioError::Render(format!("{e:#}")))?;
        if !written {
            return Err(StudioError::Render(format!("no output written to {}", out_path.display())));
        }

        let output = probe_output(out_path).await?;
        logok(format!(
            "Render OK: {} ({:.2}s, {}, {} bytes)",
            output.path.display(),
            output.duration_seconds,
            output.resolution,
            output.file_size_bytes
        ));
        Ok(output)
    }
}

/// Measures a finished file. The duration recorded in history always comes
/// from here, never from summing clip lengths.
pub async fn probe_output(path: &Path) -> Result<RenderOutput> {
    let duration_seconds = ffmpeg::ffprobe_duration_seconds(path)
        .await
        .map_err(|e| StudioError::Render(format!("{e:#}")))?;
    let (w, h) = ffmpeg::ffprobe_video_dimensions(path)
        .await
        .map_err(|e| StudioError::Render(format!("{e:#}")))?;
    let file_size_bytes = fs::metadata(path).await?.len();

    Ok(RenderOutput {
        path: path.to_path_buf(),
        duration_seconds,
        resolution: format!("{}x{}", w, h),
        file_size_bytes,
    })
}
