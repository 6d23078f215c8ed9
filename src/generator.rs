use crate::api::ScriptWriter;
use crate::api::gemini::GeminiClient;
use crate::batch::{ItemFailure, PartialBatch};
use crate::clips::{ClipBackend, ClipPrompt, FfmpegClipLoader};
use crate::config::Config;
use crate::ffmpeg::{self, Geometry};
use crate::history::{HistoryStore, MovieRecord};
use crate::images::{self, ImageGenerator, PlaceholderImages};
use crate::render::{FfmpegRenderer, RenderOutput, Renderer};
use crate::request::MovieRequest;
use crate::script::{self, Scene};
use crate::timeline::{self, Clip};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDraft {
    pub script: String,
    pub scenes: Vec<Scene>,
}

/// A finished movie. `persisted` is false when the video was produced but
/// the history write failed.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieOutcome {
    pub record: MovieRecord,
    pub persisted: bool,
    pub skipped: Vec<ItemFailure>,
}

async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if !dir_exists(path).await {
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create dir {}", path.display()))?;
    }
    Ok(())
}

async fn clear_directory_contents(dir_path: &Path) -> Result<()> {
    if !dir_exists(dir_path).await {
        return Ok(());
    }

    for entry in WalkDir::new(dir_path).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            fs::remove_dir(path).await.ok();
        } else {
            fs::remove_file(path).await.ok();
        }
    }

    Ok(())
}

/// Public URL for a file under `base_dir`, e.g. `/static/output/<id>.mp4`.
pub fn public_url(path: &Path, base_dir: &Path) -> String {
    match pathdiff::diff_paths(path, base_dir) {
        Some(rel) if !rel.is_absolute() && !rel.starts_with("..") => {
            let rel = rel.to_string_lossy().replace('\\', "/");
            format!("/{}", rel.trim_start_matches("./"))
        }
        _ => path.display().to_string(),
    }
}

pub struct Studio {
    cfg: Config,
    writer: Box<dyn ScriptWriter>,
    images: Box<dyn ImageGenerator>,
    clips: ClipBackend,
    renderer: Box<dyn Renderer>,
    history: HistoryStore,
}

impl Studio {
    pub fn new(
        cfg: Config,
        writer: Box<dyn ScriptWriter>,
        images: Box<dyn ImageGenerator>,
        clips: ClipBackend,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let history = HistoryStore::new(cfg.history_path.clone());
        Self {
            cfg,
            writer,
            images,
            clips,
            renderer,
            history,
        }
    }

    /// Wires the Gemini script writer, placeholder stills, the ffmpeg clip
    /// engine and the ffmpeg timeline renderer.
    pub fn from_config(cfg: Config) -> Result<Self> {
        let geometry = Geometry {
            width: cfg.video.width,
            height: cfg.video.height,
            fps: cfg.video.fps,
        };
        let writer = GeminiClient::new(&cfg)?;
        let clips = ClipBackend::new(
            FfmpegClipLoader {
                geometry: geometry.clone(),
                frames: cfg.video.frames_per_clip,
            },
            cfg.max_parallel_renders,
        );
        let renderer = FfmpegRenderer::new(geometry, cfg.font_file.clone());
        Ok(Self::new(
            cfg,
            Box::new(writer),
            Box::new(PlaceholderImages),
            clips,
            Box::new(renderer),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub async fn generate_script(&self, request: &MovieRequest) -> Result<ScriptDraft> {
        let script = self.writer.write_script(request).await?;
        let scenes = script::segment(&script, &request.genre, &request.style);
        logok(format!("Script split into {} scenes", scenes.len()));
        Ok(ScriptDraft { script, scenes })
    }

    /// Folder holding the stills of one movie.
    pub fn image_dir(&self, video_id: &str) -> PathBuf {
        self.cfg.output_dir.join(video_id)
    }

    /// One still per scene into `out_dir`. Failed scenes are recorded and
    /// skipped.
    pub async fn generate_images(&self, scenes: &[Scene], out_dir: &Path) -> PartialBatch<PathBuf> {
        let mut batch = PartialBatch::new();
        for (idx, scene) in scenes.iter().enumerate() {
            logi(format!("Image {}/{}: {}", idx + 1, scenes.len(), scene.title));
            match self.images.scene_image(scene, out_dir).await {
                Ok(path) => batch.push_ok(path),
                Err(err) => {
                    logw(format!("Image failed for scene {}: {:#}", scene.id, err));
                    batch.push_err(idx, scene.id, format!("{:#}", err));
                }
            }
        }
        logi(format!("Images: {}", batch.summary()));
        batch
    }

    /// One clip per image, in order. Failed clips are recorded and skipped.
    pub async fn generate_clips(
        &self,
        request: &MovieRequest,
        scenes: &[Scene],
        images: &[PathBuf],
        work_dir: &Path,
    ) -> PartialBatch<Clip> {
        let prompt = ClipPrompt::new(&request.description, &request.style);
        let mut batch = PartialBatch::new();
        for (idx, image) in images.iter().enumerate() {
            let scene_id = scenes.get(idx).map(|s| s.id).unwrap_or(idx as u32 + 1);
            logi(format!("Clip {}/{} from {}", idx + 1, images.len(), image.display()));
            match self.clips.render_clip(image, &prompt, idx, work_dir).await {
                Ok(clip) => {
                    logok(format!("Clip {} OK: {} ({:.2}s)", idx + 1, clip.source_path.display(), clip.duration));
                    batch.push_ok(clip);
                }
                Err(err) => {
                    logw(format!("Error generating video for scene {}: {:#}", scene_id, err));
                    batch.push_err(idx, scene_id, format!("{:#}", err));
                }
            }
        }
        logi(format!("Clips: {}", batch.summary()));
        batch
    }

    /// Images → clips → composed, rendered movie → history.
    pub async fn generate_video(
        &self,
        video_id: &str,
        request: &MovieRequest,
        scenes: Vec<Scene>,
        images: Vec<PathBuf>,
    ) -> Result<MovieOutcome> {
        let work_dir = self.cfg.work_dir.join(video_id);
        ensure_dir(&work_dir).await?;

        let batch = self.generate_clips(request, &scenes, &images, &work_dir).await;
        let skipped = batch.failed.clone();
        let result = self
            .finish_movie(video_id, request, scenes, images, batch.succeeded, skipped)
            .await;

        if !self.cfg.keep_work_files {
            if let Err(err) = clear_directory_contents(&work_dir).await {
                logw(format!("Failed to clear {}: {:#}", work_dir.display(), err));
            }
            fs::remove_dir(&work_dir).await.ok();
        }
        result
    }

    /// Assembles already rendered clip files into a movie.
    pub async fn assemble(&self, request: &MovieRequest, clip_paths: &[PathBuf]) -> Result<MovieOutcome> {
        let mut clips = Vec::with_capacity(clip_paths.len());
        for (order, path) in clip_paths.iter().enumerate() {
            let duration = ffmpeg::ffprobe_duration_seconds(path)
                .await
                .with_context(|| format!("Failed to probe clip {}", path.display()))?;
            clips.push(Clip::new(path.clone(), order, duration));
        }
        let video_id = uuid::Uuid::new_v4().to_string();
        self.finish_movie(&video_id, request, Vec::new(), Vec::new(), clips, Vec::new())
            .await
    }

    /// Full flow from a request to a recorded movie.
    pub async fn run_generation(&self, request: &MovieRequest) -> Result<MovieOutcome> {
        logi(format!("\n=== Creating: {} ({} / {}) ===", request.title, request.genre, request.style));
        let draft = self.generate_script(request).await?;
        let video_id = uuid::Uuid::new_v4().to_string();
        let images = self.generate_images(&draft.scenes, &self.image_dir(&video_id)).await;

        let mut skipped = images.failed.clone();
        let image_ids: Vec<u32> = draft
            .scenes
            .iter()
            .filter(|s| !images.failed.iter().any(|f| f.scene_id == s.id))
            .map(|s| s.id)
            .collect();
        let scenes_with_images: Vec<Scene> = draft
            .scenes
            .iter()
            .filter(|s| image_ids.contains(&s.id))
            .cloned()
            .collect();

        let mut outcome = self
            .generate_video(&video_id, request, scenes_with_images, images.succeeded)
            .await?;
        outcome.record.scenes = draft.scenes;
        outcome.record.num_scenes = outcome.record.scenes.len();
        skipped.extend(outcome.skipped);
        outcome.skipped = skipped;
        Ok(outcome)
    }

    pub async fn generate_poster(&self) -> Result<PathBuf> {
        let poster_id = uuid::Uuid::new_v4().to_string();
        images::generate_poster(&self.cfg.output_dir, &poster_id).await
    }

    /// Removes the history entry, its video file and its stills.
    pub async fn delete_movie(&self, id: &str) -> Result<Option<MovieRecord>> {
        let removed = self.history.delete(id).await?;
        if let Some(record) = &removed {
            if let Err(err) = fs::remove_file(&record.video_path).await {
                logw(format!("Could not remove {}: {}", record.video_path, err));
            }
            fs::remove_dir_all(self.image_dir(&record.id)).await.ok();
        }
        Ok(removed)
    }

    async fn finish_movie(
        &self,
        video_id: &str,
        request: &MovieRequest,
        scenes: Vec<Scene>,
        images: Vec<PathBuf>,
        clips: Vec<Clip>,
        skipped: Vec<ItemFailure>,
    ) -> Result<MovieOutcome> {
        let total_clips = clips.len();
        let timeline = timeline::compose(clips, &request.metadata(), request)?;

        ensure_dir(&self.cfg.output_dir).await?;
        let out_path = self.cfg.output_dir.join(format!("{}.mp4", video_id));
        let output = match self.renderer.render(&timeline, &out_path).await {
            Ok(output) => output,
            Err(err) => {
                fs::remove_file(&out_path).await.ok();
                return Err(err.into());
            }
        };

        let record = self.build_record(video_id, request, scenes, images, &output, total_clips);
        let persisted = match self.history.append(record.clone()).await {
            Ok(()) => {
                logok(format!("Saved movie {} to history", record.id));
                true
            }
            Err(err) => {
                logw(format!("Movie {} rendered but history save failed: {}", record.id, err));
                false
            }
        };

        Ok(MovieOutcome {
            record,
            persisted,
            skipped,
        })
    }

    fn build_record(
        &self,
        video_id: &str,
        request: &MovieRequest,
        scenes: Vec<Scene>,
        images: Vec<PathBuf>,
        output: &RenderOutput,
        total_clips: usize,
    ) -> MovieRecord {
        let video_url = public_url(&output.path, &self.cfg.url_base_dir);
        let images = images
            .iter()
            .map(|p| public_url(p, &self.cfg.url_base_dir))
            .collect();
        MovieRecord::completed(
            video_id.to_string(),
            request,
            scenes,
            images,
            output,
            total_clips,
            video_url,
        )
    }
}
