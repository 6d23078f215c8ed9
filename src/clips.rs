//! Per-scene clip rendering.
//!
//! The clip engine is expensive to bring up, so [`ClipBackend`] owns it: the
//! engine is loaded on first use behind a single async critical section and
//! shared afterwards. Concurrent renders through one backend are limited by a
//! permit pool sized from the config.

use crate::ffmpeg::{self, Geometry};
use crate::genre::Style;
use crate::init;
use crate::timeline::Clip;
use crate::{logi, logok};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tokio::sync::{OnceCell, Semaphore};

const DEFAULT_CLIP_PROMPT: &str = "Cinematic scene";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPrompt {
    pub prompt: String,
    pub negative_prompt: String,
}

impl ClipPrompt {
    /// Motion prompt for one clip: the movie description (or a generic
    /// cinematic cue) plus the style's negative prompt.
    pub fn new(description: &str, style: &str) -> Self {
        let description = description.trim();
        let prompt = if description.is_empty() {
            DEFAULT_CLIP_PROMPT.to_string()
        } else {
            description.to_string()
        };
        Self {
            prompt,
            negative_prompt: Style::resolve(style).negative_prompt().to_string(),
        }
    }
}

#[async_trait]
pub trait ClipRenderer: Send + Sync {
    /// Renders clip number `order` from `image` into `out_dir` and reports
    /// its measured duration.
    async fn render_clip(&self, image: &Path, prompt: &ClipPrompt, order: usize, out_dir: &Path) -> Result<Clip>;
}

#[async_trait]
pub trait ClipLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ClipRenderer>>;
}

/// Animates a still with a slow push-in.
pub struct StillMotionRenderer {
    geometry: Geometry,
    frames: u32,
}

impl StillMotionRenderer {
    pub fn new(geometry: Geometry, frames: u32) -> Self {
        Self { geometry, frames }
    }
}

#[async_trait]
impl ClipRenderer for StillMotionRenderer {
    async fn render_clip(&self, image: &Path, prompt: &ClipPrompt, order: usize, out_dir: &Path) -> Result<Clip> {
        fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", out_dir.display()))?;
        let out = out_dir.join(format!("clip_{}.mp4", order));
        logi(format!(
            "Clip {}: {} frames @ {}fps from {} (prompt: {:?}, negative: {:?})",
            order,
            self.frames,
            self.geometry.fps,
            image.display(),
            prompt.prompt,
            prompt.negative_prompt
        ));

        if !ffmpeg::ffmpeg_still_to_clip(image, &self.geometry, self.frames, &out).await? {
            anyhow::bail!("clip not written: {}", out.display());
        }
        let duration = ffmpeg::ffprobe_duration_seconds(&out).await?;
        Ok(Clip::new(out, order, duration))
    }
}

/// Loads [`StillMotionRenderer`] once ffmpeg is confirmed on `PATH`.
pub struct FfmpegClipLoader {
    pub geometry: Geometry,
    pub frames: u32,
}

#[async_trait]
impl ClipLoader for FfmpegClipLoader {
    async fn load(&self) -> Result<Arc<dyn ClipRenderer>> {
        if !init::check_ffmpeg().await {
            anyhow::bail!("ffmpeg not found in PATH");
        }
        let renderer: Arc<dyn ClipRenderer> = Arc::new(StillMotionRenderer::new(self.geometry.clone(), self.frames));
        Ok(renderer)
    }
}

pub struct ClipBackend {
    loader: Box<dyn ClipLoader>,
    engine: OnceCell<Arc<dyn ClipRenderer>>,
    loads: AtomicUsize,
    permits: Semaphore,
}

impl ClipBackend {
    pub fn new(loader: impl ClipLoader + 'static, max_parallel_renders: usize) -> Self {
        Self {
            loader: Box::new(loader),
            engine: OnceCell::new(),
            loads: AtomicUsize::new(0),
            permits: Semaphore::new(max_parallel_renders.max(1)),
        }
    }

    /// Returns the shared engine, loading it if this is the first call.
    /// Concurrent first calls wait on the same load; a failed load leaves the
    /// backend empty so the next call tries again.
    pub async fn engine(&self) -> Result<Arc<dyn ClipRenderer>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                let attempt = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
                logi(format!("Loading clip engine (attempt {})...", attempt));
                let engine = self.loader.load().await?;
                logok("Clip engine ready.");
                Ok::<_, anyhow::Error>(engine)
            })
            .await?;
        Ok(Arc::clone(engine))
    }

    /// How many times the loader has been invoked.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    pub async fn render_clip(&self, image: &Path, prompt: &ClipPrompt, order: usize, out_dir: &Path) -> Result<Clip> {
        let engine = self.engine().await?;
        let _permit = self
            .permits
            .acquire()
            .await
            .context("clip render permits closed")?;
        engine.render_clip(image, prompt, order, out_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::task::JoinSet;

    struct SleepyRenderer {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ClipRenderer for SleepyRenderer {
        async fn render_clip(&self, image: &Path, _prompt: &ClipPrompt, order: usize, _out_dir: &Path) -> Result<Clip> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Clip::new(image.with_extension("mp4"), order, 2.5))
        }
    }

    struct CountingLoader {
        renderer: Arc<SleepyRenderer>,
        fail_first: bool,
        calls: AtomicUsize,
    }

    impl CountingLoader {
        fn new(fail_first: bool) -> (Self, Arc<SleepyRenderer>) {
            let renderer = Arc::new(SleepyRenderer {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            });
            let loader = Self {
                renderer: Arc::clone(&renderer),
                fail_first,
                calls: AtomicUsize::new(0),
            };
            (loader, renderer)
        }
    }

    #[async_trait]
    impl ClipLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn ClipRenderer>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_first && call == 0 {
                anyhow::bail!("accelerator busy");
            }
            let renderer: Arc<dyn ClipRenderer> = self.renderer.clone();
            Ok(renderer)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn engine_loads_once_under_concurrency() {
        let (loader, _) = CountingLoader::new(false);
        let backend = Arc::new(ClipBackend::new(loader, 1));

        let mut set = JoinSet::new();
        for _ in 0..8 {
            let backend = Arc::clone(&backend);
            set.spawn(async move { backend.engine().await.map(|_| ()) });
        }
        while let Some(joined) = set.join_next().await {
            joined.unwrap().unwrap();
        }

        assert_eq!(backend.load_count(), 1);
        assert!(backend.is_loaded());
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let (loader, _) = CountingLoader::new(true);
        let backend = ClipBackend::new(loader, 1);

        assert!(backend.engine().await.is_err());
        assert!(!backend.is_loaded());
        assert!(backend.engine().await.is_ok());
        assert_eq!(backend.load_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn permits_bound_concurrent_renders() {
        let (loader, renderer) = CountingLoader::new(false);
        let backend = Arc::new(ClipBackend::new(loader, 2));
        let prompt = ClipPrompt::new("", "Cinematic");

        let mut set = JoinSet::new();
        for order in 0..6 {
            let backend = Arc::clone(&backend);
            let prompt = prompt.clone();
            set.spawn(async move {
                let image = format!("scene_{order}.jpg");
                backend
                    .render_clip(Path::new(&image), &prompt, order, Path::new("clips"))
                    .await
            });
        }
        while let Some(joined) = set.join_next().await {
            joined.unwrap().unwrap();
        }

        assert!(renderer.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(backend.load_count(), 1);
    }

    #[test]
    fn prompt_defaults_and_negative_by_style() {
        let p = ClipPrompt::new("   ", "Anime");
        assert_eq!(p.prompt, "Cinematic scene");
        assert_eq!(p.negative_prompt, Style::Anime.negative_prompt());

        let p = ClipPrompt::new("A heist in Rome", "unknown");
        assert_eq!(p.prompt, "A heist in Rome");
        assert_eq!(p.negative_prompt, "low quality, blurry, static");
    }
}
