use crate::ffmpeg;
use crate::genre::{Genre, Style};
use crate::logi;
use crate::script::Scene;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

const SCENE_PROMPT_CHARS: usize = 200;
const PLACEHOLDER_RGB: (u8, u8, u8) = (73, 109, 137);
const PLACEHOLDER_SIZE: u32 = 512;
const POSTER_RGB: (u8, u8, u8) = (20, 20, 40);
const POSTER_SIZE: (u32, u32) = (1080, 1920);

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Produces the source still for `scene` inside `out_dir`.
    async fn scene_image(&self, scene: &Scene, out_dir: &Path) -> Result<PathBuf>;
}

/// Text-to-image prompt for a scene: the opening of its body plus genre and
/// style cues.
pub fn scene_prompt(scene: &Scene) -> String {
    let body: String = scene.content.chars().take(SCENE_PROMPT_CHARS).collect();
    format!(
        "{}. {}, {}",
        body.trim(),
        Genre::resolve(&scene.genre).mood(),
        Style::resolve(&scene.style).prompt_fragment()
    )
}

/// Flat-colour stand-in used until a text-to-image backend is wired in.
#[derive(Debug, Default, Clone)]
pub struct PlaceholderImages;

#[async_trait]
impl ImageGenerator for PlaceholderImages {
    async fn scene_image(&self, scene: &Scene, out_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", out_dir.display()))?;
        let out = out_dir.join(format!("scene_{}.jpg", scene.id));
        logi(format!("Scene {} image prompt: {}", scene.id, scene_prompt(scene)));

        if !ffmpeg::ffmpeg_solid_image(PLACEHOLDER_RGB, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, &out).await? {
            anyhow::bail!("image not written: {}", out.display());
        }
        Ok(out)
    }
}

pub async fn generate_poster(out_dir: &Path, poster_id: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).await?;
    let out = out_dir.join(format!("poster_{}.jpg", poster_id));
    if !ffmpeg::ffmpeg_solid_image(POSTER_RGB, POSTER_SIZE.0, POSTER_SIZE.1, &out).await? {
        anyhow::bail!("poster not written: {}", out.display());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_truncates_body_and_adds_cues() {
        let scene = Scene {
            id: 1,
            title: "Scene 1: Long".to_string(),
            content: "x".repeat(500),
            genre: "Horror".to_string(),
            style: "noir".to_string(),
        };
        let prompt = scene_prompt(&scene);
        assert!(prompt.starts_with(&"x".repeat(200)));
        assert!(!prompt.starts_with(&"x".repeat(201)));
        assert!(prompt.contains(Genre::Horror.mood()));
        assert!(prompt.ends_with(Style::Noir.prompt_fragment()));
    }
}
