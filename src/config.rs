use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default = "default_script_model")]
    pub script_model: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    /// Directory that public video URLs are made relative to.
    #[serde(default = "default_url_base_dir")]
    pub url_base_dir: PathBuf,
    #[serde(default)]
    pub video: VideoSettings,
    #[serde(default)]
    pub font_file: Option<PathBuf>,
    #[serde(default = "default_max_parallel_renders")]
    pub max_parallel_renders: usize,
    #[serde(default)]
    pub keep_work_files: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_frames_per_clip")]
    pub frames_per_clip: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            frames_per_clip: default_frames_per_clip(),
        }
    }
}

fn default_script_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static/output")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("static/uploads")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("clips")
}

fn default_history_path() -> PathBuf {
    PathBuf::from("movie_history.json")
}

fn default_url_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_width() -> u32 {
    832
}

fn default_height() -> u32 {
    480
}

fn default_fps() -> u32 {
    16
}

fn default_frames_per_clip() -> u32 {
    41
}

fn default_max_parallel_renders() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            script_model: default_script_model(),
            output_dir: default_output_dir(),
            upload_dir: default_upload_dir(),
            work_dir: default_work_dir(),
            history_path: default_history_path(),
            url_base_dir: default_url_base_dir(),
            video: VideoSettings::default(),
            font_file: None,
            max_parallel_renders: default_max_parallel_renders(),
            keep_work_files: false,
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        config.apply_env();

        if config.video.fps == 0 || config.video.frames_per_clip == 0 {
            anyhow::bail!("config.json: video.fps and video.frames_per_clip must be positive");
        }
        if config.max_parallel_renders == 0 {
            anyhow::bail!("config.json: max_parallel_renders must be at least 1");
        }

        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if fs::metadata(&path).await.is_ok() {
            return Self::load(path).await;
        }
        let mut config = Config::default();
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.gemini_api_key.is_empty() {
            if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
                self.gemini_api_key = key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"gemini_api_key":"k","video":{"width":640},"keep_work_files":true}"#,
        )
        .unwrap();

        let cfg = Config::load(&path).await.unwrap();
        assert_eq!(cfg.gemini_api_key, "k");
        assert_eq!(cfg.video.width, 640);
        assert_eq!(cfg.video.height, 480);
        assert_eq!(cfg.video.fps, 16);
        assert_eq!(cfg.script_model, "gemini-2.0-flash-exp");
        assert_eq!(cfg.output_dir, PathBuf::from("static/output"));
        assert!(cfg.keep_work_files);
        assert_eq!(cfg.max_parallel_renders, 1);
    }

    #[tokio::test]
    async fn rejects_zero_fps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"gemini_api_key":"k","video":{"fps":0}}"#).unwrap();
        assert!(Config::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load_or_default(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(cfg.video.frames_per_clip, 41);
        assert_eq!(cfg.history_path, PathBuf::from("movie_history.json"));
    }
}
