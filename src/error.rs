use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("no input clips to compose")]
    NoInputClips,

    #[error("script generation error: {0}")]
    Script(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("history store error: {0}")]
    History(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StudioError>;
