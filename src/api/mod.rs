pub mod gemini;

use crate::request::MovieRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Produces free-form script text for a movie request.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_script(&self, request: &MovieRequest) -> Result<String>;
}

pub fn script_prompt(request: &MovieRequest) -> String {
    format!(
        "Generate a movie script based on the following details:\n\
Title: {title}\n\
Genre: {genre}\n\
Description: {description}\n\
Style: {style}\n\
\n\
Please create a script with exactly {scenes} scenes. Format each scene as:\n\
Scene [number]: [Scene Title]\n\
[Scene description and dialogue]\n\
\n\
Make it vivid and engaging, suitable for the {genre} genre and {style} style.",
        title = request.title,
        genre = request.genre,
        description = request.description,
        style = request.style,
        scenes = request.num_scenes.max(1),
    )
}
