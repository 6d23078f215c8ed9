use crate::overlay::MovieMetadata;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NUM_SCENES: u32 = 5;

/// What the user asked for. Missing fields take the same defaults the
/// creation form uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRequest {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_genre")]
    pub genre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_num_scenes")]
    pub num_scenes: u32,
}

fn default_title() -> String {
    "Untitled Movie".to_string()
}

fn default_genre() -> String {
    "Action".to_string()
}

fn default_style() -> String {
    "Cinematic".to_string()
}

fn default_num_scenes() -> u32 {
    DEFAULT_NUM_SCENES
}

impl Default for MovieRequest {
    fn default() -> Self {
        Self {
            title: default_title(),
            genre: default_genre(),
            description: String::new(),
            style: default_style(),
            num_scenes: default_num_scenes(),
        }
    }
}

impl MovieRequest {
    pub fn metadata(&self) -> MovieMetadata {
        MovieMetadata {
            title: self.title.clone(),
            genre: self.genre.clone(),
            style: self.style.clone(),
        }
    }
}
