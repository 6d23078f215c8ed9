use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SCENE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)scene").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: u32,
    pub title: String,
    pub content: String,
    pub genre: String,
    pub style: String,
}

struct SceneBuilder {
    title: String,
    lines: Vec<String>,
}

/// Splits generated script text into ordered scenes.
///
/// A trimmed line starting with "scene" (any casing) opens a new scene and
/// becomes its title. Non-blank lines that follow form its body. Headings
/// without a body are dropped. When nothing survives, a single fallback scene
/// holding the whole trimmed script is returned, so the result is never empty.
pub fn segment(raw_script: &str, genre: &str, style: &str) -> Vec<Scene> {
    let mut scenes: Vec<Scene> = Vec::new();
    let mut current: Option<SceneBuilder> = None;

    for line in raw_script.lines() {
        let trimmed = line.trim();
        if is_scene_boundary(trimmed) {
            if let Some(done) = current.take() {
                flush(&mut scenes, done, genre, style);
            }
            current = Some(SceneBuilder {
                title: trimmed.to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        if let Some(builder) = current.as_mut() {
            builder.lines.push(line.to_string());
        }
    }

    if let Some(done) = current.take() {
        flush(&mut scenes, done, genre, style);
    }

    if scenes.is_empty() {
        scenes.push(Scene {
            id: 1,
            title: format!("Scene 1: {} {} Movie", genre, style),
            content: raw_script.trim().to_string(),
            genre: genre.to_string(),
            style: style.to_string(),
        });
    }

    scenes
}

fn flush(scenes: &mut Vec<Scene>, builder: SceneBuilder, genre: &str, style: &str) {
    if builder.lines.is_empty() {
        return;
    }
    let content = builder.lines.join("\n").trim().to_string();
    if content.is_empty() {
        return;
    }
    scenes.push(Scene {
        id: scenes.len() as u32 + 1,
        title: builder.title,
        content,
        genre: genre.to_string(),
        style: style.to_string(),
    });
}

fn is_scene_boundary(trimmed: &str) -> bool {
    SCENE_RE.is_match(trimmed)
}
