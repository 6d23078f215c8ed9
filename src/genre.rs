//! Known genres and visual styles.
//!
//! Free-form request strings are resolved here once. Every lookup that used
//! to be a string-keyed table (transition settings, prompt fragments, negative
//! prompts) is a `match` over these enums, so adding a variant forces every
//! table to be extended.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Action,
    Adventure,
    Comedy,
    Drama,
    Horror,
    Romance,
    SciFi,
    Fantasy,
    Thriller,
}

impl Genre {
    pub const ALL: [Genre; 9] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Comedy,
        Genre::Drama,
        Genre::Horror,
        Genre::Romance,
        Genre::SciFi,
        Genre::Fantasy,
        Genre::Thriller,
    ];

    /// Case-insensitive match against the known genre tags.
    pub fn parse(tag: &str) -> Option<Genre> {
        let tag = tag.trim().to_lowercase();
        let genre = match tag.as_str() {
            "action" => Genre::Action,
            "adventure" => Genre::Adventure,
            "comedy" => Genre::Comedy,
            "drama" => Genre::Drama,
            "horror" => Genre::Horror,
            "romance" => Genre::Romance,
            "sci-fi" => Genre::SciFi,
            "fantasy" => Genre::Fantasy,
            "thriller" => Genre::Thriller,
            _ => return None,
        };
        Some(genre)
    }

    /// Like [`Genre::parse`], but unknown or empty tags resolve to
    /// [`Genre::Drama`].
    pub fn resolve(tag: &str) -> Genre {
        Genre::parse(tag).unwrap_or(Genre::Drama)
    }

    pub fn mood(self) -> &'static str {
        match self {
            Genre::Action => "dynamic motion, high energy",
            Genre::Adventure => "sweeping vistas, sense of discovery",
            Genre::Comedy => "bright, playful framing",
            Genre::Drama => "intimate, emotional lighting",
            Genre::Horror => "dark shadows, unsettling atmosphere",
            Genre::Romance => "soft warm light, tender mood",
            Genre::SciFi => "futuristic technology, neon accents",
            Genre::Fantasy => "magical glow, mythical scenery",
            Genre::Thriller => "tense, high contrast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Cinematic,
    Anime,
    Realistic,
    Cartoon,
    Noir,
    Vintage,
    Watercolor,
}

impl Style {
    pub fn parse(tag: &str) -> Option<Style> {
        let tag = tag.trim().to_lowercase();
        let style = match tag.as_str() {
            "cinematic" => Style::Cinematic,
            "anime" => Style::Anime,
            "realistic" => Style::Realistic,
            "cartoon" => Style::Cartoon,
            "noir" => Style::Noir,
            "vintage" => Style::Vintage,
            "watercolor" => Style::Watercolor,
            _ => return None,
        };
        Some(style)
    }

    /// Unknown or empty tags resolve to [`Style::Cinematic`].
    pub fn resolve(tag: &str) -> Style {
        Style::parse(tag).unwrap_or(Style::Cinematic)
    }

    pub fn prompt_fragment(self) -> &'static str {
        match self {
            Style::Cinematic => "cinematic lighting, shallow depth of field, film grain",
            Style::Anime => "anime style, cel shading, vibrant colors",
            Style::Realistic => "photorealistic, natural lighting, detailed textures",
            Style::Cartoon => "cartoon style, bold outlines, flat colors",
            Style::Noir => "black and white film noir, hard shadows",
            Style::Vintage => "vintage film look, faded colors, light leaks",
            Style::Watercolor => "watercolor painting, soft edges, paper texture",
        }
    }

    pub fn negative_prompt(self) -> &'static str {
        match self {
            Style::Cinematic | Style::Realistic => "low quality, blurry, static",
            Style::Anime | Style::Cartoon => "low quality, blurry, static, photorealistic",
            Style::Noir => "low quality, blurry, static, color",
            Style::Vintage => "low quality, blurry, static, digital artifacts",
            Style::Watercolor => "low quality, blurry, static, hard edges",
        }
    }
}
