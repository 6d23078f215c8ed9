use crate::timeline::Clip;
use serde::{Deserialize, Serialize};

const HEADLINE_START: f64 = 0.5;
const HEADLINE_DURATION: f64 = 4.0;
const HEADLINE_FADE: f64 = 0.5;

const SCENE_LABEL_OFFSET: f64 = 0.5;
const SCENE_LABEL_DURATION: f64 = 2.0;
const SCENE_LABEL_FADE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    CenterTop,
    CenterBottom,
    RightTop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub text: String,
    pub position: OverlayPosition,
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub fade_in_seconds: f64,
    pub fade_out_seconds: f64,
}

impl Overlay {
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub title: String,
    pub genre: String,
    pub style: String,
}

/// Places the title card, the genre/style caption and one scene label per
/// clip. Scene labels are timed against nominal clip durations; crossfade
/// overlap is not subtracted.
pub fn schedule(clips: &[Clip], metadata: &MovieMetadata) -> Vec<Overlay> {
    let mut overlays = Vec::new();

    let title = metadata.title.trim();
    if !title.is_empty() {
        overlays.push(headline(title.to_string(), OverlayPosition::CenterTop));
    }

    if let Some(caption) = caption_text(&metadata.genre, &metadata.style) {
        overlays.push(headline(caption, OverlayPosition::CenterBottom));
    }

    if clips.len() > 1 {
        let mut elapsed = 0.0;
        for (idx, clip) in clips.iter().enumerate() {
            overlays.push(Overlay {
                text: format!("Scene {}", idx + 1),
                position: OverlayPosition::RightTop,
                start_seconds: elapsed + SCENE_LABEL_OFFSET,
                duration_seconds: SCENE_LABEL_DURATION,
                fade_in_seconds: SCENE_LABEL_FADE,
                fade_out_seconds: SCENE_LABEL_FADE,
            });
            elapsed += clip.duration;
        }
    }

    overlays
}

fn headline(text: String, position: OverlayPosition) -> Overlay {
    Overlay {
        text,
        position,
        start_seconds: HEADLINE_START,
        duration_seconds: HEADLINE_DURATION,
        fade_in_seconds: HEADLINE_FADE,
        fade_out_seconds: HEADLINE_FADE,
    }
}

fn caption_text(genre: &str, style: &str) -> Option<String> {
    let genre = genre.trim();
    let style = style.trim();
    match (genre.is_empty(), style.is_empty()) {
        (true, true) => None,
        (false, true) => Some(genre.to_string()),
        (true, false) => Some(style.to_string()),
        (false, false) => Some(format!("{} • {}", genre, style)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips(durations: &[f64]) -> Vec<Clip> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Clip::new(format!("clip_{i}.mp4"), i, *d))
            .collect()
    }

    fn meta(title: &str, genre: &str, style: &str) -> MovieMetadata {
        MovieMetadata {
            title: title.to_string(),
            genre: genre.to_string(),
            style: style.to_string(),
        }
    }

    fn scene_labels(overlays: &[Overlay]) -> Vec<&Overlay> {
        overlays
            .iter()
            .filter(|o| o.position == OverlayPosition::RightTop)
            .collect()
    }

    #[test]
    fn scene_labels_use_nominal_durations() {
        let overlays = schedule(&clips(&[5.0, 4.0, 6.0]), &meta("", "", ""));
        let labels = scene_labels(&overlays);
        let starts: Vec<f64> = labels.iter().map(|o| o.start_seconds).collect();
        assert_eq!(starts, vec![0.5, 5.5, 9.5]);
        for (idx, label) in labels.iter().enumerate() {
            assert_eq!(label.text, format!("Scene {}", idx + 1));
            assert_eq!(label.duration_seconds, 2.0);
            assert_eq!(label.fade_in_seconds, 0.3);
            assert_eq!(label.fade_out_seconds, 0.3);
        }
    }

    #[test]
    fn single_clip_has_no_scene_labels() {
        let overlays = schedule(&clips(&[3.0]), &meta("Night Run", "Action", "Noir"));
        assert!(scene_labels(&overlays).is_empty());
        assert_eq!(overlays.len(), 2);
    }

    #[test]
    fn title_and_caption_share_window() {
        let overlays = schedule(&clips(&[3.0]), &meta("Night Run", "Action", "Noir"));
        let title = overlays
            .iter()
            .find(|o| o.position == OverlayPosition::CenterTop)
            .unwrap();
        let caption = overlays
            .iter()
            .find(|o| o.position == OverlayPosition::CenterBottom)
            .unwrap();

        assert_eq!(title.text, "Night Run");
        assert_eq!(caption.text, "Action • Noir");
        for o in [title, caption] {
            assert_eq!(o.start_seconds, 0.5);
            assert_eq!(o.duration_seconds, 4.0);
            assert_eq!(o.fade_in_seconds, 0.5);
            assert_eq!(o.fade_out_seconds, 0.5);
            assert_eq!(o.end_seconds(), 4.5);
        }
    }

    #[test]
    fn caption_omits_empty_side() {
        let only_genre = schedule(&[], &meta("", "Horror", ""));
        assert_eq!(only_genre.len(), 1);
        assert_eq!(only_genre[0].text, "Horror");

        let only_style = schedule(&[], &meta("", "", "Anime"));
        assert_eq!(only_style[0].text, "Anime");
    }

    #[test]
    fn empty_metadata_and_no_clips_schedules_nothing() {
        assert!(schedule(&[], &MovieMetadata::default()).is_empty());
    }
}
