use crate::error::{Result, StudioError};
use crate::overlay::{self, MovieMetadata, Overlay};
use crate::request::MovieRequest;
use crate::transition::{self, TransitionSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const TIMELINE_FADE_SECONDS: f64 = 0.5;

/// One rendered scene video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub source_path: PathBuf,
    pub order: usize,
    /// Seconds, as measured after the clip was rendered.
    pub duration: f64,
}

impl Clip {
    pub fn new(source_path: impl Into<PathBuf>, order: usize, duration: f64) -> Self {
        Self {
            source_path: source_path.into(),
            order,
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub clip: Clip,
    /// Seconds this clip overlaps the tail of the previous one.
    pub crossfade_in: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub transition: Option<TransitionSpec>,
    pub overlays: Vec<Overlay>,
    pub fade_in_seconds: f64,
    pub fade_out_seconds: f64,
}

impl Timeline {
    pub fn total_clips(&self) -> usize {
        self.entries.len()
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.entries.iter().map(|e| &e.clip)
    }

    pub fn crossfade_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.crossfade_in.is_some())
            .count()
    }

    /// Expected length once adjacent clips overlap. Renderers use this to
    /// place the closing fade; the recorded duration is always measured from
    /// the encoded file.
    pub fn blended_duration(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.clip.duration - e.crossfade_in.unwrap_or(0.0))
            .sum::<f64>()
            .max(0.0)
    }
}

/// Assembles ordered clips into a timeline with genre-dependent crossfades,
/// whole-timeline fades and scheduled text overlays.
pub fn compose(clips: Vec<Clip>, metadata: &MovieMetadata, request: &MovieRequest) -> Result<Timeline> {
    if clips.is_empty() {
        return Err(StudioError::NoInputClips);
    }

    let overlays = overlay::schedule(&clips, metadata);

    let transition = if clips.len() > 1 {
        Some(transition::select_transition(&request.genre))
    } else {
        None
    };

    let entries = clips
        .into_iter()
        .enumerate()
        .map(|(idx, clip)| TimelineEntry {
            clip,
            crossfade_in: match (idx, transition) {
                (0, _) | (_, None) => None,
                (_, Some(spec)) => Some(spec.duration_seconds),
            },
        })
        .collect();

    Ok(Timeline {
        entries,
        transition,
        overlays,
        fade_in_seconds: TIMELINE_FADE_SECONDS,
        fade_out_seconds: TIMELINE_FADE_SECONDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayPosition;

    fn clips(durations: &[f64]) -> Vec<Clip> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Clip::new(format!("clips/clip_{i}.mp4"), i, *d))
            .collect()
    }

    fn request(genre: &str) -> MovieRequest {
        MovieRequest {
            title: "Night Run".to_string(),
            genre: genre.to_string(),
            style: "Cinematic".to_string(),
            ..MovieRequest::default()
        }
    }

    #[test]
    fn zero_clips_is_an_input_error() {
        let req = request("Action");
        let err = compose(Vec::new(), &req.metadata(), &req).unwrap_err();
        assert!(matches!(err, StudioError::NoInputClips));
    }

    #[test]
    fn single_clip_has_no_transition() {
        let req = request("Action");
        let timeline = compose(clips(&[4.0]), &req.metadata(), &req).unwrap();

        assert_eq!(timeline.total_clips(), 1);
        assert!(timeline.transition.is_none());
        assert_eq!(timeline.crossfade_count(), 0);
        assert!(
            !timeline
                .overlays
                .iter()
                .any(|o| o.position == OverlayPosition::RightTop)
        );
        assert!(
            timeline
                .overlays
                .iter()
                .any(|o| o.position == OverlayPosition::CenterTop && o.text == "Night Run")
        );
        assert!(
            timeline
                .overlays
                .iter()
                .any(|o| o.position == OverlayPosition::CenterBottom)
        );
    }

    #[test]
    fn every_clip_after_first_crossfades() {
        let req = request("Romance");
        let timeline = compose(clips(&[5.0, 4.0, 6.0]), &req.metadata(), &req).unwrap();

        let spec = timeline.transition.unwrap();
        assert_eq!(spec.duration_seconds, 1.2);
        let fades: Vec<Option<f64>> = timeline.entries.iter().map(|e| e.crossfade_in).collect();
        assert_eq!(fades, vec![None, Some(1.2), Some(1.2)]);
        assert_eq!(timeline.crossfade_count(), 2);
    }

    #[test]
    fn whole_timeline_fades_are_fixed() {
        let req = request("Drama");
        let timeline = compose(clips(&[2.0, 2.0]), &req.metadata(), &req).unwrap();
        assert_eq!(timeline.fade_in_seconds, 0.5);
        assert_eq!(timeline.fade_out_seconds, 0.5);
    }

    #[test]
    fn unknown_genre_uses_drama_crossfade() {
        let req = request("Mockumentary");
        let timeline = compose(clips(&[3.0, 3.0]), &req.metadata(), &req).unwrap();
        assert_eq!(timeline.transition, Some(transition::select_transition("drama")));
    }

    #[test]
    fn scene_labels_ignore_overlap() {
        let req = request("Action");
        let timeline = compose(clips(&[5.0, 4.0, 6.0]), &req.metadata(), &req).unwrap();
        let starts: Vec<f64> = timeline
            .overlays
            .iter()
            .filter(|o| o.position == OverlayPosition::RightTop)
            .map(|o| o.start_seconds)
            .collect();
        assert_eq!(starts, vec![0.5, 5.5, 9.5]);
    }

    #[test]
    fn blended_duration_subtracts_overlap() {
        let req = request("Drama");
        let timeline = compose(clips(&[5.0, 4.0, 6.0]), &req.metadata(), &req).unwrap();
        assert!((timeline.blended_duration() - 13.0).abs() < 1e-9);
    }

    #[test]
    fn clip_order_is_preserved() {
        let req = request("Action");
        let timeline = compose(clips(&[1.0, 2.0, 3.0]), &req.metadata(), &req).unwrap();
        let orders: Vec<usize> = timeline.clips().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}
