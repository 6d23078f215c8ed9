use crate::genre::Genre;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Crossfade,
}

/// Descriptive label carried with a transition. Rendering always performs a
/// symmetric crossfade; the effect does not change the blend curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEffect {
    Fast,
    Smooth,
    Bounce,
    Fade,
    Glitch,
    Magic,
    Sharp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    pub duration_seconds: f64,
    pub effect: TransitionEffect,
}

impl TransitionSpec {
    const fn crossfade(duration_seconds: f64, effect: TransitionEffect) -> Self {
        Self {
            kind: TransitionKind::Crossfade,
            duration_seconds,
            effect,
        }
    }

    pub fn for_genre(genre: Genre) -> Self {
        match genre {
            Genre::Action => Self::crossfade(0.3, TransitionEffect::Fast),
            Genre::Adventure => Self::crossfade(0.8, TransitionEffect::Smooth),
            Genre::Comedy => Self::crossfade(0.5, TransitionEffect::Bounce),
            Genre::Drama => Self::crossfade(1.0, TransitionEffect::Smooth),
            Genre::Horror => Self::crossfade(0.6, TransitionEffect::Glitch),
            Genre::Romance => Self::crossfade(1.2, TransitionEffect::Fade),
            Genre::SciFi => Self::crossfade(0.7, TransitionEffect::Glitch),
            Genre::Fantasy => Self::crossfade(1.0, TransitionEffect::Magic),
            Genre::Thriller => Self::crossfade(0.4, TransitionEffect::Sharp),
        }
    }
}

/// Picks the transition for a free-form genre string. Unknown genres get the
/// drama transition.
pub fn select_transition(genre: &str) -> TransitionSpec {
    TransitionSpec::for_genre(Genre::resolve(genre))
}
