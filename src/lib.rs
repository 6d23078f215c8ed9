use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod api;
pub mod batch;
pub mod clips;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod generator;
pub mod genre;
pub mod history;
pub mod images;
pub mod init;
pub mod overlay;
pub mod render;
pub mod request;
pub mod script;
pub mod timeline;
pub mod transition;

pub use error::StudioError;
pub use generator::{MovieOutcome, Studio};
pub use history::{HistoryStore, MovieRecord};
pub use overlay::{MovieMetadata, Overlay, OverlayPosition, schedule};
pub use request::MovieRequest;
pub use script::{Scene, segment};
pub use timeline::{Clip, Timeline, compose};
pub use transition::{TransitionEffect, TransitionKind, TransitionSpec, select_transition};

pub type StudioLogHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<StudioLogHook>>> = Lazy::new(|| Mutex::new(None));

/// Mirrors every tagged progress line to `hook` in addition to `tracing`.
pub fn set_log_hook(hook: Option<StudioLogHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!(tag = tag, "{}", message),
        _ => tracing::info!(tag = tag, "{}", message),
    }

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                let line = format!("[{}] {}", tag, message);
                callback(&line);
            }
        }
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
