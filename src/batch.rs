use serde::{Deserialize, Serialize};

/// Why one item of a per-scene batch was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub index: usize,
    pub scene_id: u32,
    pub reason: String,
}

/// Results of a continue-on-failure loop: every success in input order plus
/// the reason each failed item was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialBatch<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<ItemFailure>,
}

impl<T> Default for PartialBatch<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> PartialBatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&mut self, item: T) {
        self.succeeded.push(item);
    }

    pub fn push_err(&mut self, index: usize, scene_id: u32, reason: impl Into<String>) {
        self.failed.push(ItemFailure {
            index,
            scene_id,
            reason: reason.into(),
        });
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn summary(&self) -> String {
        format!("{}/{} succeeded", self.succeeded.len(), self.attempted())
    }
}
