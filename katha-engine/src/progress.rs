//! Listening progress sink
//!
//! Fire-and-forget notification that an item was heard end-to-end (both
//! narration passes finished during uninterrupted forward playback). The
//! engine never reads progress back; persistence is the sink's concern.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use tracing::debug;

/// Consumer of "item heard" notifications
pub trait ProgressSink: Send + Sync {
    /// Called once per item whose Explanation pass finishes narrating.
    /// Never called for skipped items.
    fn record_completed(&self, prayer_id: &str, item_number: i32);
}

/// In-memory progress sink for tests and apps without persistent storage
#[derive(Debug, Default)]
pub struct MemoryProgressSink {
    listened: Mutex<BTreeMap<String, BTreeSet<i32>>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item numbers recorded for a prayer, in ascending order
    pub fn completed_items(&self, prayer_id: &str) -> Vec<i32> {
        self.listened
            .lock()
            .expect("progress sink lock poisoned")
            .get(prayer_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl ProgressSink for MemoryProgressSink {
    fn record_completed(&self, prayer_id: &str, item_number: i32) {
        debug!("Recording completion: prayer={prayer_id} item={item_number}");
        self.listened
            .lock()
            .expect("progress sink lock poisoned")
            .entry(prayer_id.to_string())
            .or_default()
            .insert(item_number);
    }
}
