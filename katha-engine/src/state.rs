//! Shared playback state
//!
//! Thread-safe published state for observers. Observers receive read-only
//! snapshots and a broadcast event stream; only the engine's transition
//! code writes here.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use katha_common::{PlaybackEvent, PlaybackPosition, PlaybackStatus, WordRange};

/// Read-only projection of the engine state at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Current status (Idle, Playing, Paused)
    pub status: PlaybackStatus,

    /// Current narration position; None when Idle
    pub position: Option<PlaybackPosition>,

    /// Word currently being vocalized; non-None only while Playing and
    /// after at least one word boundary for the current field
    pub current_word_range: Option<WordRange>,
}

impl PlaybackSnapshot {
    pub fn idle() -> Self {
        Self {
            status: PlaybackStatus::Idle,
            position: None,
            current_word_range: None,
        }
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Shared state accessible by observers
///
/// Uses RwLock for concurrent read access with writes only from the engine.
pub struct SharedState {
    /// Latest published snapshot
    snapshot: RwLock<PlaybackSnapshot>,

    /// Event broadcaster for playback observers
    event_tx: broadcast::Sender<PlaybackEvent>,

    /// Count of speech events dropped because their utterance id did not
    /// match the active utterance. Not an error; exposed for monitoring
    /// and tests.
    stale_events_total: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            snapshot: RwLock::new(PlaybackSnapshot::idle()),
            event_tx,
            stale_events_total: AtomicU64::new(0),
        }
    }

    /// Broadcast an event to all observers
    pub fn broadcast_event(&self, event: PlaybackEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the playback event stream
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }

    /// Get the latest published snapshot
    pub async fn snapshot(&self) -> PlaybackSnapshot {
        *self.snapshot.read().await
    }

    /// Publish a new snapshot (engine-internal)
    pub(crate) async fn publish(&self, snapshot: PlaybackSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Get current playback status
    pub async fn status(&self) -> PlaybackStatus {
        self.snapshot.read().await.status
    }

    /// Get current narration position
    pub async fn position(&self) -> Option<PlaybackPosition> {
        self.snapshot.read().await.position
    }

    /// Get the word range currently being vocalized
    pub async fn current_word_range(&self) -> Option<WordRange> {
        self.snapshot.read().await.current_word_range
    }

    /// Increment the stale-event counter (engine-internal)
    pub(crate) fn increment_stale_events(&self) {
        self.stale_events_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of stale speech events dropped since startup
    pub fn stale_events_total(&self) -> u64 {
        self.stale_events_total.load(Ordering::Relaxed)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katha_common::{Field, SectionKind};

    #[tokio::test]
    async fn starts_idle() {
        let state = SharedState::new();
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.status, PlaybackStatus::Idle);
        assert!(snapshot.position.is_none());
        assert!(snapshot.current_word_range.is_none());
        assert_eq!(state.stale_events_total(), 0);
    }

    #[tokio::test]
    async fn publish_replaces_snapshot() {
        let state = SharedState::new();
        let position = PlaybackPosition::new(SectionKind::Main, 4, Field::Original);

        state
            .publish(PlaybackSnapshot {
                status: PlaybackStatus::Playing,
                position: Some(position),
                current_word_range: Some(WordRange::new(0, 4)),
            })
            .await;

        assert_eq!(state.status().await, PlaybackStatus::Playing);
        assert_eq!(state.position().await, Some(position));
        assert_eq!(state.current_word_range().await, Some(WordRange::new(0, 4)));
    }

    #[tokio::test]
    async fn broadcasts_to_subscribers() {
        let state = SharedState::new();
        let mut rx = state.subscribe();

        state.broadcast_event(PlaybackEvent::StateChanged {
            status: PlaybackStatus::Playing,
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            PlaybackEvent::StateChanged {
                status: PlaybackStatus::Playing,
                ..
            }
        ));
    }

    #[test]
    fn snapshot_serializes_for_observers() {
        let snapshot = PlaybackSnapshot {
            status: PlaybackStatus::Paused,
            position: Some(PlaybackPosition::new(SectionKind::Opening, 1, Field::Explanation)),
            current_word_range: None,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"status\":\"paused\""));
        let back: PlaybackSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[tokio::test]
    async fn stale_counter_accumulates() {
        let state = SharedState::new();
        state.increment_stale_events();
        state.increment_stale_events();
        assert_eq!(state.stale_events_total(), 2);
    }
}
