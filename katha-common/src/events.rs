//! Event types for the katha playback event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::SectionKind;
use crate::position::Field;

/// Playback status published to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Character range of the word currently being vocalized, relative to the
/// text of the field being narrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub offset: usize,
    pub len: usize,
}

impl WordRange {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }
}

/// Katha playback event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaybackEvent {
    /// Playback status changed
    StateChanged {
        status: PlaybackStatus,
        timestamp: DateTime<Utc>,
    },

    /// Narration moved to a new (section, item, field) position
    PositionChanged {
        section: SectionKind,
        item_number: i32,
        field: Field,
        timestamp: DateTime<Utc>,
    },

    /// The speech engine reached a new word within the current field
    WordBoundary {
        item_number: i32,
        field: Field,
        range: WordRange,
        timestamp: DateTime<Utc>,
    },

    /// An item finished both narration passes during forward playback
    ItemCompleted {
        prayer_id: String,
        item_number: i32,
        timestamp: DateTime<Utc>,
    },

    /// The last field of the last item finished; playback is now Idle
    PlaybackFinished {
        prayer_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Playback stopped because of a failure; status is Idle
    PlaybackError {
        message: String,
        timestamp: DateTime<Utc>,
    },
}
