//! # Katha Playback Engine (katha-engine)
//!
//! Sequential narrated-playback state machine for prayer documents.
//!
//! **Purpose:** Walk an ordered document tree (opening dohas → main verses →
//! closing doha), drive an external text-to-speech port through two narration
//! passes per item (original text, then explanation), keep a published
//! "current word" projection in sync with word-boundary events, and expose
//! pause/resume/stop/skip controls with race-free semantics under
//! asynchronous speech callbacks.
//!
//! **Architecture:** Single-writer state machine — every control operation
//! and every speech event runs inside one async mutex. Speech events are
//! tagged with a monotonically increasing utterance id; events from
//! superseded utterances are counted and dropped.

pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod speech;
pub mod state;

pub use config::EngineConfig;
pub use engine::PlaybackEngine;
pub use error::{Error, Result};
pub use progress::{MemoryProgressSink, ProgressSink};
pub use speech::{SpeechEvent, SpeechEventKind, SpeechPort, SpeechRequest, VoiceSelector};
pub use state::{PlaybackSnapshot, SharedState};
