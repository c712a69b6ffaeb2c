//! Speech port contract
//!
//! Abstracts the underlying text-to-speech engine. The engine issues
//! fire-and-forget control calls through [`SpeechPort`]; the port
//! implementation delivers [`SpeechEvent`]s back over a `tokio::sync::mpsc`
//! channel. Every event carries the utterance id of the request that
//! produced it so the engine can discard events from superseded utterances.

use serde::{Deserialize, Serialize};

use katha_common::WordRange;

use crate::error::Result;

/// Identifier of one narration request, monotonically increasing per engine
pub type UtteranceId = u64;

/// Voice selection for one narration pass: a BCP-47 language tag, an
/// optional concrete voice identifier, and fallback languages tried in
/// order when the primary language has no installed voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelector {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
}

impl VoiceSelector {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            identifier: None,
            fallbacks: Vec::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_fallbacks<I>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fallbacks = fallbacks.into_iter().map(Into::into).collect();
        self
    }
}

/// One complete text-to-speech request for a single field of a single item
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub utterance_id: UtteranceId,
    pub text: String,
    pub voice: VoiceSelector,
    pub rate: f32,
}

/// Event payload emitted by a speech port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEventKind {
    /// The synthesizer is about to vocalize this range of the request text.
    /// Zero or more per utterance.
    WordBoundary(WordRange),
    /// The utterance played to its end. Exactly one per utterance that was
    /// not superseded by `stop()` or a new `speak()`.
    Finished,
    /// The utterance was cancelled by an explicit `stop()`. A cancelled
    /// utterance never also emits `Finished`.
    Cancelled,
}

/// Asynchronous notification from the speech engine, tagged with the
/// utterance that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechEvent {
    pub utterance_id: UtteranceId,
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn word_boundary(utterance_id: UtteranceId, range: WordRange) -> Self {
        Self {
            utterance_id,
            kind: SpeechEventKind::WordBoundary(range),
        }
    }

    pub fn finished(utterance_id: UtteranceId) -> Self {
        Self {
            utterance_id,
            kind: SpeechEventKind::Finished,
        }
    }

    pub fn cancelled(utterance_id: UtteranceId) -> Self {
        Self {
            utterance_id,
            kind: SpeechEventKind::Cancelled,
        }
    }
}

/// Contract the engine requires from any speech synthesizer implementation
///
/// Control calls are fire-and-forget: they must return promptly and never
/// block on audio. The engine guarantees it never calls `speak` while a
/// prior utterance is in flight without first calling `stop` or receiving
/// that utterance's terminal event. `stop` must be a no-op when idle.
pub trait SpeechPort: Send + Sync {
    /// Begin synthesizing one utterance. Fails with
    /// [`crate::Error::SpeechUnavailable`] when the requested voice cannot
    /// be produced.
    fn speak(&self, request: SpeechRequest) -> Result<()>;

    /// Suspend the in-flight utterance, preserving its position
    fn pause(&self);

    /// Continue a paused utterance
    fn resume(&self);

    /// Cancel the in-flight utterance, if any
    fn stop(&self);
}
