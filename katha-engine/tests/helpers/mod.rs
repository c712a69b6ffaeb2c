//! Test helper infrastructure for katha-engine integration tests
//!
//! Provides a recording speech port and progress sink plus document
//! builders shared across the test suites.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use katha_common::{Document, DocumentBuilder, Item, SectionKind};
use katha_engine::{
    EngineConfig, Error, PlaybackEngine, ProgressSink, Result, SpeechPort, SpeechRequest,
};

/// One recorded call against the speech port
#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    Speak {
        utterance_id: u64,
        text: String,
        language: String,
        rate: f32,
    },
    Pause,
    Resume,
    Stop,
}

/// Speech port spy: records every call, emits nothing on its own.
/// Tests deliver speech events by calling `handle_speech_event` directly
/// (or through the engine's channel) with utterance ids read back from the
/// recorded speak calls.
#[derive(Default)]
pub struct ScriptedSpeechPort {
    calls: Mutex<Vec<PortCall>>,
    unavailable_languages: Mutex<HashSet<String>>,
}

impl ScriptedSpeechPort {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `speak` fail with SpeechUnavailable for one language
    pub fn mark_unavailable(&self, language: &str) {
        self.unavailable_languages
            .lock()
            .unwrap()
            .insert(language.to_string());
    }

    pub fn calls(&self) -> Vec<PortCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the speak calls, in order
    pub fn speaks(&self) -> Vec<PortCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, PortCall::Speak { .. }))
            .collect()
    }

    pub fn speak_count(&self) -> usize {
        self.speaks().len()
    }

    /// Utterance id of the most recent speak call
    pub fn active_utterance(&self) -> u64 {
        match self.speaks().last() {
            Some(PortCall::Speak { utterance_id, .. }) => *utterance_id,
            _ => panic!("no speak call recorded"),
        }
    }

    /// Text of the most recent speak call
    pub fn last_text(&self) -> String {
        match self.speaks().last() {
            Some(PortCall::Speak { text, .. }) => text.clone(),
            _ => panic!("no speak call recorded"),
        }
    }

    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PortCall::Stop))
            .count()
    }
}

impl SpeechPort for ScriptedSpeechPort {
    fn speak(&self, request: SpeechRequest) -> Result<()> {
        if self
            .unavailable_languages
            .lock()
            .unwrap()
            .contains(&request.voice.language)
        {
            return Err(Error::SpeechUnavailable(format!(
                "no voice for {}",
                request.voice.language
            )));
        }
        self.calls.lock().unwrap().push(PortCall::Speak {
            utterance_id: request.utterance_id,
            text: request.text,
            language: request.voice.language,
            rate: request.rate,
        });
        Ok(())
    }

    fn pause(&self) {
        self.calls.lock().unwrap().push(PortCall::Pause);
    }

    fn resume(&self) {
        self.calls.lock().unwrap().push(PortCall::Resume);
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push(PortCall::Stop);
    }
}

/// Progress sink spy that keeps every call (duplicates included), so tests
/// can assert exact call counts
#[derive(Default)]
pub struct RecordingProgressSink {
    records: Mutex<Vec<(String, i32)>>,
}

impl RecordingProgressSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<(String, i32)> {
        self.records.lock().unwrap().clone()
    }

    pub fn count_for(&self, item_number: i32) -> usize {
        self.records()
            .iter()
            .filter(|(_, n)| *n == item_number)
            .count()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn record_completed(&self, prayer_id: &str, item_number: i32) {
        self.records
            .lock()
            .unwrap()
            .push((prayer_id.to_string(), item_number));
    }
}

pub fn item(number: i32) -> Item {
    Item {
        number,
        original_text: format!("original {number}"),
        explanation_text: format!("explanation {number}"),
        transliteration: None,
    }
}

/// Document matching the shape of the original prayer: two opening dohas,
/// three main verses, one closing doha
pub fn test_document() -> Document {
    DocumentBuilder::new("hanuman-chalisa")
        .title("Test Chalisa")
        .item(SectionKind::Opening, item(-1))
        .item(SectionKind::Opening, item(-2))
        .item(SectionKind::Main, item(1))
        .item(SectionKind::Main, item(2))
        .item(SectionKind::Main, item(3))
        .item(SectionKind::Closing, item(-3))
        .build()
        .unwrap()
}

/// Engine wired to spy collaborators with the default two-voice config
pub fn test_engine() -> (
    PlaybackEngine,
    Arc<ScriptedSpeechPort>,
    Arc<RecordingProgressSink>,
) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("katha_engine=debug")
        .with_test_writer()
        .try_init();

    let port = ScriptedSpeechPort::new();
    let sink = RecordingProgressSink::new();
    let engine = PlaybackEngine::new(
        Arc::new(test_document()),
        Arc::clone(&port) as Arc<dyn SpeechPort>,
        Arc::clone(&sink) as Arc<dyn ProgressSink>,
        EngineConfig::default(),
    );
    (engine, port, sink)
}
