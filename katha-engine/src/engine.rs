//! Playback engine orchestration
//!
//! The sequential narrated-playback state machine. Owns "what section/item/
//! field is currently being spoken", advances through the document across
//! the two narration passes per item, and exposes the control operations.
//!
//! Every mutation runs inside one async mutex, so control operations and
//! speech events never interleave mid-transition. Each narration request is
//! tagged with a monotonically increasing utterance id; events carrying any
//! other id are counted as stale and dropped.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use katha_common::{
    Document, Field, PlaybackEvent, PlaybackPosition, PlaybackStatus, WordRange,
};

use crate::config::{EngineConfig, MAX_RATE, MIN_RATE};
use crate::error::{Error, Result};
use crate::progress::ProgressSink;
use crate::speech::{SpeechEvent, SpeechEventKind, SpeechPort, SpeechRequest, UtteranceId};
use crate::state::{PlaybackSnapshot, SharedState};

/// Mutable engine state, guarded by the transition mutex
struct EngineInner {
    status: PlaybackStatus,

    /// Current narration position; Some exactly when status != Idle
    position: Option<PlaybackPosition>,

    /// Word currently being vocalized; Some only while Playing
    current_word_range: Option<WordRange>,

    /// Word range preserved across pause/resume
    saved_word_range: Option<WordRange>,

    /// Utterance the engine currently expects events for
    active_utterance: Option<UtteranceId>,

    /// Next utterance id to assign
    next_utterance_id: UtteranceId,

    /// Set when a skip happened while Paused: the new position has not been
    /// spoken yet, and resume() must issue narration instead of resuming
    narration_deferred: bool,

    /// Speech rate applied to narration requests
    rate: f32,
}

impl EngineInner {
    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            position: self.position,
            current_word_range: self.current_word_range,
        }
    }

    fn reset_to_idle(&mut self) {
        self.status = PlaybackStatus::Idle;
        self.position = None;
        self.current_word_range = None;
        self.saved_word_range = None;
        self.active_utterance = None;
        self.narration_deferred = false;
    }
}

/// Playback engine - drives the speech port through the document in
/// narration order
pub struct PlaybackEngine {
    /// Prayer being narrated
    document: Arc<Document>,

    /// Speech synthesizer port (external collaborator)
    speech: Arc<dyn SpeechPort>,

    /// Listening progress sink (external collaborator)
    progress: Arc<dyn ProgressSink>,

    /// Voice selection per field
    config: EngineConfig,

    /// Published state + event broadcaster
    state: Arc<SharedState>,

    /// Transition state, single writer
    inner: Arc<Mutex<EngineInner>>,
}

impl PlaybackEngine {
    /// Create a new playback engine for one document
    pub fn new(
        document: Arc<Document>,
        speech: Arc<dyn SpeechPort>,
        progress: Arc<dyn ProgressSink>,
        config: EngineConfig,
    ) -> Self {
        info!("Creating playback engine for document '{}'", document.id());
        let config = config.normalized();
        let rate = config.rate;

        Self {
            document,
            speech,
            progress,
            config,
            state: Arc::new(SharedState::new()),
            inner: Arc::new(Mutex::new(EngineInner {
                status: PlaybackStatus::Idle,
                position: None,
                current_word_range: None,
                saved_word_range: None,
                active_utterance: None,
                next_utterance_id: 1,
                narration_deferred: false,
                rate,
            })),
        }
    }

    /// Spawn the speech-event consumer task
    ///
    /// The speech port implementation holds the sending half of the channel.
    pub fn start(&self, mut events: mpsc::Receiver<SpeechEvent>) {
        info!("Starting playback engine event loop");
        let engine = self.clone_handles();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                engine.handle_speech_event(event).await;
            }
            debug!("Speech event channel closed, event loop exiting");
        });
    }

    /// Shared state handle for observers
    pub fn shared_state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Subscribe to the playback event stream
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PlaybackEvent> {
        self.state.subscribe()
    }

    /// Document being narrated
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current playback status
    pub async fn status(&self) -> PlaybackStatus {
        self.state.status().await
    }

    /// Current narration position
    pub async fn position(&self) -> Option<PlaybackPosition> {
        self.state.position().await
    }

    /// Word range currently being vocalized
    pub async fn current_word_range(&self) -> Option<WordRange> {
        self.state.current_word_range().await
    }

    /// Count of stale speech events dropped since startup
    pub fn stale_events_total(&self) -> u64 {
        self.state.stale_events_total()
    }

    /// Begin narration from the first item of the document
    pub async fn play_from_start(&self) -> Result<()> {
        info!("Play-from-start command received");
        let position = self
            .document
            .first_position()
            .ok_or_else(|| Error::Internal("document has no items".into()))?;
        self.restart_at(position).await
    }

    /// Begin narration from the item with the given verse number
    pub async fn play_from(&self, number: i32) -> Result<()> {
        info!("Play-from command received: verse {number}");
        let (section, index) = self
            .document
            .find_by_number(number)
            .ok_or(Error::UnknownVerseNumber(number))?;
        self.restart_at(PlaybackPosition::new(section, index, Field::Original))
            .await
    }

    /// Pause narration. No-op unless Playing.
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;
        if inner.status != PlaybackStatus::Playing {
            debug!("Pause ignored: status is {:?}", inner.status);
            return;
        }
        info!("Pause command received");

        self.speech.pause();
        inner.saved_word_range = inner.current_word_range.take();
        inner.status = PlaybackStatus::Paused;

        self.publish(&inner).await;
        self.emit_state_changed(PlaybackStatus::Paused);
    }

    /// Resume narration. No-op unless Paused.
    pub async fn resume(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.status != PlaybackStatus::Paused {
            debug!("Resume ignored: status is {:?}", inner.status);
            return Ok(());
        }
        info!("Resume command received");

        if inner.narration_deferred {
            // A skip happened while paused: the current position was never
            // spoken, so cancel the superseded paused utterance and start a
            // fresh one instead of resuming.
            self.speech.stop();
            inner.narration_deferred = false;
            inner.current_word_range = None;
            inner.status = PlaybackStatus::Playing;
            let position = inner
                .position
                .ok_or_else(|| Error::Internal("paused without a position".into()))?;
            if let Err(e) = self.issue_narration(&mut inner, position) {
                return self.fail_to_idle(&mut inner, e).await;
            }
        } else {
            inner.current_word_range = inner.saved_word_range.take();
            inner.status = PlaybackStatus::Playing;
            self.speech.resume();
        }

        self.publish(&inner).await;
        self.emit_state_changed(PlaybackStatus::Playing);
        Ok(())
    }

    /// Stop narration and return to Idle. Safe to call repeatedly.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        info!("Stop command received (status {:?})", inner.status);

        self.speech.stop();
        inner.reset_to_idle();

        self.publish(&inner).await;
        self.emit_state_changed(PlaybackStatus::Idle);
    }

    /// Skip to the next item's original text. No-op when Idle or at the
    /// last item.
    pub async fn skip_next(&self) -> Result<()> {
        self.skip(|doc, pos| doc.next_item_position(pos)).await
    }

    /// Skip to the previous item's original text. No-op when Idle or at
    /// the first item.
    pub async fn skip_previous(&self) -> Result<()> {
        self.skip(|doc, pos| doc.previous_item_position(pos)).await
    }

    /// Set the speech rate for subsequent narration requests
    pub async fn set_rate(&self, rate: f32) {
        let mut inner = self.inner.lock().await;
        inner.rate = rate.clamp(MIN_RATE, MAX_RATE);
        debug!("Speech rate set to {}", inner.rate);
    }

    /// Process one speech event from the port
    ///
    /// Public so tests can drive the engine deterministically without the
    /// spawned event loop.
    pub async fn handle_speech_event(&self, event: SpeechEvent) {
        let mut inner = self.inner.lock().await;

        // Drop anything from a superseded utterance before looking at state
        if inner.active_utterance != Some(event.utterance_id) {
            self.state.increment_stale_events();
            debug!(
                "Ignoring stale speech event for utterance {} (active: {:?})",
                event.utterance_id, inner.active_utterance
            );
            return;
        }

        match event.kind {
            SpeechEventKind::WordBoundary(range) => {
                if inner.status != PlaybackStatus::Playing {
                    debug!("Word boundary ignored while {:?}", inner.status);
                    return;
                }
                inner.current_word_range = Some(range);
                self.publish(&inner).await;
                if let Some(position) = inner.position {
                    if let Ok(item) = self.document.item(position.section, position.item_index) {
                        self.state.broadcast_event(PlaybackEvent::WordBoundary {
                            item_number: item.number,
                            field: position.field,
                            range,
                            timestamp: Utc::now(),
                        });
                    }
                }
            }
            SpeechEventKind::Finished => {
                if inner.status != PlaybackStatus::Playing {
                    debug!("Finished event ignored while {:?}", inner.status);
                    return;
                }
                if let Err(e) = self.advance(&mut inner).await {
                    // Mid-sequence failures land in Idle and reach observers
                    // through the event stream; there is no caller to return
                    // them to here.
                    let _ = self.fail_to_idle(&mut inner, e).await;
                }
            }
            SpeechEventKind::Cancelled => {
                // Cancellations are the direct result of an engine-issued
                // stop or re-speak, already handled by the caller.
                debug!("Utterance {} cancelled", event.utterance_id);
            }
        }
    }

    /// Cancel any in-flight utterance and start narrating at `position`
    async fn restart_at(&self, position: PlaybackPosition) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.active_utterance.take().is_some() {
            self.speech.stop();
        }
        inner.current_word_range = None;
        inner.saved_word_range = None;
        inner.narration_deferred = false;
        inner.position = Some(position);
        inner.status = PlaybackStatus::Playing;

        if let Err(e) = self.issue_narration(&mut inner, position) {
            return self.fail_to_idle(&mut inner, e).await;
        }

        self.publish(&inner).await;
        self.emit_state_changed(PlaybackStatus::Playing);
        self.emit_position_changed(position);
        Ok(())
    }

    /// Shared skip implementation: item-granularity reposition
    async fn skip<F>(&self, hop: F) -> Result<()>
    where
        F: FnOnce(&Document, PlaybackPosition) -> Option<PlaybackPosition>,
    {
        let mut inner = self.inner.lock().await;
        if inner.status == PlaybackStatus::Idle {
            debug!("Skip ignored: engine is idle");
            return Ok(());
        }

        let current = inner
            .position
            .ok_or_else(|| Error::Internal("active status without a position".into()))?;
        let Some(target) = hop(&self.document, current) else {
            debug!("Skip ignored: no adjacent item");
            return Ok(());
        };
        info!(
            "Skipping from {:?}[{}] to {:?}[{}]",
            current.section, current.item_index, target.section, target.item_index
        );

        inner.position = Some(target);
        inner.current_word_range = None;
        inner.saved_word_range = None;

        match inner.status {
            PlaybackStatus::Playing => {
                if inner.active_utterance.take().is_some() {
                    self.speech.stop();
                }
                if let Err(e) = self.issue_narration(&mut inner, target) {
                    return self.fail_to_idle(&mut inner, e).await;
                }
            }
            PlaybackStatus::Paused => {
                // Defer speech until resume: reposition only, no port call.
                // The paused utterance is cancelled when resume() issues the
                // fresh request; dropping the active id here absorbs any of
                // its late events in the meantime.
                inner.active_utterance = None;
                inner.narration_deferred = true;
            }
            PlaybackStatus::Idle => unreachable!("idle handled above"),
        }

        self.publish(&inner).await;
        self.emit_position_changed(target);
        Ok(())
    }

    /// Advance after a completed utterance: second pass, next item, or end
    /// of document
    async fn advance(&self, inner: &mut EngineInner) -> Result<()> {
        let position = inner
            .position
            .ok_or_else(|| Error::Internal("finished event without a position".into()))?;
        let item = self.item_at(position)?;

        // An item counts as heard only when its second pass finishes
        if position.field == Field::Explanation {
            self.progress.record_completed(self.document.id(), item.number);
            self.state.broadcast_event(PlaybackEvent::ItemCompleted {
                prayer_id: self.document.id().to_string(),
                item_number: item.number,
                timestamp: Utc::now(),
            });
        }

        match self.document.next_position(position) {
            Some(next) => {
                debug!(
                    "Advancing to {:?}[{}] {:?}",
                    next.section, next.item_index, next.field
                );
                inner.position = Some(next);
                inner.current_word_range = None;
                self.issue_narration(inner, next)?;
                self.publish(inner).await;
                self.emit_position_changed(next);
            }
            None => {
                info!("End of document '{}' reached", self.document.id());
                self.speech.stop();
                inner.reset_to_idle();
                self.publish(inner).await;
                self.state.broadcast_event(PlaybackEvent::PlaybackFinished {
                    prayer_id: self.document.id().to_string(),
                    timestamp: Utc::now(),
                });
                self.emit_state_changed(PlaybackStatus::Idle);
            }
        }
        Ok(())
    }

    /// Issue the narration request for a position, assigning a fresh
    /// utterance id
    fn issue_narration(&self, inner: &mut EngineInner, position: PlaybackPosition) -> Result<()> {
        let item = self.item_at(position)?;
        let text = match position.field {
            Field::Original => item.original_text.clone(),
            Field::Explanation => item.explanation_text.clone(),
        };

        let utterance_id = inner.next_utterance_id;
        inner.next_utterance_id += 1;
        inner.active_utterance = Some(utterance_id);

        debug!(
            "Narrating item {} {:?} as utterance {}",
            item.number, position.field, utterance_id
        );
        self.speech
            .speak(SpeechRequest {
                utterance_id,
                text,
                voice: self.config.voice_for(position.field).clone(),
                rate: inner.rate,
            })
            .inspect_err(|_| {
                inner.active_utterance = None;
            })
    }

    /// Resolve the item at a position, mapping misses to the invariant
    /// violation error
    fn item_at(&self, position: PlaybackPosition) -> Result<&katha_common::Item> {
        self.document
            .item(position.section, position.item_index)
            .map_err(|_| Error::IndexOutOfRange {
                section: position.section,
                index: position.item_index,
            })
    }

    /// Land in Idle after a playback failure, surfacing it to observers,
    /// then propagate the error
    async fn fail_to_idle(&self, inner: &mut EngineInner, error: Error) -> Result<()> {
        warn!("Playback failed, stopping: {error}");
        self.speech.stop();
        inner.reset_to_idle();
        self.publish(inner).await;
        self.state.broadcast_event(PlaybackEvent::PlaybackError {
            message: error.to_string(),
            timestamp: Utc::now(),
        });
        self.emit_state_changed(PlaybackStatus::Idle);
        Err(error)
    }

    async fn publish(&self, inner: &EngineInner) {
        self.state.publish(inner.snapshot()).await;
    }

    fn emit_state_changed(&self, status: PlaybackStatus) {
        self.state.broadcast_event(PlaybackEvent::StateChanged {
            status,
            timestamp: Utc::now(),
        });
    }

    fn emit_position_changed(&self, position: PlaybackPosition) {
        if let Ok(item) = self.document.item(position.section, position.item_index) {
            self.state.broadcast_event(PlaybackEvent::PositionChanged {
                section: position.section,
                item_number: item.number,
                field: position.field,
                timestamp: Utc::now(),
            });
        }
    }

    /// Clone handles for spawned tasks
    fn clone_handles(&self) -> Self {
        Self {
            document: Arc::clone(&self.document),
            speech: Arc::clone(&self.speech),
            progress: Arc::clone(&self.progress),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            inner: Arc::clone(&self.inner),
        }
    }
}
