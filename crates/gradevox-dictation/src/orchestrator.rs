//! Dual-engine orchestrator.
//!
//! Drives one listening session at a time. Final events from the primary
//! engine go through the [`GradebookSession`]; the buffered audio of the same
//! utterance is handed to an optional secondary engine on a spawned task
//! whose result only ever reaches the comparison stream.
//!
//! Each explicit stop bumps a generation counter. A comparison task started
//! under an older generation drops its record instead of sending it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use gradevox_command::{canonicalize, CommandOutcome, EditSink, GradebookSession};
use gradevox_core::config::DictationConfig;
use gradevox_core::{GradevoxConfig, Result, Roster, TranscriptEvent};

use crate::comparison::ComparisonRecord;
use crate::engine::SecondaryEngine;
use crate::error::{EngineError, SurfacedError};
use crate::state::{CaptureState, CaptureStateMachine};

/// What a primary-engine event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DictationOutput {
    Command(CommandOutcome),
    /// A stop phrase ended the session.
    SessionFinished { session_id: Uuid },
}

/// Data for the active listening session.
#[derive(Debug)]
struct ListeningSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    /// Audio of the current utterance, handed to the secondary engine.
    audio: Vec<f32>,
    utterances: u32,
}

impl ListeningSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            audio: Vec::new(),
            utterances: 0,
        }
    }
}

pub struct DualEngineOrchestrator {
    config: DictationConfig,
    stop_phrases: Vec<String>,
    state: CaptureStateMachine,
    session: GradebookSession,
    listening: Option<ListeningSession>,
    secondary: Option<Arc<dyn SecondaryEngine>>,
    generation: Arc<AtomicU64>,
    comparison_tx: mpsc::UnboundedSender<ComparisonRecord>,
    comparison_rx: Option<mpsc::UnboundedReceiver<ComparisonRecord>>,
    no_speech_count: u32,
    unavailable_surfaced: bool,
}

impl DualEngineOrchestrator {
    pub fn new(config: &GradevoxConfig) -> Self {
        Self::with_session(config, GradebookSession::new(config))
    }

    pub fn with_session(config: &GradevoxConfig, session: GradebookSession) -> Self {
        let (comparison_tx, comparison_rx) = mpsc::unbounded_channel();
        let stop_phrases = config
            .dictation
            .stop_phrases
            .iter()
            .map(|p| canonicalize(p))
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            config: config.dictation.clone(),
            stop_phrases,
            state: CaptureStateMachine::new(),
            session,
            listening: None,
            secondary: None,
            generation: Arc::new(AtomicU64::new(0)),
            comparison_tx,
            comparison_rx: Some(comparison_rx),
            no_speech_count: 0,
            unavailable_surfaced: false,
        }
    }

    /// Attach a secondary engine. It only runs when
    /// `dictation.secondary_enabled` is set.
    pub fn with_secondary(mut self, engine: Arc<dyn SecondaryEngine>) -> Self {
        self.secondary = Some(engine);
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state.current()
    }

    pub fn session(&self) -> &GradebookSession {
        &self.session
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.listening.as_ref().map(|s| s.id)
    }

    /// The comparison stream. Can be taken once.
    pub fn take_comparison_stream(&mut self) -> Option<mpsc::UnboundedReceiver<ComparisonRecord>> {
        self.comparison_rx.take()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a listening session. Starting while one is active is a no-op
    /// that returns the active session id.
    pub fn start_listening(&mut self) -> Result<Uuid> {
        if let Some(active) = &self.listening {
            if self.state.current().is_active() {
                tracing::debug!(session_id = %active.id, "Already listening");
                return Ok(active.id);
            }
        }

        self.state.transition(CaptureState::Listening)?;
        let session = ListeningSession::new();
        let id = session.id;
        self.listening = Some(session);
        self.no_speech_count = 0;
        tracing::info!(session_id = %id, continuous = self.config.continuous, "Listening started");
        Ok(id)
    }

    /// Buffer utterance audio for the secondary engine.
    pub fn push_audio(&mut self, samples: &[f32]) {
        if self.state.current() != CaptureState::Listening {
            return;
        }
        if let Some(session) = self.listening.as_mut() {
            session.audio.extend_from_slice(samples);
        }
    }

    /// The platform recognizer ended its session on its own. In continuous
    /// mode listening resumes; calling this again is harmless. Returns
    /// whether a session is still listening.
    pub fn session_ended(&mut self) -> Result<bool> {
        if self.listening.is_none() {
            return Ok(false);
        }
        match (self.config.continuous, self.state.current()) {
            (true, CaptureState::Listening) => Ok(true),
            (true, CaptureState::Processing) => {
                self.state.transition(CaptureState::Listening)?;
                Ok(true)
            }
            (true, CaptureState::Idle) => {
                self.state.transition(CaptureState::Listening)?;
                tracing::debug!("Continuous listening restarted");
                Ok(true)
            }
            (false, _) => {
                self.finish_session();
                Ok(false)
            }
        }
    }

    /// Stop capture immediately. In-flight comparisons finish but their
    /// records are discarded.
    pub fn stop(&mut self) -> Option<Uuid> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let id = self.finish_session();
        if let Some(id) = id {
            tracing::info!(session_id = %id, "Listening stopped");
        }
        id
    }

    fn finish_session(&mut self) -> Option<Uuid> {
        self.state.reset();
        let session = self.listening.take()?;
        let elapsed = Utc::now() - session.started_at;
        tracing::info!(
            session_id = %session.id,
            utterances = session.utterances,
            elapsed_secs = elapsed.num_seconds(),
            "Listening session finished"
        );
        Some(session.id)
    }

    // =========================================================================
    // Primary events
    // =========================================================================

    /// Handle one event from the primary engine.
    ///
    /// Interim events and events outside a listening session produce
    /// nothing. A final event runs through the command pipeline, unless it
    /// is a stop phrase.
    pub fn handle_event(
        &mut self,
        event: &TranscriptEvent,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> Result<Option<DictationOutput>> {
        if self.state.current() != CaptureState::Listening {
            tracing::debug!(state = %self.state.current(), "Event outside listening session");
            return Ok(None);
        }
        if !event.is_final {
            return Ok(None);
        }

        self.no_speech_count = 0;
        self.state.transition(CaptureState::Processing)?;

        let (session_id, audio) = match self.listening.as_mut() {
            Some(session) => {
                session.utterances += 1;
                (session.id, std::mem::take(&mut session.audio))
            }
            None => (Uuid::new_v4(), Vec::new()),
        };

        if self.is_stop_phrase(event) {
            self.finish_session();
            return Ok(Some(DictationOutput::SessionFinished { session_id }));
        }

        self.spawn_comparison(session_id, event.text.clone(), audio);
        let outcome = self.session.process(event, roster, sink);

        if self.config.continuous {
            self.state.transition(CaptureState::Listening)?;
        } else {
            self.finish_session();
        }
        Ok(Some(DictationOutput::Command(outcome)))
    }

    fn is_stop_phrase(&self, event: &TranscriptEvent) -> bool {
        let text = canonicalize(&event.text);
        self.stop_phrases.iter().any(|p| *p == text)
    }

    // =========================================================================
    // Engine errors
    // =========================================================================

    /// Apply the error taxonomy. Returns the error to show the host, if any.
    pub fn handle_engine_error(&mut self, error: EngineError) -> Option<SurfacedError> {
        match error {
            EngineError::RecognitionUnavailable => {
                self.stop();
                if self.unavailable_surfaced {
                    return None;
                }
                self.unavailable_surfaced = true;
                tracing::error!("Speech recognition unavailable");
                Some(SurfacedError::RecognitionUnavailable)
            }
            EngineError::CaptureDenied(reason) => {
                self.stop();
                tracing::warn!(reason = %reason, "Audio capture denied");
                Some(SurfacedError::CaptureDenied { reason })
            }
            EngineError::NoSpeechDetected => {
                self.no_speech_count += 1;
                let count = self.no_speech_count;
                if count >= self.config.no_speech_surface_after.max(1) {
                    self.no_speech_count = 0;
                    tracing::info!(count, "Repeated no-speech timeouts");
                    Some(SurfacedError::RepeatedNoSpeech { count })
                } else {
                    tracing::debug!(count, "No speech detected, retrying");
                    None
                }
            }
            EngineError::SecondaryEngine(message) => {
                tracing::warn!("Secondary engine error: {}", message);
                None
            }
        }
    }

    // =========================================================================
    // Secondary comparison
    // =========================================================================

    fn spawn_comparison(&self, session_id: Uuid, primary_text: String, audio: Vec<f32>) {
        if !self.config.secondary_enabled {
            return;
        }
        let Some(engine) = self.secondary.clone() else {
            return;
        };
        if audio.is_empty() {
            tracing::debug!("No buffered audio, comparison skipped");
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, comparison skipped");
            return;
        };

        let utterance_id = Uuid::new_v4();
        let generation = Arc::clone(&self.generation);
        let owner = generation.load(Ordering::SeqCst);
        let tx = self.comparison_tx.clone();
        let timeout = Duration::from_secs(self.config.secondary_timeout_secs);
        let sample_rate = self.config.sample_rate;

        handle.spawn(async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, engine.transcribe(&audio, sample_rate)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::SecondaryEngine(format!(
                    "{} timed out after {}s",
                    engine.name(),
                    timeout.as_secs()
                ))),
            };

            if generation.load(Ordering::SeqCst) != owner {
                tracing::debug!(%utterance_id, "Session closed, comparison discarded");
                return;
            }
            if let Err(e) = &result {
                tracing::warn!(engine = engine.name(), "Secondary transcription failed: {}", e);
            }

            let record =
                ComparisonRecord::new(session_id, utterance_id, primary_text, result, started.elapsed());
            if tx.send(record).is_err() {
                tracing::debug!("Comparison stream closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockSecondaryEngine;
    use gradevox_command::InMemoryRoster;
    use gradevox_core::RosterRow;

    fn sink() -> InMemoryRoster {
        InMemoryRoster::new(Roster::new(
            vec!["First Name".into(), "Last Name".into(), "Quiz 1".into()],
            vec![
                RosterRow::new(0, "Maria", "Smith"),
                RosterRow::new(1, "Jon", "Lee"),
            ],
        ))
    }

    fn config(continuous: bool, secondary: bool) -> GradevoxConfig {
        let mut config = GradevoxConfig::default();
        config.dictation.continuous = continuous;
        config.dictation.secondary_enabled = secondary;
        config
    }

    fn say(
        orchestrator: &mut DualEngineOrchestrator,
        sink: &mut InMemoryRoster,
        text: &str,
    ) -> Option<DictationOutput> {
        let roster = sink.roster().clone();
        orchestrator
            .handle_event(&TranscriptEvent::final_text(text), &roster, sink)
            .unwrap()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[test]
    fn test_start_is_idempotent() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, false));
        let first = orchestrator.start_listening().unwrap();
        let second = orchestrator.start_listening().unwrap();
        assert_eq!(first, second);
        assert_eq!(orchestrator.state(), CaptureState::Listening);
    }

    #[test]
    fn test_single_command_returns_to_idle() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, false));
        let mut sink = sink();
        orchestrator.start_listening().unwrap();

        let output = say(&mut orchestrator, &mut sink, "jon quiz 1 90");
        assert!(matches!(
            output,
            Some(DictationOutput::Command(CommandOutcome::Applied { .. }))
        ));
        assert_eq!(orchestrator.state(), CaptureState::Idle);
        assert_eq!(sink.roster().rows[1].value("Quiz 1"), Some("90"));
    }

    #[test]
    fn test_continuous_mode_keeps_listening_until_stop_phrase() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(true, false));
        let mut sink = sink();
        let id = orchestrator.start_listening().unwrap();

        say(&mut orchestrator, &mut sink, "jon quiz 1 90");
        assert_eq!(orchestrator.state(), CaptureState::Listening);
        say(&mut orchestrator, &mut sink, "maria quiz 1 80");
        assert_eq!(orchestrator.state(), CaptureState::Listening);

        let output = say(&mut orchestrator, &mut sink, "That's all.");
        assert_eq!(output, Some(DictationOutput::SessionFinished { session_id: id }));
        assert_eq!(orchestrator.state(), CaptureState::Idle);
        assert!(orchestrator.session_id().is_none());
    }

    #[test]
    fn test_session_ended_restart_is_idempotent() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(true, false));
        orchestrator.start_listening().unwrap();
        assert!(orchestrator.session_ended().unwrap());
        assert!(orchestrator.session_ended().unwrap());
        assert_eq!(orchestrator.state(), CaptureState::Listening);

        let mut single = DualEngineOrchestrator::new(&config(false, false));
        single.start_listening().unwrap();
        assert!(!single.session_ended().unwrap());
        assert!(!single.session_ended().unwrap());
        assert_eq!(single.state(), CaptureState::Idle);
    }

    #[test]
    fn test_events_outside_session_are_ignored() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, false));
        let mut sink = sink();
        assert!(say(&mut orchestrator, &mut sink, "jon quiz 1 90").is_none());

        orchestrator.start_listening().unwrap();
        let roster = sink.roster().clone();
        let interim = orchestrator
            .handle_event(&TranscriptEvent::interim("jon quiz"), &roster, &mut sink)
            .unwrap();
        assert!(interim.is_none());
        assert_eq!(orchestrator.state(), CaptureState::Listening);
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_recognition_unavailable_surfaced_once() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, false));
        orchestrator.start_listening().unwrap();
        assert_eq!(
            orchestrator.handle_engine_error(EngineError::RecognitionUnavailable),
            Some(SurfacedError::RecognitionUnavailable)
        );
        assert_eq!(orchestrator.state(), CaptureState::Idle);
        assert!(orchestrator
            .handle_engine_error(EngineError::RecognitionUnavailable)
            .is_none());
    }

    #[test]
    fn test_no_speech_surfaced_after_threshold() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(true, false));
        orchestrator.start_listening().unwrap();
        assert!(orchestrator.handle_engine_error(EngineError::NoSpeechDetected).is_none());
        assert!(orchestrator.handle_engine_error(EngineError::NoSpeechDetected).is_none());
        assert_eq!(
            orchestrator.handle_engine_error(EngineError::NoSpeechDetected),
            Some(SurfacedError::RepeatedNoSpeech { count: 3 })
        );
        assert_eq!(orchestrator.state(), CaptureState::Listening);
    }

    #[test]
    fn test_capture_denied_stops_and_surfaces() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, false));
        orchestrator.start_listening().unwrap();
        let surfaced = orchestrator.handle_engine_error(EngineError::CaptureDenied("mic".into()));
        assert_eq!(
            surfaced,
            Some(SurfacedError::CaptureDenied {
                reason: "mic".into()
            })
        );
        assert_eq!(orchestrator.state(), CaptureState::Idle);
    }

    #[test]
    fn test_secondary_errors_are_never_surfaced() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, true));
        assert!(orchestrator
            .handle_engine_error(EngineError::SecondaryEngine("crashed".into()))
            .is_none());
    }

    // =========================================================================
    // Comparison stream
    // =========================================================================

    #[tokio::test]
    async fn test_secondary_result_reaches_comparison_stream() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, true))
            .with_secondary(Arc::new(MockSecondaryEngine::new("jon quiz one ninety")));
        let mut stream = orchestrator.take_comparison_stream().unwrap();
        let mut sink = sink();

        let session_id = orchestrator.start_listening().unwrap();
        orchestrator.push_audio(&[0.1; 1600]);
        let output = say(&mut orchestrator, &mut sink, "jon quiz 1 90");
        assert!(matches!(
            output,
            Some(DictationOutput::Command(CommandOutcome::Applied { .. }))
        ));

        let record = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.session_id, session_id);
        assert_eq!(record.primary_text, "jon quiz 1 90");
        assert_eq!(record.similarity, Some(1.0));
    }

    #[tokio::test]
    async fn test_secondary_failure_does_not_change_primary_output() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, true)).with_secondary(
            Arc::new(MockSecondaryEngine::failing(EngineError::SecondaryEngine(
                "model missing".into(),
            ))),
        );
        let mut stream = orchestrator.take_comparison_stream().unwrap();
        let mut sink = sink();

        orchestrator.start_listening().unwrap();
        orchestrator.push_audio(&[0.1; 1600]);
        let output = say(&mut orchestrator, &mut sink, "jon quiz 1 90");
        assert!(matches!(
            output,
            Some(DictationOutput::Command(CommandOutcome::Applied { .. }))
        ));

        let record = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(record.secondary_text.is_none());
        assert!(record.secondary_error.is_some());
    }

    #[tokio::test]
    async fn test_stop_discards_in_flight_comparison() {
        let engine = MockSecondaryEngine::new("jon quiz 1 90").with_delay(Duration::from_millis(50));
        let mut orchestrator =
            DualEngineOrchestrator::new(&config(true, true)).with_secondary(Arc::new(engine));
        let mut stream = orchestrator.take_comparison_stream().unwrap();
        let mut sink = sink();

        orchestrator.start_listening().unwrap();
        orchestrator.push_audio(&[0.1; 1600]);
        say(&mut orchestrator, &mut sink, "jon quiz 1 90");
        orchestrator.stop();

        let received = tokio::time::timeout(Duration::from_millis(300), stream.recv()).await;
        assert!(received.is_err(), "record should have been discarded");
    }

    #[tokio::test]
    async fn test_disabled_secondary_never_runs() {
        let mut orchestrator = DualEngineOrchestrator::new(&config(false, false))
            .with_secondary(Arc::new(MockSecondaryEngine::new("anything")));
        let mut stream = orchestrator.take_comparison_stream().unwrap();
        let mut sink = sink();

        orchestrator.start_listening().unwrap();
        orchestrator.push_audio(&[0.1; 1600]);
        say(&mut orchestrator, &mut sink, "jon quiz 1 90");

        let received = tokio::time::timeout(Duration::from_millis(100), stream.recv()).await;
        assert!(received.is_err());
    }
}
