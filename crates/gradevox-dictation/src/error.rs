//! Engine failure taxonomy.
//!
//! [`EngineError`] is what the speech engines report. [`SurfacedError`] is
//! the subset the orchestrator passes on to the host; everything else is
//! retried or logged inside the orchestrator.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Permanent: the device has no usable recognizer.
    #[error("Speech recognition is unavailable")]
    RecognitionUnavailable,

    /// Microphone or speech permission was refused. Retryable after consent.
    #[error("Audio capture denied: {0}")]
    CaptureDenied(String),

    /// The engine timed out waiting for speech.
    #[error("No speech detected")]
    NoSpeechDetected,

    #[error("Secondary engine error: {0}")]
    SecondaryEngine(String),
}

/// An engine failure the host must show to the teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum SurfacedError {
    #[error("Speech recognition is unavailable on this device")]
    RecognitionUnavailable,

    #[error("Microphone access denied: {reason}")]
    CaptureDenied { reason: String },

    #[error("No speech detected {count} times in a row")]
    RepeatedNoSpeech { count: u32 },
}
