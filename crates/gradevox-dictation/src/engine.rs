//! Secondary speech engine used for comparison logging.
//!
//! The secondary engine transcribes the buffered audio of an utterance the
//! primary engine already finalized. Its output is diagnostic only.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EngineError;

#[async_trait]
pub trait SecondaryEngine: Send + Sync {
    /// Short name used in logs and comparison records.
    fn name(&self) -> &str;

    /// Transcribe raw PCM f32 samples.
    async fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<String, EngineError>;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Returns a canned transcription (or error) after an optional delay.
///
/// Used for testing the orchestrator without a real model.
#[derive(Debug, Clone)]
pub struct MockSecondaryEngine {
    response: Result<String, EngineError>,
    delay: Duration,
}

impl MockSecondaryEngine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: EngineError) -> Self {
        Self {
            response: Err(error),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SecondaryEngine for MockSecondaryEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(&self, audio: &[f32], sample_rate: u32) -> Result<String, EngineError> {
        if audio.is_empty() {
            return Err(EngineError::SecondaryEngine(
                "Cannot transcribe empty audio".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(EngineError::SecondaryEngine(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::debug!(
            samples = audio.len(),
            sample_rate,
            "Mock secondary transcription generated"
        );
        self.response.clone()
    }
}
