//! Primary-versus-secondary transcription records.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use gradevox_command::text::similarity;
use gradevox_command::canonicalize;

use crate::error::EngineError;

/// One utterance transcribed by both engines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub session_id: Uuid,
    pub utterance_id: Uuid,
    pub primary_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_error: Option<String>,
    pub latency_ms: u64,
    /// Edit similarity of the two texts after canonicalization, 0.0 to 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl ComparisonRecord {
    pub fn new(
        session_id: Uuid,
        utterance_id: Uuid,
        primary_text: String,
        secondary: Result<String, EngineError>,
        latency: Duration,
    ) -> Self {
        let (secondary_text, secondary_error) = match secondary {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let similarity = secondary_text
            .as_deref()
            .map(|s| similarity(&canonicalize(&primary_text), &canonicalize(s)));

        Self {
            session_id,
            utterance_id,
            primary_text,
            secondary_text,
            secondary_error,
            latency_ms: latency.as_millis() as u64,
            similarity,
        }
    }

    pub fn agrees(&self) -> bool {
        self.similarity.is_some_and(|s| s >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_after_canonicalization() {
        let record = ComparisonRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Maria, quiz one: 85".into(),
            Ok("maria quiz 1 eighty five".into()),
            Duration::from_millis(120),
        );
        assert_eq!(record.similarity, Some(1.0));
        assert!(record.agrees());
        assert_eq!(record.latency_ms, 120);
    }

    #[test]
    fn test_secondary_error_has_no_similarity() {
        let record = ComparisonRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "maria 85".into(),
            Err(EngineError::SecondaryEngine("timeout".into())),
            Duration::from_secs(1),
        );
        assert!(record.similarity.is_none());
        assert!(record.secondary_text.is_none());
        assert_eq!(
            record.secondary_error.as_deref(),
            Some("Secondary engine error: timeout")
        );
        assert!(!record.agrees());
    }

    #[test]
    fn test_disagreement() {
        let record = ComparisonRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "maria 85".into(),
            Ok("mario 95".into()),
            Duration::ZERO,
        );
        let s = record.similarity.unwrap();
        assert!(s > 0.0 && s < 1.0);
    }
}
