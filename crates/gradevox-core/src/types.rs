use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Transcript events
// =============================================================================

/// One ranked hypothesis from a speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub text: String,
    /// Engine-reported confidence, 0.0 to 1.0. Not comparable across engines.
    pub raw_confidence: f32,
}

impl Alternative {
    pub fn new(text: impl Into<String>, raw_confidence: f32) -> Self {
        Self {
            text: text.into(),
            raw_confidence,
        }
    }
}

/// A transcript event delivered by the platform speech engine.
///
/// Immutable once emitted. Only final events drive the command pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
    pub alternatives: Vec<Alternative>,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEvent {
    /// A final event with a single alternative.
    pub fn final_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            alternatives: vec![Alternative::new(text.clone(), 1.0)],
            text,
            is_final: true,
            timestamp: Utc::now(),
        }
    }

    /// An interim (partial) event.
    pub fn interim(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            alternatives: vec![Alternative::new(text.clone(), 0.0)],
            text,
            is_final: false,
            timestamp: Utc::now(),
        }
    }

    /// A final event carrying several ranked alternatives. The first one is
    /// used as the event text.
    pub fn with_alternatives(alternatives: Vec<Alternative>) -> Self {
        let text = alternatives
            .first()
            .map(|a| a.text.clone())
            .unwrap_or_default();
        Self {
            text,
            is_final: true,
            alternatives,
            timestamp: Utc::now(),
        }
    }

    /// Alternatives in engine rank order, falling back to the event text when
    /// the engine supplied none.
    pub fn ranked_alternatives(&self) -> Vec<Alternative> {
        if self.alternatives.is_empty() {
            vec![Alternative::new(self.text.clone(), 0.0)]
        } else {
            self.alternatives.clone()
        }
    }
}

// =============================================================================
// Roster
// =============================================================================

/// One student row in the host's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRow {
    pub index: usize,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl RosterRow {
    pub fn new(index: usize, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            index,
            first_name: first_name.into(),
            last_name: last_name.into(),
            student_id: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The non-blank value stored in `column`, if any.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has_value(&self, column: &str) -> bool {
        self.value(column).is_some()
    }

    /// Whether any graded field holds a value. Used as the "present" test.
    pub fn has_any_value(&self) -> bool {
        self.fields.values().any(|v| !v.trim().is_empty())
    }
}

/// A read-only snapshot of the host roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub headers: Vec<String>,
    pub rows: Vec<RosterRow>,
}

impl Roster {
    pub fn new(headers: Vec<String>, rows: Vec<RosterRow>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by its `index`, not its position.
    pub fn row(&self, index: usize) -> Option<&RosterRow> {
        self.rows.iter().find(|r| r.index == index)
    }

    pub fn find_by_student_id(&self, student_id: &str) -> Option<&RosterRow> {
        let wanted = student_id.trim();
        self.rows
            .iter()
            .find(|r| r.student_id.as_deref().map(str::trim) == Some(wanted))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// A validated single-cell edit handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEdit {
    pub row_index: usize,
    pub column: String,
    pub value: String,
}

impl GradeEdit {
    pub fn new(row_index: usize, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            row_index,
            column: column.into(),
            value: value.into(),
        }
    }
}
