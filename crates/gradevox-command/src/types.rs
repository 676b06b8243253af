use serde::{Deserialize, Serialize};

use gradevox_core::Alternative;

// =============================================================================
// Parsed commands
// =============================================================================

/// One parsed utterance. Exactly one variant is produced per parse.
///
/// Name-based commands carry the spoken name, never a roster index. Turning a
/// name into a row is always a separate resolver step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedCommand {
    GradeEntry {
        search_name: String,
        column: Option<String>,
        value: String,
        /// Denominator when the score was spoken as "n out of m".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        out_of: Option<String>,
    },
    BatchList {
        column: Option<String>,
        entries: Vec<BatchEntry>,
    },
    BatchRange {
        column: Option<String>,
        /// 0-based, inclusive.
        start_row: usize,
        /// 0-based, inclusive.
        end_row: usize,
        score: String,
    },
    BatchEveryone {
        column: Option<String>,
        score: String,
        condition: EveryoneCondition,
    },
    AddStudent {
        last_name: String,
        first_name: String,
        student_id: Option<String>,
    },
    DeleteStudent {
        target: DeleteTarget,
    },
    Sort {
        field: SortField,
        direction: SortDirection,
    },
    Undo,
    Redo,
    /// 0-based candidate index.
    SelectCandidate {
        index: usize,
    },
    Confirm,
    Reject,
    Unknown {
        original_text: String,
        alternatives: Vec<Alternative>,
    },
}

impl ParsedCommand {
    /// Short machine name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GradeEntry { .. } => "grade_entry",
            Self::BatchList { .. } => "batch_list",
            Self::BatchRange { .. } => "batch_range",
            Self::BatchEveryone { .. } => "batch_everyone",
            Self::AddStudent { .. } => "add_student",
            Self::DeleteStudent { .. } => "delete_student",
            Self::Sort { .. } => "sort",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::SelectCandidate { .. } => "select_candidate",
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Target column of a grade or batch command.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::GradeEntry { column, .. }
            | Self::BatchList { column, .. }
            | Self::BatchRange { column, .. }
            | Self::BatchEveryone { column, .. } => column.as_deref(),
            _ => None,
        }
    }

    /// Fill in the target column of a grade or batch command. Other
    /// variants are returned unchanged.
    pub fn with_column(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::GradeEntry { column, .. }
            | Self::BatchList { column, .. }
            | Self::BatchRange { column, .. }
            | Self::BatchEveryone { column, .. } => *column = Some(value.into()),
            _ => {}
        }
        self
    }

    /// Commands that settle a pending disambiguation.
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            Self::SelectCandidate { .. } | Self::Confirm | Self::Reject
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// One `name score` pair of a batch-list command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    pub score: String,
}

impl BatchEntry {
    pub fn new(name: impl Into<String>, score: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: score.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EveryoneCondition {
    All,
    /// Only rows with at least one non-empty graded field.
    Present,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteTarget {
    Name(String),
    StudentId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    FirstName,
    LastName,
    StudentId,
    Column(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

// =============================================================================
// Resolution
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Phonetic,
    Partial,
    Fuzzy,
}

/// Which candidate string of the row produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    FirstName,
    LastName,
    FullName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One scored roster row. Lower scores are better and only comparable
/// within a single resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub row_index: usize,
    pub matched_field: MatchedField,
    pub match_type: MatchType,
    pub score: u32,
    pub has_existing_value_in_target_column: bool,
}

impl MatchCandidate {
    pub fn confidence(&self) -> Confidence {
        match self.score {
            0 => Confidence::High,
            1 | 2 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    Ambiguous,
    None,
}

/// The policy rule that settled a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    SingleCandidate,
    UniqueExact,
    EmptyTargetColumn,
    RecentStudent,
    LowestScore,
    /// Chosen by the teacher from a disambiguation prompt.
    Selection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub status: ResolutionStatus,
    pub best_index: Option<usize>,
    pub candidates: Vec<MatchCandidate>,
    pub resolved_by: Option<ResolvedBy>,
}

impl ResolutionResult {
    pub fn none() -> Self {
        Self {
            status: ResolutionStatus::None,
            best_index: None,
            candidates: Vec::new(),
            resolved_by: None,
        }
    }

    pub fn resolved(best_index: usize, candidates: Vec<MatchCandidate>, by: ResolvedBy) -> Self {
        Self {
            status: ResolutionStatus::Resolved,
            best_index: Some(best_index),
            candidates,
            resolved_by: Some(by),
        }
    }

    pub fn ambiguous(candidates: Vec<MatchCandidate>) -> Self {
        Self {
            status: ResolutionStatus::Ambiguous,
            best_index: None,
            candidates,
            resolved_by: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }

    /// The candidate for the resolved row.
    pub fn best(&self) -> Option<&MatchCandidate> {
        let index = self.best_index?;
        self.candidates.iter().find(|c| c.row_index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: u32) -> MatchCandidate {
        MatchCandidate {
            row_index: 3,
            matched_field: MatchedField::FirstName,
            match_type: MatchType::Fuzzy,
            score,
            has_existing_value_in_target_column: false,
        }
    }

    #[test]
    fn test_confidence_labels() {
        assert_eq!(candidate(0).confidence(), Confidence::High);
        assert_eq!(candidate(1).confidence(), Confidence::Medium);
        assert_eq!(candidate(2).confidence(), Confidence::Medium);
        assert_eq!(candidate(3).confidence(), Confidence::Low);
    }

    #[test]
    fn test_with_column_only_touches_grade_commands() {
        let cmd = ParsedCommand::GradeEntry {
            search_name: "maria".into(),
            column: None,
            value: "90".into(),
            out_of: None,
        }
        .with_column("Quiz 1");
        assert_eq!(cmd.column(), Some("Quiz 1"));
        assert_eq!(ParsedCommand::Undo.with_column("Quiz 1").column(), None);
    }

    #[test]
    fn test_settlement_commands() {
        assert!(ParsedCommand::Confirm.is_settlement());
        assert!(ParsedCommand::SelectCandidate { index: 0 }.is_settlement());
        assert!(!ParsedCommand::Undo.is_settlement());
    }

    #[test]
    fn test_command_json_is_tagged() {
        let cmd = ParsedCommand::BatchRange {
            column: Some("Lab 2".into()),
            start_row: 0,
            end_row: 4,
            score: "90".into(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "batch_range");
        assert_eq!(json["end_row"], 4);
        let back: ParsedCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_resolution_best() {
        let result = ResolutionResult::resolved(3, vec![candidate(0)], ResolvedBy::UniqueExact);
        assert!(result.is_resolved());
        assert_eq!(result.best().unwrap().score, 0);
        assert!(ResolutionResult::none().best().is_none());
    }
}
