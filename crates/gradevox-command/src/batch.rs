//! Batch command execution.
//!
//! Turns the three batch shapes into a list of [`GradeEdit`]s plus a report
//! of what could not be applied. Each pair of a batch list is resolved on its
//! own; one bad name never blocks the rest and nothing is rolled back.

use serde::{Deserialize, Serialize};

use gradevox_core::{GradeEdit, Roster};

use crate::context::SessionContext;
use crate::resolver::Resolver;
use crate::types::{BatchEntry, EveryoneCondition, MatchCandidate, ResolutionStatus};

/// A batch-list pair that did not resolve to a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedEntry {
    pub name: String,
    pub score: String,
    pub status: ResolutionStatus,
    pub candidates: Vec<MatchCandidate>,
}

/// Outcome of one batch command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub column: String,
    pub edits: Vec<GradeEdit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedEntry>,
    /// Range rows past the end of the roster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkippedRows>,
}

/// Inclusive span of 0-based range positions with no roster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRows {
    pub start: usize,
    pub end: usize,
}

impl SkippedRows {
    pub fn count(&self) -> usize {
        (self.end - self.start).saturating_add(1)
    }
}

impl BatchReport {
    fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ..Default::default()
        }
    }

    pub fn applied(&self) -> usize {
        self.edits.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.map_or(0, |s| s.count())
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && self.skipped.is_none()
    }
}

pub struct BatchExecutor<'a> {
    resolver: &'a Resolver,
    roster: &'a Roster,
    context: &'a SessionContext,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(resolver: &'a Resolver, roster: &'a Roster, context: &'a SessionContext) -> Self {
        Self {
            resolver,
            roster,
            context,
        }
    }

    /// Resolve each `name score` pair independently.
    pub fn execute_list(&self, column: &str, entries: &[BatchEntry]) -> BatchReport {
        let mut report = BatchReport::new(column);
        for entry in entries {
            let result = self
                .resolver
                .resolve(&entry.name, self.roster, Some(column), self.context);
            match result.best_index {
                Some(row_index) if result.is_resolved() => {
                    report
                        .edits
                        .push(GradeEdit::new(row_index, column, entry.score.clone()));
                }
                _ => {
                    tracing::info!(name = %entry.name, status = ?result.status, "Batch entry unresolved");
                    report.unresolved.push(UnresolvedEntry {
                        name: entry.name.clone(),
                        score: entry.score.clone(),
                        status: result.status,
                        candidates: result.candidates,
                    });
                }
            }
        }
        report
    }

    /// Apply `score` to every row in the inclusive 0-based range. Bounds are
    /// swapped when reversed. Only existing rows are visited; the part of the
    /// range past the roster is reported as one span.
    pub fn execute_range(
        &self,
        column: &str,
        start_row: usize,
        end_row: usize,
        score: &str,
    ) -> BatchReport {
        let (lo, hi) = if start_row <= end_row {
            (start_row, end_row)
        } else {
            (end_row, start_row)
        };

        let mut report = BatchReport::new(column);
        let rows = self.roster.rows.get(lo..).unwrap_or_default();
        report.edits = rows
            .iter()
            .take((hi - lo).saturating_add(1))
            .map(|row| GradeEdit::new(row.index, column, score))
            .collect();

        let len = self.roster.len();
        if hi >= len {
            report.skipped = Some(SkippedRows {
                start: lo.max(len),
                end: hi,
            });
            tracing::info!(
                skipped = report.skipped_count(),
                rows = self.roster.len(),
                "Batch range runs past the roster"
            );
        }
        report
    }

    /// Apply `score` to every row, or only to rows with at least one
    /// non-empty field when the condition is `Present`.
    pub fn execute_everyone(
        &self,
        column: &str,
        score: &str,
        condition: EveryoneCondition,
    ) -> BatchReport {
        let mut report = BatchReport::new(column);
        report.edits = self
            .roster
            .rows
            .iter()
            .filter(|row| match condition {
                EveryoneCondition::All => true,
                EveryoneCondition::Present => row.has_any_value(),
            })
            .map(|row| GradeEdit::new(row.index, column, score))
            .collect();
        report
    }
}
