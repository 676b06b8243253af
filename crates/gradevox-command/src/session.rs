//! Gradebook session: one final transcript event in, one outcome out.
//!
//! Pipeline per event:
//! 1. Interim events are ignored.
//! 2. Each ranked alternative is normalized and parsed; the first one that
//!    parses to a known command wins.
//! 3. Settlement commands go to the disambiguation machine. Any other known
//!    command cancels a pending prompt and runs normally.
//! 4. Names are resolved against the roster snapshot and validated edits are
//!    handed to the host's [`EditSink`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::Utc;
use serde::Serialize;

use gradevox_core::{Alternative, GradeEdit, GradevoxConfig, Roster, TranscriptEvent};

use crate::batch::{BatchExecutor, BatchReport};
use crate::context::SessionContext;
use crate::disambiguation::{Disambiguator, PendingDisambiguation, Settlement};
use crate::memory::CorrectionMemory;
use crate::normalizer::Normalizer;
use crate::parser::{CommandParser, ParseInput};
use crate::resolver::Resolver;
use crate::sink::{EditSink, NewStudent};
use crate::text::clean;
use crate::types::{
    Confidence, DeleteTarget, MatchCandidate, MatchedField, ParsedCommand, ResolutionResult,
    ResolutionStatus, ResolvedBy,
};
use crate::vocabulary::ContextVocabulary;

/// What happened to one transcript event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied {
        command: ParsedCommand,
        edits: Vec<GradeEdit>,
        resolution: ResolutionResult,
    },
    AwaitingDisambiguation {
        pending: PendingDisambiguation,
        resolution: ResolutionResult,
    },
    BatchApplied {
        command: ParsedCommand,
        report: BatchReport,
    },
    RowAdded {
        command: ParsedCommand,
        row_index: usize,
    },
    RowDeleted {
        command: ParsedCommand,
        row_index: usize,
    },
    /// Undo, redo or sort forwarded to the host. `changed` is false when the
    /// host had nothing to undo or redo.
    HostCommand {
        command: ParsedCommand,
        changed: bool,
    },
    NoMatch {
        command: ParsedCommand,
        search_name: String,
    },
    /// No column was spoken, none is active, and the roster has more than
    /// one gradeable column.
    MissingColumn {
        command: ParsedCommand,
    },
    InvalidSelection {
        index: usize,
        available: usize,
    },
    Cancelled {
        command: ParsedCommand,
    },
    NothingPending,
    Unknown {
        original_text: String,
        alternatives: Vec<Alternative>,
    },
    /// The host rejected the edit.
    Failed {
        command: ParsedCommand,
        error: String,
    },
    Ignored,
}

impl CommandOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::AwaitingDisambiguation { .. } => "awaiting_disambiguation",
            Self::BatchApplied { .. } => "batch_applied",
            Self::RowAdded { .. } => "row_added",
            Self::RowDeleted { .. } => "row_deleted",
            Self::HostCommand { .. } => "host_command",
            Self::NoMatch { .. } => "no_match",
            Self::MissingColumn { .. } => "missing_column",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::Cancelled { .. } => "cancelled",
            Self::NothingPending => "nothing_pending",
            Self::Unknown { .. } => "unknown",
            Self::Failed { .. } => "failed",
            Self::Ignored => "ignored",
        }
    }
}

pub struct GradebookSession {
    normalizer: Normalizer,
    parser: CommandParser,
    resolver: Resolver,
    disambiguator: Disambiguator,
    context: SessionContext,
    memory: CorrectionMemory,
    confirm_low_confidence: bool,
    vocabulary: ContextVocabulary,
    /// Hash of the roster headers and names the vocabulary was built from.
    fingerprint: Option<u64>,
}

impl GradebookSession {
    pub fn new(config: &GradevoxConfig) -> Self {
        let resolver = Resolver::new(config.resolver.clone());
        let parser = CommandParser::new(config.parser.clone(), resolver.strategy());
        Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            parser,
            disambiguator: Disambiguator::new(&config.disambiguation),
            context: SessionContext::new(config.resolver.recent_students_capacity),
            memory: CorrectionMemory::new(),
            confirm_low_confidence: config.disambiguation.confirm_low_confidence,
            resolver,
            vocabulary: ContextVocabulary::default(),
            fingerprint: None,
        }
    }

    /// Start from previously learned corrections.
    pub fn with_memory(mut self, memory: CorrectionMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn pending(&self) -> Option<&PendingDisambiguation> {
        self.disambiguator.pending()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn memory(&self) -> &CorrectionMemory {
        &self.memory
    }

    /// Handle one transcript event against the current roster snapshot.
    pub fn process(
        &mut self,
        event: &TranscriptEvent,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        if !event.is_final {
            return CommandOutcome::Ignored;
        }

        match self.disambiguator.expire_if_stale(Utc::now()) {
            Ok(Some(expired)) => {
                tracing::info!(kind = expired.command.kind(), "Pending prompt expired")
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to expire pending prompt: {}", e),
        }

        let command = self.interpret(event, roster);
        let outcome = self.execute(command, roster, sink);
        tracing::info!(outcome = outcome.kind(), "Transcript processed");
        outcome
    }

    /// Normalize and parse the event's alternatives in rank order. The first
    /// alternative that is not `Unknown` wins.
    pub fn interpret(&mut self, event: &TranscriptEvent, roster: &Roster) -> ParsedCommand {
        self.refresh_vocabulary(roster);
        let alternatives = event.ranked_alternatives();

        for (rank, alternative) in alternatives.iter().enumerate() {
            let text = self
                .normalizer
                .normalize(&alternative.text, &self.vocabulary, &self.memory);
            let command = self.parser.parse(&ParseInput {
                text: &text,
                headers: &roster.headers,
                vocabulary: &self.vocabulary,
                context: &self.context,
            });
            if !command.is_unknown() {
                tracing::debug!(rank, text = %text, kind = command.kind(), "Alternative accepted");
                return command;
            }
        }

        ParsedCommand::Unknown {
            original_text: event.text.clone(),
            alternatives,
        }
    }

    fn refresh_vocabulary(&mut self, roster: &Roster) {
        let fingerprint = roster_fingerprint(roster);
        if self.fingerprint != Some(fingerprint) {
            self.vocabulary = ContextVocabulary::build(roster);
            self.fingerprint = Some(fingerprint);
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn execute(
        &mut self,
        command: ParsedCommand,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        if let ParsedCommand::Unknown {
            original_text,
            alternatives,
        } = command
        {
            return CommandOutcome::Unknown {
                original_text,
                alternatives,
            };
        }

        if command.is_settlement() {
            return self.settle(command, roster, sink);
        }

        if self.disambiguator.is_awaiting() {
            match self.disambiguator.cancel() {
                Ok(Some(dropped)) => tracing::info!(
                    dropped = dropped.command.kind(),
                    next = command.kind(),
                    "New command replaces pending prompt"
                ),
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to cancel pending prompt: {}", e),
            }
        }

        match command {
            ParsedCommand::GradeEntry { .. } => self.grade_entry(command, roster, sink),
            ParsedCommand::BatchList { .. }
            | ParsedCommand::BatchRange { .. }
            | ParsedCommand::BatchEveryone { .. } => self.batch(command, roster, sink),
            ParsedCommand::AddStudent { .. } => self.add_student(command, sink),
            ParsedCommand::DeleteStudent { .. } => self.delete_student(command, roster, sink),
            ParsedCommand::Sort {
                ref field,
                direction,
            } => match sink.sort_rows(field, direction) {
                Ok(()) => {
                    self.context.clear_recent();
                    CommandOutcome::HostCommand {
                        command,
                        changed: true,
                    }
                }
                Err(e) => failed(command, e),
            },
            ParsedCommand::Undo => match sink.undo() {
                Ok(changed) => CommandOutcome::HostCommand { command, changed },
                Err(e) => failed(command, e),
            },
            ParsedCommand::Redo => match sink.redo() {
                Ok(changed) => CommandOutcome::HostCommand { command, changed },
                Err(e) => failed(command, e),
            },
            // Settlements and Unknown are handled above
            other => CommandOutcome::Failed {
                error: format!("Unexpected command: {}", other.kind()),
                command: other,
            },
        }
    }

    /// Column spoken in the command, else the active column. Must exist in
    /// the roster.
    fn target_column(&self, command: &ParsedCommand, roster: &Roster) -> Option<String> {
        command
            .column()
            .or_else(|| self.context.active_column())
            .filter(|c| roster.has_column(c))
            .map(str::to_string)
    }

    // =========================================================================
    // Grades
    // =========================================================================

    fn grade_entry(
        &mut self,
        command: ParsedCommand,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        let Some(column) = self.target_column(&command, roster) else {
            return CommandOutcome::MissingColumn { command };
        };
        let command = command.with_column(column.as_str());
        let search_name = match &command {
            ParsedCommand::GradeEntry { search_name, .. } => search_name.clone(),
            _ => String::new(),
        };

        let resolution = self
            .resolver
            .resolve(&search_name, roster, Some(&column), &self.context);

        match resolution.status {
            ResolutionStatus::None => CommandOutcome::NoMatch {
                command,
                search_name,
            },
            ResolutionStatus::Ambiguous => {
                let candidates = resolution.candidates.clone();
                self.await_selection(command, candidates, resolution)
            }
            ResolutionStatus::Resolved => {
                let Some(best) = resolution.best().cloned() else {
                    return CommandOutcome::NoMatch {
                        command,
                        search_name,
                    };
                };
                if self.confirm_low_confidence && best.confidence() == Confidence::Low {
                    tracing::debug!(row_index = best.row_index, "Low confidence match needs confirmation");
                    return self.await_selection(command, vec![best], resolution);
                }
                self.apply_grade(command, best.row_index, resolution, roster, sink)
            }
        }
    }

    fn apply_grade(
        &mut self,
        command: ParsedCommand,
        row_index: usize,
        resolution: ResolutionResult,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        let ParsedCommand::GradeEntry {
            column: Some(column),
            value,
            ..
        } = &command
        else {
            return CommandOutcome::Failed {
                error: "Grade entry has no column".to_string(),
                command,
            };
        };

        let edit = GradeEdit::new(row_index, column.as_str(), value.as_str());
        if let Err(e) = sink.apply_grade(&edit) {
            return failed(command, e);
        }

        if let Some(row) = roster.row(row_index) {
            self.context.touch(row);
        }
        self.context.set_active_column(column.as_str());
        tracing::info!(row_index, column = %edit.column, value = %edit.value, "Grade applied");

        CommandOutcome::Applied {
            command,
            edits: vec![edit],
            resolution,
        }
    }

    fn batch(
        &mut self,
        command: ParsedCommand,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        let Some(column) = self.target_column(&command, roster) else {
            return CommandOutcome::MissingColumn { command };
        };
        let command = command.with_column(column.as_str());

        let executor = BatchExecutor::new(&self.resolver, roster, &self.context);
        let report = match &command {
            ParsedCommand::BatchList { entries, .. } => executor.execute_list(&column, entries),
            ParsedCommand::BatchRange {
                start_row,
                end_row,
                score,
                ..
            } => executor.execute_range(&column, *start_row, *end_row, score),
            ParsedCommand::BatchEveryone {
                score, condition, ..
            } => executor.execute_everyone(&column, score, *condition),
            _ => BatchReport::default(),
        };

        if let Err(e) = sink.apply_batch(&report.edits) {
            return failed(command, e);
        }

        if matches!(command, ParsedCommand::BatchList { .. }) {
            for edit in report.edits.iter().rev() {
                if let Some(row) = roster.row(edit.row_index) {
                    self.context.touch(row);
                }
            }
        }
        self.context.set_active_column(column.as_str());
        tracing::info!(
            kind = command.kind(),
            column = %column,
            applied = report.applied(),
            unresolved = report.unresolved.len(),
            skipped = report.skipped_count(),
            "Batch applied"
        );

        CommandOutcome::BatchApplied { command, report }
    }

    // =========================================================================
    // Roster edits
    // =========================================================================

    fn add_student(&mut self, command: ParsedCommand, sink: &mut dyn EditSink) -> CommandOutcome {
        let student = match &command {
            ParsedCommand::AddStudent {
                last_name,
                first_name,
                student_id,
            } => NewStudent {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                student_id: student_id.clone(),
            },
            _ => {
                return CommandOutcome::Failed {
                    error: "Not an add command".to_string(),
                    command,
                }
            }
        };

        match sink.add_row(&student) {
            Ok(row_index) => {
                tracing::info!(row_index, "Student added");
                CommandOutcome::RowAdded { command, row_index }
            }
            Err(e) => failed(command, e),
        }
    }

    fn delete_student(
        &mut self,
        command: ParsedCommand,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        let target = match &command {
            ParsedCommand::DeleteStudent { target } => target.clone(),
            _ => {
                return CommandOutcome::Failed {
                    error: "Not a delete command".to_string(),
                    command,
                }
            }
        };

        match target {
            DeleteTarget::StudentId(id) => match roster.find_by_student_id(&id) {
                Some(row) => self.delete_row(command, row.index, sink),
                None => CommandOutcome::NoMatch {
                    command,
                    search_name: id,
                },
            },
            DeleteTarget::Name(name) => {
                let resolution = self.resolver.resolve(&name, roster, None, &self.context);
                match (resolution.status, resolution.best_index) {
                    (ResolutionStatus::Resolved, Some(row_index)) => {
                        self.delete_row(command, row_index, sink)
                    }
                    (ResolutionStatus::Ambiguous, _) => {
                        let candidates = resolution.candidates.clone();
                        self.await_selection(command, candidates, resolution)
                    }
                    _ => CommandOutcome::NoMatch {
                        command,
                        search_name: name,
                    },
                }
            }
        }
    }

    fn delete_row(
        &mut self,
        command: ParsedCommand,
        row_index: usize,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        match sink.delete_row(row_index) {
            Ok(()) => {
                self.context.forget_row(row_index);
                tracing::info!(row_index, "Student deleted");
                CommandOutcome::RowDeleted { command, row_index }
            }
            Err(e) => failed(command, e),
        }
    }

    // =========================================================================
    // Disambiguation
    // =========================================================================

    fn await_selection(
        &mut self,
        command: ParsedCommand,
        candidates: Vec<MatchCandidate>,
        resolution: ResolutionResult,
    ) -> CommandOutcome {
        let begun = self.disambiguator.begin(command.clone(), candidates);
        match (begun, self.disambiguator.pending()) {
            (Ok(_), Some(pending)) => CommandOutcome::AwaitingDisambiguation {
                pending: pending.clone(),
                resolution,
            },
            (Err(e), _) => CommandOutcome::Failed {
                command,
                error: e.to_string(),
            },
            (Ok(_), None) => CommandOutcome::Failed {
                command,
                error: "Disambiguation did not start".to_string(),
            },
        }
    }

    fn settle(
        &mut self,
        command: ParsedCommand,
        roster: &Roster,
        sink: &mut dyn EditSink,
    ) -> CommandOutcome {
        let settlement = match self.disambiguator.settle(&command) {
            Ok(settlement) => settlement,
            Err(e) => {
                return CommandOutcome::Failed {
                    command,
                    error: e.to_string(),
                }
            }
        };

        match settlement {
            Settlement::Resolved { command, candidate } => {
                self.learn_from_selection(&command, &candidate, roster);
                let row_index = candidate.row_index;
                let resolution =
                    ResolutionResult::resolved(row_index, vec![candidate], ResolvedBy::Selection);
                match command {
                    ParsedCommand::DeleteStudent { .. } => self.delete_row(command, row_index, sink),
                    _ => self.apply_grade(command, row_index, resolution, roster, sink),
                }
            }
            Settlement::Cancelled { command } => CommandOutcome::Cancelled { command },
            Settlement::InvalidSelection { index, available } => {
                CommandOutcome::InvalidSelection { index, available }
            }
            Settlement::NothingPending => CommandOutcome::NothingPending,
        }
    }

    /// Remember spoken tokens that had to be disambiguated as mishearings of
    /// the chosen student's name.
    fn learn_from_selection(
        &mut self,
        command: &ParsedCommand,
        candidate: &MatchCandidate,
        roster: &Roster,
    ) {
        let spoken = match command {
            ParsedCommand::GradeEntry { search_name, .. } => search_name.clone(),
            ParsedCommand::DeleteStudent {
                target: DeleteTarget::Name(name),
            } => name.clone(),
            _ => return,
        };
        let Some(row) = roster.row(candidate.row_index) else {
            return;
        };

        let target = match candidate.matched_field {
            MatchedField::FirstName => clean(&row.first_name),
            MatchedField::LastName => clean(&row.last_name),
            MatchedField::FullName => clean(&row.full_name()),
        };
        let spoken: Vec<&str> = spoken.split_whitespace().collect();
        let target: Vec<&str> = target.split_whitespace().collect();
        if spoken.len() != target.len() {
            return;
        }

        for (heard, meant) in spoken.iter().zip(&target) {
            if self.vocabulary.contains_word(heard) {
                continue;
            }
            if self.memory.record(heard, meant) {
                tracing::debug!(heard, meant, "Correction learned");
            }
        }
    }
}

impl Default for GradebookSession {
    fn default() -> Self {
        Self::new(&GradevoxConfig::default())
    }
}

fn failed(command: ParsedCommand, error: impl std::fmt::Display) -> CommandOutcome {
    tracing::warn!(kind = command.kind(), "Edit rejected by host: {}", error);
    CommandOutcome::Failed {
        command,
        error: error.to_string(),
    }
}

fn roster_fingerprint(roster: &Roster) -> u64 {
    let mut hasher = DefaultHasher::new();
    roster.headers.hash(&mut hasher);
    for row in &roster.rows {
        row.first_name.hash(&mut hasher);
        row.last_name.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::InMemoryRoster;
    use gradevox_core::RosterRow;

    fn sink() -> InMemoryRoster {
        InMemoryRoster::new(Roster::new(
            vec![
                "First Name".into(),
                "Last Name".into(),
                "Quiz 1".into(),
                "Lab 2".into(),
            ],
            vec![
                RosterRow::new(0, "Maria", "Smith").with_field("Quiz 1", "90"),
                RosterRow::new(1, "Maria", "Cruz").with_field("Quiz 1", "88"),
                RosterRow::new(2, "Jon", "Lee").with_student_id("1002"),
            ],
        ))
    }

    fn say(
        session: &mut GradebookSession,
        sink: &mut InMemoryRoster,
        text: &str,
    ) -> CommandOutcome {
        let roster = sink.roster().clone();
        session.process(&TranscriptEvent::final_text(text), &roster, sink)
    }

    #[test]
    fn test_interim_events_are_ignored() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        let roster = sink.roster().clone();
        let outcome = session.process(&TranscriptEvent::interim("jon 90"), &roster, &mut sink);
        assert_eq!(outcome, CommandOutcome::Ignored);
    }

    #[test]
    fn test_grade_entry_applies_and_sets_active_column() {
        let mut session = GradebookSession::default();
        let mut sink = sink();

        let outcome = say(&mut session, &mut sink, "jon lee quiz 1 eighty five");
        assert!(matches!(outcome, CommandOutcome::Applied { .. }), "{:?}", outcome);
        assert_eq!(sink.roster().rows[2].value("Quiz 1"), Some("85"));
        assert_eq!(session.context().active_column(), Some("Quiz 1"));
        assert_eq!(session.context().most_recent().unwrap().row_index, 2);

        // Column carries over
        let outcome = say(&mut session, &mut sink, "maria smith 70");
        assert!(matches!(outcome, CommandOutcome::Applied { .. }), "{:?}", outcome);
        assert_eq!(sink.roster().rows[0].value("Quiz 1"), Some("70"));
    }

    #[test]
    fn test_missing_column() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        let outcome = say(&mut session, &mut sink, "jon 77");
        assert!(matches!(outcome, CommandOutcome::MissingColumn { .. }));
    }

    #[test]
    fn test_ambiguous_then_select() {
        let mut session = GradebookSession::default();
        let mut sink = sink();

        let outcome = say(&mut session, &mut sink, "maria quiz 1 95");
        match &outcome {
            CommandOutcome::AwaitingDisambiguation { pending, .. } => {
                assert_eq!(pending.candidates.len(), 2)
            }
            other => panic!("expected prompt, got {:?}", other),
        }
        assert!(session.pending().is_some());

        let outcome = say(&mut session, &mut sink, "option 2");
        assert!(matches!(outcome, CommandOutcome::Applied { .. }), "{:?}", outcome);
        assert_eq!(sink.roster().rows[1].value("Quiz 1"), Some("95"));
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_invalid_selection_keeps_prompt() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        say(&mut session, &mut sink, "maria quiz 1 95");

        let outcome = say(&mut session, &mut sink, "option 7");
        assert_eq!(
            outcome,
            CommandOutcome::InvalidSelection {
                index: 6,
                available: 2
            }
        );
        assert!(session.pending().is_some());
    }

    #[test]
    fn test_new_command_cancels_prompt() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        say(&mut session, &mut sink, "maria quiz 1 95");

        let outcome = say(&mut session, &mut sink, "jon lee lab 2 60");
        assert!(matches!(outcome, CommandOutcome::Applied { .. }), "{:?}", outcome);
        assert!(session.pending().is_none());
        assert_eq!(sink.roster().rows[0].value("Quiz 1"), Some("90"));
        assert_eq!(sink.roster().rows[1].value("Quiz 1"), Some("88"));
    }

    #[test]
    fn test_reject_cancels() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        say(&mut session, &mut sink, "maria quiz 1 95");
        assert!(matches!(
            say(&mut session, &mut sink, "cancel"),
            CommandOutcome::Cancelled { .. }
        ));
        assert_eq!(say(&mut session, &mut sink, "yes"), CommandOutcome::NothingPending);
    }

    #[test]
    fn test_undo_redo_forwarded() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        say(&mut session, &mut sink, "jon lee quiz 1 50");

        assert_eq!(
            say(&mut session, &mut sink, "undo"),
            CommandOutcome::HostCommand {
                command: ParsedCommand::Undo,
                changed: true
            }
        );
        assert!(!sink.roster().rows[2].has_value("Quiz 1"));
        assert_eq!(
            say(&mut session, &mut sink, "redo"),
            CommandOutcome::HostCommand {
                command: ParsedCommand::Redo,
                changed: true
            }
        );
    }

    #[test]
    fn test_add_and_delete_student() {
        let mut session = GradebookSession::default();
        let mut sink = sink();

        let outcome = say(&mut session, &mut sink, "add student tim okafor");
        assert!(matches!(outcome, CommandOutcome::RowAdded { row_index: 3, .. }));

        let outcome = say(&mut session, &mut sink, "delete student id 1002");
        assert!(matches!(outcome, CommandOutcome::RowDeleted { row_index: 2, .. }));
        assert_eq!(sink.roster().len(), 3);
        assert_eq!(sink.roster().rows[2].first_name, "Tim");
    }

    #[test]
    fn test_delete_ambiguous_name_prompts() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        let outcome = say(&mut session, &mut sink, "delete maria");
        assert!(matches!(outcome, CommandOutcome::AwaitingDisambiguation { .. }));

        let outcome = say(&mut session, &mut sink, "first");
        assert!(matches!(outcome, CommandOutcome::RowDeleted { row_index: 0, .. }));
        assert_eq!(sink.roster().rows[0].last_name, "Cruz");
    }

    #[test]
    fn test_unknown_keeps_alternatives() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        let roster = sink.roster().clone();
        let event = TranscriptEvent::with_alternatives(vec![
            Alternative::new("what a lovely day", 0.9),
            Alternative::new("what a lovely bay", 0.4),
        ]);
        match session.process(&event, &roster, &mut sink) {
            CommandOutcome::Unknown {
                original_text,
                alternatives,
            } => {
                assert_eq!(original_text, "what a lovely day");
                assert_eq!(alternatives.len(), 2);
            }
            other => panic!("expected unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_ranked_alternative_can_win() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        let roster = sink.roster().clone();
        let event = TranscriptEvent::with_alternatives(vec![
            Alternative::new("what a lovely day", 0.9),
            Alternative::new("jon lee lab 2 70", 0.4),
        ]);
        let outcome = session.process(&event, &roster, &mut sink);
        assert!(matches!(outcome, CommandOutcome::Applied { .. }), "{:?}", outcome);
        assert_eq!(sink.roster().rows[2].value("Lab 2"), Some("70"));
    }

    #[test]
    fn test_batch_range_applies_rows() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        match say(&mut session, &mut sink, "lab 2 rows 1 through 3 score 100") {
            CommandOutcome::BatchApplied { report, .. } => {
                assert_eq!(report.applied(), 3);
                assert_eq!(report.column, "Lab 2");
            }
            other => panic!("expected batch, got {:?}", other),
        }
        assert!(sink.roster().rows.iter().all(|r| r.value("Lab 2") == Some("100")));
    }

    #[test]
    fn test_sort_clears_recent_students() {
        let mut session = GradebookSession::default();
        let mut sink = sink();
        say(&mut session, &mut sink, "jon lee quiz 1 50");
        assert!(session.context().most_recent().is_some());

        let outcome = say(&mut session, &mut sink, "sort by first name");
        assert!(matches!(outcome, CommandOutcome::HostCommand { changed: true, .. }));
        assert!(session.context().most_recent().is_none());
        assert_eq!(sink.roster().rows[0].first_name, "Jon");
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(CommandOutcome::NothingPending).unwrap();
        assert_eq!(json["outcome"], "nothing_pending");
    }
}
