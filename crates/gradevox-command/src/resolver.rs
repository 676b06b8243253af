//! Fuzzy entity resolution: spoken name fragment to roster rows.
//!
//! Every row is scored on three candidate strings (first name, last name and
//! full name) through the configured [`MatchStrategy`]. The best string per
//! row becomes a [`MatchCandidate`]. A fixed policy then decides between a
//! single row, an ambiguous set, or no match.

use std::sync::Arc;

use gradevox_core::config::ResolverConfig;
use gradevox_core::{Roster, RosterRow};

use crate::context::SessionContext;
use crate::phonetic::{strategy_by_name, MatchStrategy};
use crate::text::clean;
use crate::types::{MatchCandidate, MatchType, MatchedField, ResolutionResult, ResolvedBy};

pub struct Resolver {
    config: ResolverConfig,
    strategy: Arc<dyn MatchStrategy>,
}

impl Resolver {
    /// Build a resolver using the strategy named in `config.strategy`.
    pub fn new(config: ResolverConfig) -> Self {
        let strategy: Arc<dyn MatchStrategy> = Arc::from(strategy_by_name(&config.strategy));
        Self { config, strategy }
    }

    pub fn with_strategy(config: ResolverConfig, strategy: Arc<dyn MatchStrategy>) -> Self {
        Self { config, strategy }
    }

    pub fn strategy(&self) -> Arc<dyn MatchStrategy> {
        Arc::clone(&self.strategy)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Score `spoken` against one candidate string. Scorers are tried in
    /// the order exact, phonetic, partial, fuzzy.
    pub fn score(&self, spoken: &str, candidate: &str) -> Option<(MatchType, u32)> {
        if spoken.is_empty() || candidate.is_empty() {
            return None;
        }
        let s = &self.strategy;
        s.exact(spoken, candidate)
            .map(|score| (MatchType::Exact, score))
            .or_else(|| s.phonetic(spoken, candidate).map(|v| (MatchType::Phonetic, v)))
            .or_else(|| s.partial(spoken, candidate).map(|v| (MatchType::Partial, v)))
            .or_else(|| {
                s.fuzzy(spoken, candidate, self.config.fuzzy_similarity_floor)
                    .map(|v| (MatchType::Fuzzy, v))
            })
    }

    /// All rows matching `spoken` below the score cap, sorted by score and
    /// then row index.
    pub fn candidates(
        &self,
        spoken: &str,
        roster: &Roster,
        target_column: Option<&str>,
    ) -> Vec<MatchCandidate> {
        let spoken = clean(spoken);
        if spoken.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<MatchCandidate> = roster
            .rows
            .iter()
            .filter_map(|row| self.best_for_row(&spoken, row, target_column))
            .filter(|c| c.score < self.config.max_candidate_score)
            .collect();
        candidates.sort_by_key(|c| (c.score, c.row_index));
        candidates
    }

    fn best_for_row(
        &self,
        spoken: &str,
        row: &RosterRow,
        target_column: Option<&str>,
    ) -> Option<MatchCandidate> {
        let strings = [
            (MatchedField::FirstName, clean(&row.first_name)),
            (MatchedField::LastName, clean(&row.last_name)),
            (MatchedField::FullName, clean(&row.full_name())),
        ];

        let mut best: Option<(MatchedField, MatchType, u32)> = None;
        for (field, candidate) in &strings {
            if let Some((match_type, score)) = self.score(spoken, candidate) {
                // Strictly better only, so ties keep field order
                if best.map_or(true, |(_, _, b)| score < b) {
                    best = Some((*field, match_type, score));
                }
            }
        }

        best.map(|(matched_field, match_type, score)| MatchCandidate {
            row_index: row.index,
            matched_field,
            match_type,
            score,
            has_existing_value_in_target_column: target_column
                .is_some_and(|col| row.has_value(col)),
        })
    }

    /// Resolve `spoken` to a row.
    ///
    /// Policy, first applicable rule wins:
    /// no candidates; a single candidate; a unique exact match; several exact
    /// matches (narrowed by the empty-target-column rule, else ambiguous);
    /// a unique empty target cell; the most recent student; several within
    /// the ambiguity window; the lowest score.
    pub fn resolve(
        &self,
        spoken: &str,
        roster: &Roster,
        target_column: Option<&str>,
        context: &SessionContext,
    ) -> ResolutionResult {
        let candidates = self.candidates(spoken, roster, target_column);
        let result = self.apply_policy(candidates, roster, target_column, context);
        tracing::debug!(
            spoken,
            status = ?result.status,
            best_index = ?result.best_index,
            resolved_by = ?result.resolved_by,
            candidates = result.candidates.len(),
            "Name resolved"
        );
        result
    }

    fn apply_policy(
        &self,
        candidates: Vec<MatchCandidate>,
        roster: &Roster,
        target_column: Option<&str>,
        context: &SessionContext,
    ) -> ResolutionResult {
        let Some(first) = candidates.first() else {
            return ResolutionResult::none();
        };

        if candidates.len() == 1 {
            let index = first.row_index;
            return ResolutionResult::resolved(index, candidates, ResolvedBy::SingleCandidate);
        }

        let exact: Vec<MatchCandidate> =
            candidates.iter().filter(|c| c.score == 0).cloned().collect();
        if exact.len() == 1 {
            let index = exact[0].row_index;
            return ResolutionResult::resolved(index, candidates, ResolvedBy::UniqueExact);
        }
        if exact.len() > 1 {
            if let Some(index) = unique_empty_target(&exact, target_column) {
                return ResolutionResult::resolved(index, exact, ResolvedBy::EmptyTargetColumn);
            }
            return ResolutionResult::ambiguous(exact);
        }

        if let Some(index) = unique_empty_target(&candidates, target_column) {
            return ResolutionResult::resolved(index, candidates, ResolvedBy::EmptyTargetColumn);
        }

        if let Some(index) = recent_candidate(&candidates, roster, context) {
            return ResolutionResult::resolved(index, candidates, ResolvedBy::RecentStudent);
        }

        let best_score = first.score;
        let window: Vec<MatchCandidate> = candidates
            .iter()
            .filter(|c| c.score <= best_score + self.config.ambiguity_window)
            .cloned()
            .collect();
        if window.len() > 1 {
            return ResolutionResult::ambiguous(window);
        }

        let index = first.row_index;
        ResolutionResult::resolved(index, candidates, ResolvedBy::LowestScore)
    }
}

/// The single candidate whose target cell is empty while every other
/// candidate's is filled.
fn unique_empty_target(candidates: &[MatchCandidate], target_column: Option<&str>) -> Option<usize> {
    target_column?;
    let mut empty = candidates
        .iter()
        .filter(|c| !c.has_existing_value_in_target_column);
    let only = empty.next()?;
    if empty.next().is_some() {
        return None;
    }
    Some(only.row_index)
}

/// The candidate that is the most recently touched student, provided the
/// row still carries the same name.
fn recent_candidate(
    candidates: &[MatchCandidate],
    roster: &Roster,
    context: &SessionContext,
) -> Option<usize> {
    let recent = context.most_recent()?;
    let row = roster.row(recent.row_index)?;
    if row.first_name != recent.first_name || row.last_name != recent.last_name {
        return None;
    }
    candidates
        .iter()
        .find(|c| c.row_index == recent.row_index)
        .map(|c| c.row_index)
}
