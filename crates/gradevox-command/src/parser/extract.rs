//! Score and student-name extraction for grade commands.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::SessionContext;
use crate::phonetic::MatchStrategy;
use crate::tables::{is_domain_term, is_reserved};
use crate::text::{clean, is_numeric};
use crate::vocabulary::ContextVocabulary;

use super::column::ColumnMatcher;

// =============================================================================
// Score patterns (tried in order, first match wins)
// =============================================================================

static TRAILING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<before>.*?)\s*\b(?P<n>\d+(?:\.\d+)?)$").expect("Invalid score regex")
});

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<before>.*?)\s*\b(?P<n>\d+(?:\.\d+)?)\s+percent\b\s*(?P<after>.*)$")
        .expect("Invalid score regex")
});

static POINTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<before>.*?)\s*\b(?P<n>\d+(?:\.\d+)?)\s+points?\b\s*(?P<after>.*)$")
        .expect("Invalid score regex")
});

static OUT_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<before>.*?)\s*\b(?P<n>\d+(?:\.\d+)?)\s+out\s+of\s+(?P<m>\d+(?:\.\d+)?)\b\s*(?P<after>.*)$",
    )
    .expect("Invalid score regex")
});

/// A score found in a command, with the text on either side of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatch {
    pub value: String,
    pub out_of: Option<String>,
    pub before: String,
    pub after: String,
}

/// Find the score in normalized text: a bare trailing number (unless it
/// follows "out of"), then `<n> percent`, `<n> points`, `<n> out of <m>`.
pub fn extract_score(text: &str) -> Option<ScoreMatch> {
    if let Some(caps) = TRAILING_NUMBER.captures(text) {
        let before = caps["before"].trim();
        let after_out_of = before == "out of" || before.ends_with(" out of");
        if !after_out_of {
            return Some(ScoreMatch {
                value: caps["n"].to_string(),
                out_of: None,
                before: before.to_string(),
                after: String::new(),
            });
        }
    }

    for pattern in [&*PERCENT, &*POINTS] {
        if let Some(caps) = pattern.captures(text) {
            return Some(ScoreMatch {
                value: caps["n"].to_string(),
                out_of: None,
                before: caps["before"].trim().to_string(),
                after: caps["after"].trim().to_string(),
            });
        }
    }

    OUT_OF.captures(text).map(|caps| ScoreMatch {
        value: caps["n"].to_string(),
        out_of: Some(caps["m"].to_string()),
        before: caps["before"].trim().to_string(),
        after: caps["after"].trim().to_string(),
    })
}

/// The last numeric token, with its position.
pub fn last_number<'t>(tokens: &[&'t str]) -> Option<(usize, &'t str)> {
    tokens
        .iter()
        .enumerate()
        .rev()
        .find(|(_, t)| is_numeric(t))
        .map(|(i, t)| (i, *t))
}

// =============================================================================
// Names
// =============================================================================

/// Everything the name extractor needs to know about the session.
pub struct NameContext<'a> {
    pub columns: &'a ColumnMatcher,
    pub column: Option<&'a str>,
    pub vocabulary: &'a ContextVocabulary,
    pub context: &'a SessionContext,
    pub strategy: &'a dyn MatchStrategy,
    pub max_tokens: usize,
}

/// Tokens that can be part of a spoken name: not numeric, not a word of the
/// target column, not filler, grammar or a graded-item term. Known student
/// names are always kept.
pub fn name_tokens<'t>(tokens: &[&'t str], ctx: &NameContext<'_>) -> Vec<&'t str> {
    tokens
        .iter()
        .copied()
        .filter(|t| {
            if ctx.vocabulary.is_student_name(t) {
                return true;
            }
            let column_word = ctx
                .column
                .is_some_and(|c| ctx.columns.is_header_word(c, t));
            !(column_word || is_numeric(t) || is_reserved(t) || is_domain_term(t))
        })
        .collect()
}

/// Extract the spoken student name from the text before the score.
///
/// A one- or two-token window matching a recently touched student wins.
/// Otherwise the name is capped to `max_tokens` tokens starting at the first
/// known student name.
pub fn extract_name(tokens: &[&str], ctx: &NameContext<'_>) -> String {
    let candidates = name_tokens(tokens, ctx);
    if candidates.is_empty() {
        return String::new();
    }

    if let Some(window) = recent_window(&candidates, ctx) {
        return window;
    }

    let start = candidates
        .iter()
        .position(|t| ctx.vocabulary.is_student_name(t))
        .unwrap_or(0);
    candidates[start..]
        .iter()
        .take(ctx.max_tokens.max(1))
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn recent_window(candidates: &[&str], ctx: &NameContext<'_>) -> Option<String> {
    if ctx.context.most_recent().is_none() {
        return None;
    }
    for size in [2, 1] {
        if size > candidates.len() {
            continue;
        }
        for window in candidates.windows(size) {
            let spoken = window.join(" ");
            let matches_recent = ctx.context.recent().any(|student| {
                let first = clean(&student.first_name);
                let last = clean(&student.last_name);
                let full = clean(&format!("{} {}", student.first_name, student.last_name));
                [first, last, full].iter().any(|name| {
                    !name.is_empty()
                        && (ctx.strategy.exact(&spoken, name).is_some()
                            || ctx.strategy.phonetic(&spoken, name).is_some())
                })
            });
            if matches_recent {
                return Some(spoken);
            }
        }
    }
    None
}
