//! Command grammar parser.
//!
//! Matches normalized text against an ordered set of command shapes and
//! produces exactly one [`ParsedCommand`]. The first shape that matches
//! wins; text matching nothing becomes [`ParsedCommand::Unknown`].

pub mod column;
pub mod extract;

use std::sync::{Arc, LazyLock};

use regex::Regex;

use gradevox_core::config::ParserConfig;

use crate::context::SessionContext;
use crate::phonetic::MatchStrategy;
use crate::tables::{
    self, is_domain_term, is_filler, is_reserved, CONFIRM_PHRASES, ORDINALS, REDO_PHRASES,
    REJECT_PHRASES, UNDO_PHRASES,
};
use crate::text::{is_alphabetic, is_numeric, title_case};
use crate::types::{
    BatchEntry, DeleteTarget, EveryoneCondition, ParsedCommand, SortDirection, SortField,
};
use crate::vocabulary::ContextVocabulary;

use self::column::ColumnMatcher;
use self::extract::{extract_name, extract_score, last_number, NameContext};

// =============================================================================
// Compiled patterns
// =============================================================================

static BATCH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<col>.*?)\s*\brows?\s+(?P<start>\d+)\s+(?:through|thru|to|until|till)\s+(?P<end>\d+)\b(?P<rest>.*)$",
    )
    .expect("Invalid batch range regex")
});

static SELECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:row|option|number|choice|candidate|pick|select|choose|the)\s+)+(?P<n>\d+)$",
    )
    .expect("Invalid selection regex")
});

static ORDINAL_SELECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:pick|select|choose|the)\s+)*(?P<ord>first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)(?:\s+(?:one|1|option|choice|student))?$",
    )
    .expect("Invalid selection regex")
});

static SORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^sort(?:\s+(?:the\s+)?(?:roster|list|students|class))?(?:\s+by)?(?:\s+(?P<rest>.*))?$",
    )
    .expect("Invalid sort regex")
});

/// Direction phrases accepted at the end of a sort command, longest first.
const SORT_DIRECTIONS: &[(&str, SortDirection)] = &[
    ("highest to lowest", SortDirection::Descending),
    ("lowest to highest", SortDirection::Ascending),
    ("high to low", SortDirection::Descending),
    ("low to high", SortDirection::Ascending),
    ("a to z", SortDirection::Ascending),
    ("z to a", SortDirection::Descending),
    ("ascending", SortDirection::Ascending),
    ("descending", SortDirection::Descending),
    ("reverse", SortDirection::Descending),
];

const EVERYONE_PHRASES: &[&str] = &[
    "all the students",
    "all students",
    "every student",
    "everyone",
    "everybody",
    "whole class",
    "entire class",
    "the class",
];

const PRESENT_WORDS: &[&str] = &["present", "here", "attending"];

const ADD_VERBS: &[&str] = &["add", "new", "create", "enroll"];
const DELETE_VERBS: &[&str] = &["delete", "remove", "drop"];

/// Upper bound on the column prefix of a batch-list command.
const MAX_BATCH_PREFIX: usize = 4;

// =============================================================================
// Parser
// =============================================================================

/// One utterance plus the roster-derived context it is parsed against.
pub struct ParseInput<'a> {
    /// Normalized text.
    pub text: &'a str,
    pub headers: &'a [String],
    pub vocabulary: &'a ContextVocabulary,
    pub context: &'a SessionContext,
}

pub struct CommandParser {
    config: ParserConfig,
    strategy: Arc<dyn MatchStrategy>,
}

impl CommandParser {
    pub fn new(config: ParserConfig, strategy: Arc<dyn MatchStrategy>) -> Self {
        Self { config, strategy }
    }

    /// Parse one normalized utterance. Never fails: unmatched text becomes
    /// `Unknown` with no alternatives attached.
    pub fn parse(&self, input: &ParseInput<'_>) -> ParsedCommand {
        let text = input.text.trim();
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let columns = ColumnMatcher::new(input.headers, &self.config);

        let command = if tokens.is_empty() {
            None
        } else {
            self.parse_batch_list(&tokens, &columns)
                .or_else(|| parse_batch_range(text, &columns))
                .or_else(|| parse_batch_everyone(&tokens, &columns))
                .or_else(|| parse_undo_redo(text))
                .or_else(|| parse_selection(text))
                .or_else(|| parse_sort(text, &columns))
                .or_else(|| self.parse_grade_entry(&tokens, &columns, input))
                .or_else(|| parse_add_student(&tokens))
                .or_else(|| parse_delete_student(&tokens))
                .or_else(|| parse_confirm_reject(text))
        };

        let command = command.unwrap_or_else(|| ParsedCommand::Unknown {
            original_text: text.to_string(),
            alternatives: Vec::new(),
        });
        tracing::debug!(kind = command.kind(), text, "Command parsed");
        command
    }

    // =========================================================================
    // Batch list: <col> name score name score ...
    // =========================================================================

    fn parse_batch_list(&self, tokens: &[&str], columns: &ColumnMatcher) -> Option<ParsedCommand> {
        for k in 0..=MAX_BATCH_PREFIX.min(tokens.len()) {
            let (prefix, rest) = tokens.split_at(k);
            let column = if k == 0 {
                columns.fallback().map(str::to_string)
            } else {
                match columns.best_match(prefix) {
                    Some(m) => Some(m.header),
                    None => continue,
                }
            };

            if let Some(entries) = self.parse_pairs(rest) {
                return Some(ParsedCommand::BatchList { column, entries });
            }
        }
        None
    }

    /// Split `tokens` fully into at least two `name score` pairs.
    fn parse_pairs(&self, tokens: &[&str]) -> Option<Vec<BatchEntry>> {
        let mut entries = Vec::new();
        let mut name: Vec<&str> = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            if is_numeric(token) {
                if name.is_empty() || name.len() > self.config.max_name_tokens {
                    return None;
                }
                entries.push(BatchEntry::new(name.join(" "), token));
                name.clear();
                // Units after the score belong to it
                if tokens
                    .get(i + 1)
                    .is_some_and(|t| matches!(*t, "percent" | "points" | "point"))
                {
                    i += 1;
                }
            } else if !(is_reserved(token) || is_domain_term(token)) {
                name.push(token);
            }
            i += 1;
        }

        if !name.is_empty() || entries.len() < 2 {
            return None;
        }
        Some(entries)
    }

    // =========================================================================
    // Single grade entry
    // =========================================================================

    fn parse_grade_entry(
        &self,
        tokens: &[&str],
        columns: &ColumnMatcher,
        input: &ParseInput<'_>,
    ) -> Option<ParsedCommand> {
        let first = tokens.first()?;
        if ADD_VERBS.contains(first) || DELETE_VERBS.contains(first) || *first == "sort" {
            return None;
        }

        let (tokens, trailing_column) = strip_trailing_header(tokens, columns);
        if trailing_column.is_none() {
            // "maria quiz 1": the header's number is not a score
            if let Some((header, _)) = columns.trailing_header(tokens) {
                if columns.is_numbered(header) {
                    return None;
                }
            }
        }

        let text = tokens.join(" ");
        let score = extract_score(&text)?;
        let before: Vec<&str> = score.before.split_whitespace().collect();
        let after: Vec<&str> = score.after.split_whitespace().collect();

        let column = trailing_column.or_else(|| {
            let mut around = before.clone();
            around.extend(after.iter().copied());
            columns.resolve(&around).map(|m| m.header)
        });

        let name_ctx = NameContext {
            columns,
            column: column.as_deref(),
            vocabulary: input.vocabulary,
            context: input.context,
            strategy: self.strategy.as_ref(),
            max_tokens: self.config.max_name_tokens,
        };
        let search_name = extract_name(&before, &name_ctx);
        if search_name.is_empty() {
            return None;
        }

        Some(ParsedCommand::GradeEntry {
            search_name,
            column,
            value: score.value,
            out_of: score.out_of,
        })
    }
}

// =============================================================================
// Batch range and everyone
// =============================================================================

fn parse_batch_range(text: &str, columns: &ColumnMatcher) -> Option<ParsedCommand> {
    let caps = BATCH_RANGE.captures(text)?;
    let start: usize = caps["start"].parse().ok()?;
    let end: usize = caps["end"].parse().ok()?;
    if start == 0 || end == 0 {
        return None;
    }

    let rest: Vec<&str> = caps["rest"].split_whitespace().collect();
    let (rest, trailing_column) = strip_trailing_header(&rest, columns);
    let (score_pos, score) = last_number(rest)?;

    let column = trailing_column.or_else(|| {
        let mut around: Vec<&str> = caps["col"].split_whitespace().collect();
        around.extend(rest[..score_pos].iter().copied());
        columns.resolve(&around).map(|m| m.header)
    });

    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    Some(ParsedCommand::BatchRange {
        column,
        start_row: lo - 1,
        end_row: hi - 1,
        score: score.to_string(),
    })
}

fn parse_batch_everyone(tokens: &[&str], columns: &ColumnMatcher) -> Option<ParsedCommand> {
    let text = format!(" {} ", tokens.join(" "));
    let phrase = EVERYONE_PHRASES
        .iter()
        .find(|p| text.contains(&format!(" {} ", p)))?;

    let condition = if tokens.iter().any(|t| PRESENT_WORDS.contains(t)) {
        EveryoneCondition::Present
    } else {
        EveryoneCondition::All
    };

    let (tokens, trailing_column) = strip_trailing_header(tokens, columns);
    let (score_pos, score) = last_number(tokens)?;

    let column = trailing_column.or_else(|| {
        let phrase_words: Vec<&str> = phrase.split(' ').collect();
        let around: Vec<&str> = tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| *i != score_pos && !phrase_words.contains(*t))
            .map(|(_, t)| *t)
            .collect();
        columns.resolve(&around).map(|m| m.header)
    });

    Some(ParsedCommand::BatchEveryone {
        column,
        score: score.to_string(),
        condition,
    })
}

/// Strip a header spoken after the score ("... 5 on quiz 1") together with
/// the filler in front of it. Only applies when a score is left at the end.
fn strip_trailing_header<'a, 't>(
    tokens: &'a [&'t str],
    columns: &ColumnMatcher,
) -> (&'a [&'t str], Option<String>) {
    let Some((header, n)) = columns.trailing_header(tokens) else {
        return (tokens, None);
    };

    let mut kept = &tokens[..tokens.len() - n];
    while let Some((last, init)) = kept.split_last() {
        if is_filler(last) && !matches!(*last, "percent" | "points" | "point") {
            kept = init;
        } else {
            break;
        }
    }

    if extract_score(&kept.join(" ")).is_some() {
        (kept, Some(header.to_string()))
    } else {
        (tokens, None)
    }
}

// =============================================================================
// Keyword commands
// =============================================================================

fn parse_undo_redo(text: &str) -> Option<ParsedCommand> {
    if UNDO_PHRASES.contains(&text) {
        Some(ParsedCommand::Undo)
    } else if REDO_PHRASES.contains(&text) {
        Some(ParsedCommand::Redo)
    } else {
        None
    }
}

fn parse_selection(text: &str) -> Option<ParsedCommand> {
    if let Some(caps) = SELECTION.captures(text) {
        let n: usize = caps["n"].parse().ok()?;
        return n.checked_sub(1).map(|index| ParsedCommand::SelectCandidate { index });
    }
    let caps = ORDINAL_SELECTION.captures(text)?;
    let n = tables::lookup(ORDINALS, &caps["ord"])?;
    Some(ParsedCommand::SelectCandidate { index: n - 1 })
}

fn parse_confirm_reject(text: &str) -> Option<ParsedCommand> {
    if CONFIRM_PHRASES.contains(&text) {
        Some(ParsedCommand::Confirm)
    } else if REJECT_PHRASES.contains(&text) {
        Some(ParsedCommand::Reject)
    } else {
        None
    }
}

// =============================================================================
// Sort
// =============================================================================

fn parse_sort(text: &str, columns: &ColumnMatcher) -> Option<ParsedCommand> {
    let caps = SORT.captures(text)?;
    let mut rest = caps.name("rest").map_or("", |m| m.as_str()).trim();

    let mut direction = SortDirection::Ascending;
    for (phrase, dir) in SORT_DIRECTIONS {
        if rest == *phrase {
            rest = "";
            direction = *dir;
            break;
        }
        if let Some(stripped) = rest.strip_suffix(*phrase) {
            if stripped.ends_with(' ') {
                rest = stripped.trim_end();
                direction = *dir;
                break;
            }
        }
    }

    let field = match rest {
        "" | "name" | "last" | "last name" | "lastname" | "surname" => SortField::LastName,
        "first" | "first name" | "firstname" => SortField::FirstName,
        "id" | "student id" | "student number" | "number" => SortField::StudentId,
        other => {
            let tokens: Vec<&str> = other.split_whitespace().collect();
            SortField::Column(columns.best_match(&tokens)?.header)
        }
    };

    Some(ParsedCommand::Sort { field, direction })
}

// =============================================================================
// Roster edits
// =============================================================================

fn parse_add_student(tokens: &[&str]) -> Option<ParsedCommand> {
    let (verb, rest) = tokens.split_first()?;
    if !ADD_VERBS.contains(verb) {
        return None;
    }

    let mut rest = rest;
    while let Some((t, tail)) = rest.split_first() {
        if matches!(*t, "a" | "new" | "student" | "named" | "called") {
            rest = tail;
        } else {
            break;
        }
    }

    let name_len = rest
        .iter()
        .take_while(|t| is_alphabetic(t) && !matches!(**t, "id" | "number"))
        .count();
    let (names, tail) = rest.split_at(name_len);
    let (first, last) = names.split_first()?;

    let digits: Vec<&str> = tail
        .iter()
        .copied()
        .filter(|t| !matches!(*t, "id" | "number" | "student"))
        .collect();
    if !digits.iter().all(|t| t.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let student_id = (!digits.is_empty()).then(|| digits.concat());

    Some(ParsedCommand::AddStudent {
        last_name: title_case(&last.join(" ")),
        first_name: title_case(first),
        student_id,
    })
}

fn parse_delete_student(tokens: &[&str]) -> Option<ParsedCommand> {
    let (verb, rest) = tokens.split_first()?;
    if !DELETE_VERBS.contains(verb) {
        return None;
    }

    let words: Vec<&str> = rest
        .iter()
        .copied()
        .filter(|t| !matches!(*t, "student" | "the" | "id" | "number" | "named" | "called"))
        .collect();
    if words.is_empty() {
        return None;
    }

    let target = if words.iter().all(|t| t.bytes().all(|b| b.is_ascii_digit())) {
        DeleteTarget::StudentId(words.concat())
    } else {
        DeleteTarget::Name(words.join(" "))
    };
    Some(ParsedCommand::DeleteStudent { target })
}
