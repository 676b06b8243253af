//! Dynamic vocabulary derived from the current roster.

use std::collections::BTreeSet;

use gradevox_core::Roster;
use serde::{Deserialize, Serialize};

use crate::tables::is_number_word;
use crate::text::{clean, is_alphabetic};

/// Words from column headers and student names, used to pull misheard tokens
/// back onto roster spellings.
///
/// Both sets are ordered so that iteration (and therefore tie-breaking during
/// context correction) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextVocabulary {
    words: BTreeSet<String>,
    student_names: BTreeSet<String>,
}

impl ContextVocabulary {
    pub fn build(roster: &Roster) -> Self {
        let mut vocab = Self::default();

        for header in &roster.headers {
            for token in clean(header).split_whitespace() {
                if is_vocabulary_token(token) {
                    vocab.words.insert(token.to_string());
                }
            }
        }

        for row in &roster.rows {
            let names = format!("{} {}", row.first_name, row.last_name);
            for token in clean(&names).split_whitespace() {
                if is_vocabulary_token(token) {
                    vocab.words.insert(token.to_string());
                    vocab.student_names.insert(token.to_string());
                }
            }
        }

        tracing::debug!(
            words = vocab.words.len(),
            student_names = vocab.student_names.len(),
            "Context vocabulary built"
        );
        vocab
    }

    pub fn words(&self) -> &BTreeSet<String> {
        &self.words
    }

    pub fn student_names(&self) -> &BTreeSet<String> {
        &self.student_names
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn is_student_name(&self, word: &str) -> bool {
        self.student_names.contains(word)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Number words and the glue words of spoken numbers stay out of the
/// vocabulary so number conversion always sees them.
fn is_vocabulary_token(token: &str) -> bool {
    token.len() >= 2
        && is_alphabetic(token)
        && !is_number_word(token)
        && !matches!(token, "point" | "and" | "hundred")
}
