//! Corrections learned from disambiguation choices.
//!
//! When a teacher picks a candidate after a misheard name, the heard token and
//! the chosen spelling are recorded. Corrections seen often enough are applied
//! by the normalizer on later utterances. The memory lives for the process
//! lifetime and only ever grows. A deserialized memory goes through the same
//! refusal rules as [`CorrectionMemory::record`], so a stored file cannot
//! carry a pair that breaks normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tables::{is_correction_key, is_phrase_key_word, is_reserved, PHONETIC_CORRECTIONS};
use crate::text::is_alphabetic;

type Entries = BTreeMap<String, BTreeMap<String, u32>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredMemory")]
pub struct CorrectionMemory {
    /// mistaken -> (corrected -> times seen)
    entries: Entries,
}

/// On-disk shape, validated pair by pair on load.
#[derive(Deserialize)]
struct StoredMemory {
    #[serde(default)]
    entries: Entries,
}

impl From<StoredMemory> for CorrectionMemory {
    fn from(stored: StoredMemory) -> Self {
        let mut memory = CorrectionMemory::new();
        for (mistaken, targets) in stored.entries {
            for (corrected, count) in targets {
                if count == 0 || memory.refuses(&mistaken, &corrected) {
                    tracing::warn!(
                        mistaken = %mistaken,
                        corrected = %corrected,
                        "Dropping stored correction"
                    );
                    continue;
                }
                memory
                    .entries
                    .entry(mistaken.clone())
                    .or_default()
                    .insert(corrected, count);
            }
        }
        memory
    }
}

impl CorrectionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation of `mistaken` meaning `corrected`.
    ///
    /// Returns `false` when the pair is refused. Refused pairs are those that
    /// would let a learned rewrite feed another rewrite on a later pass.
    pub fn record(&mut self, mistaken: &str, corrected: &str) -> bool {
        let mistaken = mistaken.trim();
        let corrected = corrected.trim();

        if self.refuses(mistaken, corrected) {
            tracing::debug!(mistaken, corrected, "Correction refused");
            return false;
        }

        let count = self
            .entries
            .entry(mistaken.to_string())
            .or_default()
            .entry(corrected.to_string())
            .or_insert(0);
        *count += 1;
        tracing::debug!(mistaken, corrected, count = *count, "Correction recorded");
        true
    }

    /// The most frequent correction for `token` seen at least `min_count`
    /// times. Equal counts resolve to the lexically smallest target.
    pub fn lookup(&self, token: &str, min_count: u32) -> Option<&str> {
        let targets = self.entries.get(token)?;
        let mut best: Option<(&str, u32)> = None;
        for (target, &count) in targets {
            if count < min_count {
                continue;
            }
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((target.as_str(), count));
            }
        }
        best.map(|(target, _)| target)
    }

    /// Times `mistaken -> corrected` has been recorded.
    pub fn count(&self, mistaken: &str, corrected: &str) -> u32 {
        self.entries
            .get(mistaken)
            .and_then(|t| t.get(corrected))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A pair is refused when applying it could enable another rewrite on a
    /// later pass: table or grammar words on either side, targets that
    /// complete a multi-word table phrase, and learned chains.
    fn refuses(&self, mistaken: &str, corrected: &str) -> bool {
        mistaken.is_empty()
            || corrected.is_empty()
            || mistaken == corrected
            || !is_alphabetic(mistaken)
            || !is_alphabetic(corrected)
            || is_reserved(mistaken)
            || is_reserved(corrected)
            || is_correction_key(mistaken)
            || is_correction_value(mistaken)
            || is_correction_key(corrected)
            || is_phrase_key_word(corrected)
            || self.is_learned_target(mistaken)
            || self.entries.contains_key(corrected)
    }

    fn is_learned_target(&self, word: &str) -> bool {
        self.entries.values().any(|t| t.contains_key(word))
    }
}

fn is_correction_value(word: &str) -> bool {
    PHONETIC_CORRECTIONS.iter().any(|(_, v)| *v == word)
}
