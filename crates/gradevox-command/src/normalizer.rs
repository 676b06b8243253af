//! Transcript normalization.
//!
//! Rewrites one engine alternative into canonical text: lowercase ASCII
//! words, digits and single spaces. Steps run in a fixed order:
//!
//! 1. static phonetic corrections (whole words and phrases)
//! 2. learned corrections from [`CorrectionMemory`]
//! 3. spoken numbers to digits
//! 4. context correction against the roster vocabulary
//!
//! Normalization is idempotent: every step leaves its own output, and the
//! output of later steps, untouched on a second pass.

use gradevox_core::config::NormalizerConfig;

use crate::memory::CorrectionMemory;
use crate::phonetic::soundex;
use crate::tables::{self, is_number_word, is_reserved, PHONETIC_CORRECTIONS, TEENS, TENS, UNITS};
use crate::text::{clean, similarity};
use crate::vocabulary::ContextVocabulary;

pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one raw alternative.
    pub fn normalize(
        &self,
        raw: &str,
        vocabulary: &ContextVocabulary,
        memory: &CorrectionMemory,
    ) -> String {
        let cleaned = clean(raw);
        let tokens: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();

        let tokens = apply_static_corrections(tokens, vocabulary);
        let tokens = self.apply_learned_corrections(tokens, vocabulary, memory);
        let tokens = convert_numbers(tokens);
        let tokens = self.apply_context_corrections(tokens, vocabulary);

        let normalized = tokens.join(" ");
        if normalized != cleaned {
            tracing::trace!(raw, normalized = %normalized, "Transcript normalized");
        }
        normalized
    }

    fn apply_learned_corrections(
        &self,
        tokens: Vec<String>,
        vocabulary: &ContextVocabulary,
        memory: &CorrectionMemory,
    ) -> Vec<String> {
        if memory.is_empty() {
            return tokens;
        }
        tokens
            .into_iter()
            .map(|token| {
                if vocabulary.contains_word(&token) {
                    return token;
                }
                match memory.lookup(&token, self.config.learned_min_count) {
                    Some(corrected) => corrected.to_string(),
                    None => token,
                }
            })
            .collect()
    }

    fn apply_context_corrections(
        &self,
        tokens: Vec<String>,
        vocabulary: &ContextVocabulary,
    ) -> Vec<String> {
        if vocabulary.is_empty() {
            return tokens;
        }
        tokens
            .into_iter()
            .map(|token| match self.best_vocabulary_match(&token, vocabulary) {
                Some(word) => {
                    tracing::trace!(token = %token, word, "Context correction");
                    word.to_string()
                }
                None => token,
            })
            .collect()
    }

    /// The vocabulary word whose combined score beats the threshold, if any.
    /// Words are visited in lexical order and only a strictly better score
    /// replaces the current best, so ties go to the smallest word.
    fn best_vocabulary_match<'v>(
        &self,
        token: &str,
        vocabulary: &'v ContextVocabulary,
    ) -> Option<&'v str> {
        if token.len() < self.config.min_token_len
            || token.bytes().any(|b| b.is_ascii_digit())
            || is_reserved(token)
            || vocabulary.contains_word(token)
        {
            return None;
        }

        let token_code = soundex(token);
        let mut best: Option<(&str, f64)> = None;
        for word in vocabulary.words() {
            let phonetic = if soundex(word) == token_code { 1.0 } else { 0.0 };
            let score = self.config.edit_weight * similarity(token, word)
                + self.config.phonetic_weight * phonetic;
            if score > self.config.context_threshold && best.map_or(true, |(_, b)| score > b) {
                best = Some((word.as_str(), score));
            }
        }
        best.map(|(word, _)| word)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

/// Roster-independent canonical form: cleaning, static corrections and
/// number conversion only. Used for column headers and stop phrases so they
/// compare equal to normalized speech.
pub fn canonicalize(raw: &str) -> String {
    let tokens: Vec<String> = clean(raw).split_whitespace().map(str::to_string).collect();
    let empty = ContextVocabulary::default();
    convert_numbers(apply_static_corrections(tokens, &empty)).join(" ")
}

// =============================================================================
// Static corrections
// =============================================================================

fn apply_static_corrections(tokens: Vec<String>, vocabulary: &ContextVocabulary) -> Vec<String> {
    let max_words = PHONETIC_CORRECTIONS
        .iter()
        .map(|(k, _)| k.split(' ').count())
        .max()
        .unwrap_or(1);

    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    'outer: while i < tokens.len() {
        // Longest phrase first
        for n in (1..=max_words.min(tokens.len() - i)).rev() {
            let window = &tokens[i..i + n];
            if window.iter().any(|t| vocabulary.contains_word(t)) {
                continue;
            }
            let phrase = window.join(" ");
            if let Some(replacement) = tables::lookup(PHONETIC_CORRECTIONS, &phrase) {
                out.extend(replacement.split(' ').map(str::to_string));
                i += n;
                continue 'outer;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

// =============================================================================
// Number conversion
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Unit,
    Teen,
    Tens,
    Hundred,
}

/// Accumulates one spoken number below ten thousand.
#[derive(Default)]
struct NumberBuilder {
    value: Option<u32>,
    last: Option<Last>,
}

impl NumberBuilder {
    fn flush(&mut self, out: &mut Vec<String>) {
        if let Some(v) = self.value.take() {
            out.push(v.to_string());
        }
        self.last = None;
    }

    fn is_active(&self) -> bool {
        self.value.is_some()
    }

    /// Fold one number word into the current value, starting a new number
    /// when the word cannot continue the current one.
    fn push(&mut self, word: &str, out: &mut Vec<String>) {
        if let Some(n) = tables::lookup(UNITS, word) {
            if !matches!(self.last, None | Some(Last::Tens) | Some(Last::Hundred)) {
                self.flush(out);
            }
            self.add(n, Last::Unit);
        } else if let Some(n) = tables::lookup(TEENS, word).or_else(|| tables::lookup(TENS, word)) {
            let kind = if n < 20 { Last::Teen } else { Last::Tens };
            if !matches!(self.last, None | Some(Last::Hundred)) {
                self.flush(out);
            }
            self.add(n, kind);
        } else if word == "hundred" {
            match (self.value, self.last) {
                (Some(v), Some(Last::Unit | Last::Teen | Last::Tens)) if v < 100 => {
                    self.value = Some(v * 100);
                }
                (None, _) => self.value = Some(100),
                _ => {
                    self.flush(out);
                    self.value = Some(100);
                }
            }
            self.last = Some(Last::Hundred);
        }
    }

    fn add(&mut self, n: u32, kind: Last) {
        self.value = Some(self.value.unwrap_or(0) + n);
        self.last = Some(kind);
    }
}

fn is_integer(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Rewrite spoken numbers as digits, including "<n> hundred [and] <m>" and
/// "point" decimals. Digit tokens pass through unchanged.
fn convert_numbers(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut number = NumberBuilder::default();
    // Whether the last token pushed to `out` is an integer produced at the
    // immediately preceding position.
    let mut prev_integer = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i].as_str();
        let next = tokens.get(i + 1).map(String::as_str);

        if is_number_word(token) {
            number.push(token, &mut out);
            prev_integer = false;
            i += 1;
            continue;
        }

        if token == "and"
            && number.last == Some(Last::Hundred)
            && next.is_some_and(|n| is_number_word(n) && n != "hundred")
        {
            i += 1;
            continue;
        }

        if token == "point" {
            let had_number = number.is_active() || prev_integer;
            number.flush(&mut out);
            if had_number {
                let (fraction, consumed) = read_fraction(&tokens[i + 1..]);
                if let (Some(fraction), Some(int)) = (fraction, out.last_mut()) {
                    *int = format!("{}.{}", int, fraction);
                    prev_integer = false;
                    i += 1 + consumed;
                    continue;
                }
            }
            out.push(token.to_string());
            prev_integer = false;
            i += 1;
            continue;
        }

        number.flush(&mut out);
        prev_integer = is_integer(token);
        out.push(token.to_string());
        i += 1;
    }

    number.flush(&mut out);
    out
}

/// Digits after "point": a run of unit words, or one digit token.
fn read_fraction(rest: &[String]) -> (Option<String>, usize) {
    let digits: String = rest
        .iter()
        .map_while(|t| tables::lookup(UNITS, t))
        .map(|d| char::from_digit(d, 10).unwrap_or('0'))
        .collect();
    if !digits.is_empty() {
        let consumed = digits.len();
        return (Some(digits), consumed);
    }
    match rest.first() {
        Some(t) if is_integer(t) => (Some(t.clone()), 1),
        _ => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradevox_core::{Roster, RosterRow};

    fn vocab() -> ContextVocabulary {
        ContextVocabulary::build(&Roster::new(
            vec!["Quiz 1".into(), "Lab 2".into(), "Midterm".into()],
            vec![
                RosterRow::new(0, "Maria", "Smith"),
                RosterRow::new(1, "Maria", "Cruz"),
                RosterRow::new(2, "Jonathan", "Okafor"),
            ],
        ))
    }

    fn norm(raw: &str) -> String {
        Normalizer::default().normalize(raw, &vocab(), &CorrectionMemory::new())
    }

    // =========================================================================
    // Numbers
    // =========================================================================

    #[test]
    fn test_compound_numbers() {
        assert_eq!(canonicalize("eighty five"), "85");
        assert_eq!(canonicalize("nineteen"), "19");
        assert_eq!(canonicalize("one two three"), "1 2 3");
        assert_eq!(canonicalize("twenty thirty"), "20 30");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(canonicalize("one hundred"), "100");
        assert_eq!(canonicalize("a hundred"), "100");
        assert_eq!(canonicalize("one hundred and five"), "105");
        assert_eq!(canonicalize("two hundred twenty two"), "222");
        assert_eq!(canonicalize("hundred"), "100");
        assert_eq!(canonicalize("one hundred and"), "100 and");
    }

    #[test]
    fn test_point_decimals() {
        assert_eq!(canonicalize("eighty seven point five"), "87.5");
        assert_eq!(canonicalize("87 point 5"), "87.5");
        assert_eq!(canonicalize("ninety point two five"), "90.25");
        assert_eq!(canonicalize("point five"), "point 5");
        assert_eq!(canonicalize("87 point"), "87 point");
    }

    #[test]
    fn test_digits_pass_through() {
        assert_eq!(canonicalize("Lab 2 row 1 through 5"), "lab 2 row 1 through 5");
        assert_eq!(canonicalize("87.5%"), "87.5 percent");
    }

    // =========================================================================
    // Static corrections
    // =========================================================================

    #[test]
    fn test_static_corrections() {
        assert_eq!(canonicalize("kwiz won"), "quiz 1");
        assert_eq!(canonicalize("mid term"), "midterm");
        assert_eq!(canonicalize("ninety out a hundred"), "90 out of 100");
        assert_eq!(canonicalize("row one thru five"), "row 1 through 5");
    }

    #[test]
    fn test_static_corrections_skip_vocabulary_words() {
        let v = ContextVocabulary::build(&Roster::new(
            vec![],
            vec![RosterRow::new(0, "Tin", "Nguyen")],
        ));
        let n = Normalizer::default();
        assert_eq!(n.normalize("tin 90", &v, &CorrectionMemory::new()), "tin 90");
    }

    // =========================================================================
    // Learned and context corrections
    // =========================================================================

    #[test]
    fn test_learned_corrections_need_min_count() {
        let mut memory = CorrectionMemory::new();
        memory.record("mariya", "maria");
        let n = Normalizer::default();
        let empty = ContextVocabulary::default();
        assert_eq!(n.normalize("mariya 90", &empty, &memory), "mariya 90");
        memory.record("mariya", "maria");
        assert_eq!(n.normalize("mariya 90", &empty, &memory), "maria 90");
    }

    #[test]
    fn test_context_correction_to_roster_names() {
        assert_eq!(norm("Marya quiz one ninety"), "maria quiz 1 90");
        assert_eq!(norm("okafore lab two 80"), "okafor lab 2 80");
    }

    #[test]
    fn test_context_correction_leaves_grammar_and_short_tokens() {
        assert_eq!(norm("row 1 through 3"), "row 1 through 3");
        assert_eq!(norm("ma 90"), "ma 90");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let memory = CorrectionMemory::new();
        let n = Normalizer::default();
        let v = vocab();
        for raw in [
            "Marya Quiz one eighty five",
            "Lab 2: row one thru five all score ninety",
            "jonathon mid term eighty seven point five",
            "quiz 1 maria smith 90 maria cruz 85",
            "one hundred and five point",
            "the second one",
            "add student Tim Okafor id 1 2 3 4",
        ] {
            let once = n.normalize(raw, &v, &memory);
            let twice = n.normalize(&once, &v, &memory);
            assert_eq!(once, twice, "not idempotent for '{}'", raw);
        }
    }
}
