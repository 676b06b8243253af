//! Spoken column references to roster headers.

use gradevox_core::config::ParserConfig;

use crate::normalizer::canonicalize;
use crate::text::{is_alphabetic, is_numeric, similarity};

/// Header words that mark a column as identifying the student rather than
/// holding a grade.
const IDENTITY_WORDS: &[&str] = &[
    "name", "names", "first", "last", "firstname", "lastname", "surname", "id", "email",
    "number", "no", "num", "student", "full",
];

#[derive(Debug, Clone)]
struct HeaderEntry {
    name: String,
    canonical: String,
    words: Vec<String>,
}

/// A header accepted for a spoken phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMatch {
    pub header: String,
    pub score: f64,
    /// True when the header was chosen only because it is the sole
    /// gradeable column.
    pub fallback: bool,
}

/// Scores transcript tokens against the gradeable headers of one roster.
pub struct ColumnMatcher {
    headers: Vec<HeaderEntry>,
    threshold: f64,
    word_threshold: f64,
}

impl ColumnMatcher {
    pub fn new(headers: &[String], config: &ParserConfig) -> Self {
        let headers = headers
            .iter()
            .filter(|h| !is_identity_header(h))
            .filter_map(|h| {
                let canonical = canonicalize(h);
                if canonical.is_empty() {
                    return None;
                }
                Some(HeaderEntry {
                    name: h.clone(),
                    words: canonical.split(' ').map(str::to_string).collect(),
                    canonical,
                })
            })
            .collect();

        Self {
            headers,
            threshold: config.column_score_threshold,
            word_threshold: config.word_fuzzy_threshold,
        }
    }

    /// Names of the gradeable headers in roster order.
    pub fn gradeable(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|h| h.name.as_str())
    }

    /// The only gradeable header, when there is exactly one.
    pub fn fallback(&self) -> Option<&str> {
        match self.headers.as_slice() {
            [only] => Some(only.name.as_str()),
            _ => None,
        }
    }

    /// Canonical words of a gradeable header.
    pub fn words_of(&self, header: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|h| h.name == header)
            .map(|h| h.words.as_slice())
    }

    /// Score (0-100) of one header against the tokens.
    fn score_header(&self, entry: &HeaderEntry, tokens: &[&str]) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }
        let text = format!(" {} ", tokens.join(" "));
        if text.contains(&format!(" {} ", entry.canonical)) {
            return 100.0;
        }

        let sims: Vec<Option<f64>> = entry
            .words
            .iter()
            .map(|w| self.word_similarity(w, tokens))
            .collect();

        if sims.iter().all(Option::is_some) {
            let (weighted, total) = entry
                .words
                .iter()
                .zip(&sims)
                .fold((0.0, 0.0), |(acc, len), (w, sim)| {
                    let l = w.len() as f64;
                    (acc + sim.unwrap_or(0.0) * l, len + l)
                });
            if total > 0.0 {
                return 90.0 * weighted / total;
            }
        }

        let mean = entry
            .words
            .iter()
            .map(|w| best_similarity(w, tokens))
            .sum::<f64>()
            / entry.words.len() as f64;
        50.0 * mean
    }

    /// Similarity of the best token that counts as finding `word`: numeric
    /// words must match exactly, alphabetic words fuzzily.
    fn word_similarity(&self, word: &str, tokens: &[&str]) -> Option<f64> {
        if tokens.contains(&word) {
            return Some(1.0);
        }
        if !is_alphabetic(word) {
            return None;
        }
        let best = tokens
            .iter()
            .filter(|t| is_alphabetic(t))
            .map(|t| similarity(word, t))
            .fold(0.0, f64::max);
        (best >= self.word_threshold).then_some(best)
    }

    /// Best header scoring at or above the threshold. Ties go to the
    /// longer header, then to roster order.
    pub fn best_match(&self, tokens: &[&str]) -> Option<ColumnMatch> {
        let mut best: Option<(&HeaderEntry, f64)> = None;
        for entry in &self.headers {
            let score = self.score_header(entry, tokens);
            if score < self.threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((b, s)) => {
                    score > s || (score == s && entry.canonical.len() > b.canonical.len())
                }
            };
            if better {
                best = Some((entry, score));
            }
        }
        best.map(|(entry, score)| ColumnMatch {
            header: entry.name.clone(),
            score,
            fallback: false,
        })
    }

    /// [`best_match`](Self::best_match), falling back to the sole gradeable
    /// header.
    pub fn resolve(&self, tokens: &[&str]) -> Option<ColumnMatch> {
        self.best_match(tokens).or_else(|| {
            self.fallback().map(|header| ColumnMatch {
                header: header.to_string(),
                score: 0.0,
                fallback: true,
            })
        })
    }

    /// Whether `token` is one of the words of `header` (exactly, or fuzzily
    /// for alphabetic words).
    pub fn is_header_word(&self, header: &str, token: &str) -> bool {
        let Some(words) = self.words_of(header) else {
            return false;
        };
        words.iter().any(|w| {
            w == token
                || (is_alphabetic(w)
                    && is_alphabetic(token)
                    && similarity(w, token) >= self.word_threshold)
        })
    }

    /// The gradeable header whose words end `tokens` exactly, leaving at
    /// least one token in front of it. Returns the header and its word count;
    /// the longest such header wins.
    pub fn trailing_header(&self, tokens: &[&str]) -> Option<(&str, usize)> {
        self.headers
            .iter()
            .filter(|h| h.words.len() < tokens.len())
            .filter(|h| {
                let tail = &tokens[tokens.len() - h.words.len()..];
                tail.iter().zip(&h.words).all(|(t, w)| t == w)
            })
            .max_by_key(|h| h.words.len())
            .map(|h| (h.name.as_str(), h.words.len()))
    }

    /// Whether the header's last word is a number ("Quiz 1").
    pub fn is_numbered(&self, header: &str) -> bool {
        self.words_of(header)
            .and_then(|w| w.last())
            .is_some_and(|w| is_numeric(w))
    }
}

fn best_similarity(word: &str, tokens: &[&str]) -> f64 {
    if is_numeric(word) {
        return if tokens.contains(&word) { 1.0 } else { 0.0 };
    }
    tokens
        .iter()
        .map(|t| similarity(word, t))
        .fold(0.0, f64::max)
}

/// Identity columns: every word is an identity word (and not only
/// "student"), or the header is a bare `#`.
pub fn is_identity_header(header: &str) -> bool {
    let trimmed = header.trim();
    if trimmed == "#" {
        return true;
    }
    let canonical = canonicalize(trimmed);
    let words: Vec<&str> = canonical.split_whitespace().collect();
    !words.is_empty()
        && words.iter().all(|w| IDENTITY_WORDS.contains(w))
        && words.iter().any(|w| *w != "student")
}
