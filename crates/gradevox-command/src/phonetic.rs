//! Phonetic codes and pluggable name-matching strategies.
//!
//! The resolver scores every candidate string through a [`MatchStrategy`].
//! Only the phonetic scorer differs between the shipped strategies; the
//! exact, partial and fuzzy scorers are shared default methods.

use crate::tables::name_group;
use crate::text::{edit_distance, similarity};

/// American Soundex code of an ASCII word, e.g. `"robert"` gives `"R163"`.
///
/// Returns an empty string when the word has no ASCII letters.
pub fn soundex(word: &str) -> String {
    fn digit(c: char) -> Option<char> {
        match c {
            'b' | 'f' | 'p' | 'v' => Some('1'),
            'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
            'd' | 't' => Some('3'),
            'l' => Some('4'),
            'm' | 'n' => Some('5'),
            'r' => Some('6'),
            _ => None,
        }
    }

    let mut letters = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase());

    let Some(first) = letters.next() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first.to_ascii_uppercase());
    let mut last = digit(first);

    for c in letters {
        if code.len() == 4 {
            break;
        }
        match digit(c) {
            Some(d) if Some(d) != last => {
                code.push(d);
                last = Some(d);
            }
            Some(_) => {}
            // 'h' and 'w' do not separate equal codes, vowels do
            None if c == 'h' || c == 'w' => {}
            None => last = None,
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

/// Scores one spoken name against one candidate string.
///
/// Each scorer returns `Some(score)` when it matches (lower is better) and
/// `None` otherwise. The resolver tries them in the order exact, phonetic,
/// partial, fuzzy and keeps the first hit.
pub trait MatchStrategy: Send + Sync {
    /// Name used in configuration and logs.
    fn name(&self) -> &'static str;

    fn exact(&self, spoken: &str, candidate: &str) -> Option<u32> {
        (spoken == candidate).then_some(0)
    }

    fn phonetic(&self, spoken: &str, candidate: &str) -> Option<u32>;

    /// Substring in either direction, scored by the length difference.
    fn partial(&self, spoken: &str, candidate: &str) -> Option<u32> {
        let (short, long) = if spoken.len() <= candidate.len() {
            (spoken, candidate)
        } else {
            (candidate, spoken)
        };
        if short.len() < 2 || !long.contains(short) {
            return None;
        }
        Some((long.len() - short.len()) as u32)
    }

    /// Raw edit distance when the normalized similarity exceeds `floor`.
    fn fuzzy(&self, spoken: &str, candidate: &str, floor: f64) -> Option<u32> {
        if similarity(spoken, candidate) > floor {
            Some(edit_distance(spoken, candidate) as u32)
        } else {
            None
        }
    }
}

/// Name-variation groups plus a two-letter prefix heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixStrategy;

impl MatchStrategy for PrefixStrategy {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn phonetic(&self, spoken: &str, candidate: &str) -> Option<u32> {
        let spoken_words: Vec<&str> = spoken.split_whitespace().collect();
        let candidate_words: Vec<&str> = candidate.split_whitespace().collect();
        if spoken_words.is_empty() || spoken_words.len() != candidate_words.len() {
            return None;
        }
        let all_similar = spoken_words
            .iter()
            .zip(&candidate_words)
            .all(|(a, b)| a == b || sounds_alike(a, b));
        all_similar.then_some(1)
    }
}

/// Same name-variation group, or a shared two-letter prefix on words of at
/// least three letters whose lengths differ by at most two.
fn sounds_alike(a: &str, b: &str) -> bool {
    if let (Some(x), Some(y)) = (name_group(a), name_group(b)) {
        if x == y {
            return true;
        }
    }
    a.len() >= 3 && b.len() >= 3 && a.get(..2) == b.get(..2) && a.len().abs_diff(b.len()) <= 2
}

/// Equal Soundex codes count as a phonetic match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoundexStrategy;

impl MatchStrategy for SoundexStrategy {
    fn name(&self) -> &'static str {
        "soundex"
    }

    fn phonetic(&self, spoken: &str, candidate: &str) -> Option<u32> {
        // Multi-word candidates compare word by word
        let spoken_words: Vec<&str> = spoken.split_whitespace().collect();
        let candidate_words: Vec<&str> = candidate.split_whitespace().collect();
        if spoken_words.is_empty() || spoken_words.len() != candidate_words.len() {
            return None;
        }
        let all_equal = spoken_words
            .iter()
            .zip(&candidate_words)
            .all(|(a, b)| {
                let code = soundex(a);
                !code.is_empty() && code == soundex(b)
            });
        all_equal.then_some(1)
    }
}

/// Build the strategy named in configuration. Unknown names fall back to
/// the prefix strategy.
pub fn strategy_by_name(name: &str) -> Box<dyn MatchStrategy> {
    match name.trim().to_ascii_lowercase().as_str() {
        "soundex" => Box::new(SoundexStrategy),
        "prefix" => Box::new(PrefixStrategy),
        other => {
            tracing::warn!(strategy = other, "Unknown match strategy, using prefix");
            Box::new(PrefixStrategy)
        }
    }
}
