//! Low-level text helpers shared by the normalizer, parser and resolver.
//!
//! Everything here operates on ASCII after [`clean`] has been applied.

/// Fold common Latin diacritics to their ASCII base letter.
fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ł' => 'l',
        _ if c.is_ascii() => c,
        _ => return None,
    };
    Some(folded)
}

/// Lowercase, fold diacritics and reduce text to `[a-z0-9]` words separated
/// by single spaces.
///
/// Apostrophes are dropped without splitting ("that's" becomes "thats"),
/// `%` becomes the word "percent", and a `.` is kept only between two digits
/// so decimal scores survive.
pub fn clean(raw: &str) -> String {
    let chars: Vec<char> = raw
        .chars()
        .flat_map(|c| c.to_lowercase())
        .collect();
    let mut out = String::with_capacity(chars.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\'' | '\u{2019}' => {}
            '%' => out.push_str(" percent "),
            '.' => {
                let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
                let next_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                if prev_digit && next_digit {
                    out.push('.');
                } else {
                    out.push(' ');
                }
            }
            _ => match fold_char(c) {
                Some(f) if f.is_ascii_alphanumeric() => out.push(f),
                _ => out.push(' '),
            },
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a token is an integer or decimal number such as `85` or `87.5`.
pub fn is_numeric(token: &str) -> bool {
    let mut parts = token.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next();
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

pub fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Levenshtein distance over characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit distance scaled to `[0, 1]`, where 1.0 means identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// Capitalize the first letter of each word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lowercases_and_strips_punctuation() {
        assert_eq!(clean("Lab 2: Row 1, through 5!"), "lab 2 row 1 through 5");
    }

    #[test]
    fn test_clean_keeps_decimal_points_only_between_digits() {
        assert_eq!(clean("Maria 87.5."), "maria 87.5");
        assert_eq!(clean("end. 5"), "end 5");
    }

    #[test]
    fn test_clean_apostrophes_and_percent() {
        assert_eq!(clean("That's right"), "thats right");
        assert_eq!(clean("Quiz 1 85%"), "quiz 1 85 percent");
    }

    #[test]
    fn test_clean_folds_diacritics() {
        assert_eq!(clean("José Núñez"), "jose nunez");
        assert_eq!(clean("Zoë 90"), "zoe 90");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean("  Mid-Term:  José's 87.5% ");
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("85"));
        assert!(is_numeric("87.5"));
        assert!(!is_numeric("87."));
        assert!(!is_numeric(".5"));
        assert!(!is_numeric("8a"));
        assert!(!is_numeric(""));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("maria", "maria"), 0);
        assert_eq!(edit_distance("marya", "maria"), 1);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("marya", "maria") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("maria de la cruz"), "Maria De La Cruz");
        assert_eq!(title_case(""), "");
    }
}
