//! Static correction and keyword tables.
//!
//! Pure data. Every replacement value in [`PHONETIC_CORRECTIONS`] must not
//! itself appear as a key, otherwise normalization stops being idempotent.

/// Acoustically confusable words and phrases, matched on whole words.
pub static PHONETIC_CORRECTIONS: &[(&str, &str)] = &[
    // Domain terms
    ("lap", "lab"),
    ("lamb", "lab"),
    ("labb", "lab"),
    ("kwiz", "quiz"),
    ("quizz", "quiz"),
    ("quizs", "quiz"),
    ("whiz", "quiz"),
    ("exim", "exam"),
    ("exxam", "exam"),
    ("egg zam", "exam"),
    ("mid term", "midterm"),
    ("mid terms", "midterm"),
    ("home work", "homework"),
    ("per cent", "percent"),
    ("pursent", "percent"),
    ("thru", "through"),
    ("threw", "through"),
    ("out a", "out of"),
    ("outta", "out of"),
    // Misheard digit words
    ("won", "one"),
    ("too", "two"),
    ("tree", "three"),
    ("fore", "four"),
    ("ate", "eight"),
    ("nein", "nine"),
    ("tin", "ten"),
    ("fourty", "forty"),
    ("ninty", "ninety"),
    ("a hundred", "one hundred"),
];

pub static UNITS: &[(&str, u32)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
];

pub static TEENS: &[(&str, u32)] = &[
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

pub static TENS: &[(&str, u32)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

pub static ORDINALS: &[(&str, usize)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
];

/// Words dropped when extracting a student name from a grade command.
pub static FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "for", "to", "on", "in", "of", "and", "as", "with", "is", "was", "has",
    "had", "gets", "got", "get", "give", "gave", "put", "set", "record", "enter",
    "score", "scored", "scores", "grade", "graded", "grades", "student", "points", "point",
    "percent", "please", "um", "uh", "okay", "ok", "so", "then", "now", "her", "his", "their",
];

/// Graded-item vocabulary that never names a student.
pub static DOMAIN_TERMS: &[&str] = &[
    "quiz", "quizzes", "lab", "labs", "exam", "exams", "test", "tests", "midterm", "final",
    "finals", "homework", "assignment", "assignments", "project", "projects", "essay",
    "participation", "attendance", "worksheet", "report", "presentation",
];

/// Grammar words the context corrector must never rewrite into names.
pub static GRAMMAR_KEYWORDS: &[&str] = &[
    "row", "rows", "through", "until", "till", "everyone", "everybody", "every", "all",
    "students", "whole", "class", "entire", "present", "here", "undo", "redo", "sort", "by",
    "ascending", "descending", "reverse", "add", "new", "create", "enroll", "delete", "remove",
    "drop", "yes", "yeah", "yep", "no", "nope", "confirm", "cancel", "reject", "option",
    "number", "choice", "candidate", "pick", "select", "choose", "first", "last", "name", "id",
    "out", "that", "this", "one", "hundred", "correct", "wrong", "right", "sure", "named",
    "called", "from", "roster", "list", "highest", "lowest", "high", "low", "stop", "listening",
    "finish", "done", "grading", "thats", "never", "mind", "none", "them",
];

/// Utterances that undo the last edit. Matched against the whole text.
pub static UNDO_PHRASES: &[&str] = &[
    "undo",
    "undo that",
    "undo last",
    "undo the last one",
    "scratch that",
    "take that back",
    "revert",
    "revert that",
];

pub static REDO_PHRASES: &[&str] = &["redo", "redo that", "redo last", "put it back"];

pub static CONFIRM_PHRASES: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "confirm",
    "correct",
    "thats right",
    "thats correct",
    "ok",
    "okay",
    "sure",
    "do it",
    "go ahead",
];

pub static REJECT_PHRASES: &[&str] = &[
    "no",
    "nope",
    "cancel",
    "reject",
    "wrong",
    "incorrect",
    "never mind",
    "nevermind",
    "not that one",
    "none of them",
    "none of those",
];

/// Groups of spoken name variants treated as phonetically equivalent.
pub static NAME_VARIATION_GROUPS: &[&[&str]] = &[
    &["michael", "mike", "mikey", "micheal", "michel"],
    &["katherine", "catherine", "kathryn", "kate", "katie", "cathy", "kathy", "kat"],
    &["jon", "john", "jonathan", "johnny", "jonny"],
    &["christopher", "chris", "kris", "kristopher", "topher"],
    &["elizabeth", "liz", "beth", "lizzie", "eliza", "betty", "libby"],
    &["robert", "rob", "bob", "bobby", "robbie", "bert"],
    &["william", "will", "bill", "billy", "liam", "willy"],
    &["maria", "mariah", "marie", "mary", "moriah"],
    &["sara", "sarah", "sera"],
    &["steven", "stephen", "steve", "stevie"],
    &["alexander", "alexandra", "alex", "alexis", "alec", "lex"],
    &["matthew", "matt", "mathew", "matty"],
    &["nicholas", "nicolas", "nick", "nicky", "nico"],
    &["daniel", "dan", "danny", "daniela", "daniella"],
    &["jacob", "jake", "jakob"],
    &["joshua", "josh"],
    &["anthony", "tony", "antony"],
    &["samuel", "samantha", "sam", "sammy"],
    &["jennifer", "jen", "jenny", "jenna"],
    &["aidan", "aiden", "ayden", "aden"],
    &["caitlin", "kaitlyn", "katelyn", "caitlyn", "kaitlin"],
    &["jeffrey", "geoffrey", "jeff", "geoff"],
    &["sean", "shawn", "shaun", "shon"],
    &["eric", "erik", "erick"],
    &["zoe", "zoey", "zoie"],
    &["isabel", "isabelle", "isabella", "izzy", "bella"],
    &["jasmine", "jazmin", "yasmin", "yasmine"],
    &["muhammad", "mohammed", "mohamed", "mohammad"],
    &["joseph", "joe", "joey", "jose"],
    &["andrew", "andy", "drew"],
];

pub fn lookup<'a, T: Copy>(table: &'a [(&'a str, T)], word: &str) -> Option<T> {
    table.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

/// Whether the word is a spoken number word (units, teens, tens, "hundred").
pub fn is_number_word(word: &str) -> bool {
    word == "hundred"
        || lookup(UNITS, word).is_some()
        || lookup(TEENS, word).is_some()
        || lookup(TENS, word).is_some()
}

pub fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(&word)
}

pub fn is_domain_term(word: &str) -> bool {
    DOMAIN_TERMS.contains(&word)
}

/// Words that belong to the command grammar rather than to names.
pub fn is_reserved(word: &str) -> bool {
    GRAMMAR_KEYWORDS.contains(&word)
        || is_filler(word)
        || is_number_word(word)
        || lookup(ORDINALS, word).is_some()
}

/// Whether the word appears as a key of the static correction table.
pub fn is_correction_key(word: &str) -> bool {
    PHONETIC_CORRECTIONS.iter().any(|(k, _)| *k == word)
}

/// Whether the word is one word of a multi-word static correction key.
pub fn is_phrase_key_word(word: &str) -> bool {
    PHONETIC_CORRECTIONS
        .iter()
        .any(|(k, _)| k.contains(' ') && k.split(' ').any(|w| w == word))
}

/// The name-variation group containing `name`, if any.
pub fn name_group(name: &str) -> Option<usize> {
    NAME_VARIATION_GROUPS
        .iter()
        .position(|group| group.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_values_are_never_keys() {
        for (_, value) in PHONETIC_CORRECTIONS {
            assert!(
                !is_correction_key(value),
                "correction target '{}' is also a key",
                value
            );
        }
    }

    #[test]
    fn test_correction_keys_are_unique() {
        for (i, (key, _)) in PHONETIC_CORRECTIONS.iter().enumerate() {
            let dupes = PHONETIC_CORRECTIONS[i + 1..]
                .iter()
                .filter(|(k, _)| k == key)
                .count();
            assert_eq!(dupes, 0, "duplicate key '{}'", key);
        }
    }

    #[test]
    fn test_number_words() {
        assert!(is_number_word("seven"));
        assert!(is_number_word("nineteen"));
        assert!(is_number_word("eighty"));
        assert!(is_number_word("hundred"));
        assert!(!is_number_word("maria"));
        assert_eq!(lookup(TENS, "eighty"), Some(80));
    }

    #[test]
    fn test_name_groups() {
        assert_eq!(name_group("mike"), name_group("michael"));
        assert!(name_group("mike").is_some());
        assert_ne!(name_group("mike"), name_group("maria"));
        assert!(name_group("zzyzx").is_none());
    }

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved("row"));
        assert!(is_reserved("gets"));
        assert!(is_reserved("five"));
        assert!(is_reserved("second"));
        assert!(!is_reserved("maria"));
    }
}
