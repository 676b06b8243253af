//! Benchmarks for the per-utterance hot path.
//!
//! Every final transcript is normalized, parsed and resolved against the
//! whole roster before the host sees an edit, so these run against a
//! realistic 40-student class with a full set of graded columns.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use gradevox_command::{
    CommandParser, ContextVocabulary, CorrectionMemory, Normalizer, ParseInput, PrefixStrategy,
    Resolver, SessionContext, SoundexStrategy,
};
use gradevox_core::config::{ParserConfig, ResolverConfig};
use gradevox_core::{Roster, RosterRow};
use std::sync::Arc;

const FIRST_NAMES: &[&str] = &[
    "Maria", "Jon", "Ana", "Tim", "Katherine", "Michael", "Sara", "Aidan", "Zoe", "Eric",
];
const LAST_NAMES: &[&str] = &["Smith", "Cruz", "Lee", "Okafor", "Nguyen", "Park", "Garcia", "Brown"];

/// A 40-row roster with some scores already filled in.
fn class_roster() -> Roster {
    let headers: Vec<String> = ["First Name", "Last Name", "Quiz 1", "Quiz 2", "Lab 2", "Midterm"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = (0..40)
        .map(|i| {
            let row = RosterRow::new(
                i,
                FIRST_NAMES[i % FIRST_NAMES.len()],
                LAST_NAMES[(i / 3) % LAST_NAMES.len()],
            );
            if i % 2 == 0 {
                row.with_field("Quiz 1", format!("{}", 60 + i))
            } else {
                row
            }
        })
        .collect();
    Roster::new(headers, rows)
}

const UTTERANCES: &[&str] = &[
    "maria smith quiz one eighty five",
    "give jon lee ninety two on quiz 2",
    "lab two row 1 through 5 score 90",
    "katherine nguyen midterm forty five out of fifty",
    "scratch that",
    "mike park quiz 1 seventy seven point five",
];

fn bench_normalize_and_parse(c: &mut Criterion) {
    let roster = class_roster();
    let vocabulary = ContextVocabulary::build(&roster);
    let memory = CorrectionMemory::new();
    let normalizer = Normalizer::default();
    let parser = CommandParser::new(ParserConfig::default(), Arc::new(PrefixStrategy));
    let context = SessionContext::default();

    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("normalize", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let text = normalizer.normalize(UTTERANCES[idx % UTTERANCES.len()], &vocabulary, &memory);
            idx += 1;
            text
        });
    });

    let normalized: Vec<String> = UTTERANCES
        .iter()
        .map(|u| normalizer.normalize(u, &vocabulary, &memory))
        .collect();

    group.bench_function("parse", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let command = parser.parse(&ParseInput {
                text: &normalized[idx % normalized.len()],
                headers: &roster.headers,
                vocabulary: &vocabulary,
                context: &context,
            });
            idx += 1;
            command
        });
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let roster = class_roster();
    let context = SessionContext::default();
    let prefix = Resolver::new(ResolverConfig::default());
    let soundex = Resolver::with_strategy(ResolverConfig::default(), Arc::new(SoundexStrategy));
    let names = ["maria smith", "maria", "jon", "katherin", "mike park", "zed"];

    let mut group = c.benchmark_group("resolver");
    group.sample_size(200);

    group.bench_function("prefix_40_rows", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let result = prefix.resolve(names[idx % names.len()], &roster, Some("Quiz 1"), &context);
            idx += 1;
            result
        });
    });

    group.bench_function("soundex_40_rows", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let result = soundex.resolve(names[idx % names.len()], &roster, Some("Quiz 1"), &context);
            idx += 1;
            result
        });
    });

    group.finish();
}

criterion_group!(benches, bench_normalize_and_parse, bench_resolve);
criterion_main!(benches);
