//! Command pipeline for the voice gradebook.
//!
//! Turns finalized transcript alternatives into validated grade edits:
//! normalization against the roster vocabulary, a fixed command grammar,
//! fuzzy name resolution, disambiguation prompts and batch execution.

pub mod batch;
pub mod context;
pub mod disambiguation;
pub mod error;
pub mod memory;
pub mod normalizer;
pub mod parser;
pub mod phonetic;
pub mod resolver;
pub mod session;
pub mod sink;
pub mod tables;
pub mod text;
pub mod types;
pub mod vocabulary;

pub use batch::{BatchExecutor, BatchReport, SkippedRows, UnresolvedEntry};
pub use context::{RecentStudent, SessionContext};
pub use disambiguation::{DisambiguationState, Disambiguator, PendingDisambiguation, Settlement};
pub use error::CommandError;
pub use memory::CorrectionMemory;
pub use normalizer::{canonicalize, Normalizer};
pub use parser::{CommandParser, ParseInput};
pub use phonetic::{strategy_by_name, MatchStrategy, PrefixStrategy, SoundexStrategy};
pub use resolver::Resolver;
pub use session::{CommandOutcome, GradebookSession};
pub use sink::{EditSink, InMemoryRoster, NewStudent};
pub use types::{
    BatchEntry, Confidence, DeleteTarget, EveryoneCondition, MatchCandidate, MatchType,
    MatchedField, ParsedCommand, ResolutionResult, ResolutionStatus, ResolvedBy, SortDirection,
    SortField,
};
pub use vocabulary::ContextVocabulary;
