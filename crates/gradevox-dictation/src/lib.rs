//! Gradevox Dictation crate - listening sessions around the command pipeline.
//!
//! The orchestrator owns one capture session at a time, feeds finalized
//! primary-engine transcripts to the gradebook session and runs an optional
//! secondary engine on the same audio for comparison logging only.

pub mod comparison;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use comparison::ComparisonRecord;
pub use engine::{MockSecondaryEngine, SecondaryEngine};
pub use error::{EngineError, SurfacedError};
pub use orchestrator::{DictationOutput, DualEngineOrchestrator};
pub use state::{CaptureState, CaptureStateMachine};
