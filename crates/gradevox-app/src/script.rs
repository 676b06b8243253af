//! Transcript script format read by the binary.
//!
//! One event per line:
//! - `maria quiz 1 85` is a final event with one alternative
//! - `maria quiz 1 85 | mario quiz 1 85` is a final event with ranked alternatives
//! - `~ maria quiz` is an interim event
//! - `:start`, `:stop`, `:end`, `:nospeech`, `:denied <reason>`, `:unavailable`
//!   drive the listening session
//!
//! Blank lines and lines starting with `#` are skipped.

use gradevox_core::{Alternative, TranscriptEvent};
use gradevox_dictation::EngineError;

/// Separator between ranked alternatives on one line.
const ALTERNATIVE_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    Event(TranscriptEvent),
    Start,
    Stop,
    /// The platform recognizer ended its session on its own.
    SessionEnded,
    EngineError(EngineError),
}

/// Parse one script line. Returns `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Option<ScriptLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if let Some(control) = line.strip_prefix(':') {
        let (name, rest) = control
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((control, ""));
        return match name {
            "start" => Some(ScriptLine::Start),
            "stop" => Some(ScriptLine::Stop),
            "end" => Some(ScriptLine::SessionEnded),
            "nospeech" => Some(ScriptLine::EngineError(EngineError::NoSpeechDetected)),
            "unavailable" => Some(ScriptLine::EngineError(EngineError::RecognitionUnavailable)),
            "denied" => Some(ScriptLine::EngineError(EngineError::CaptureDenied(
                rest.to_string(),
            ))),
            other => {
                tracing::warn!(control = other, "Unknown script control line, treating as speech");
                Some(ScriptLine::Event(final_event(line)))
            }
        };
    }

    if let Some(partial) = line.strip_prefix('~') {
        return Some(ScriptLine::Event(TranscriptEvent::interim(partial.trim())));
    }

    Some(ScriptLine::Event(final_event(line)))
}

/// Engine rank is all the script knows, so confidence decays with rank.
fn final_event(line: &str) -> TranscriptEvent {
    let alternatives: Vec<Alternative> = line
        .split(ALTERNATIVE_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(rank, text)| Alternative::new(text, (1.0 - 0.1 * rank as f32).max(0.1)))
        .collect();
    TranscriptEvent::with_alternatives(alternatives)
}
