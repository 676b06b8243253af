//! Error types for the command pipeline.
//!
//! Parse and resolution failures are data ([`ParsedCommand::Unknown`],
//! ambiguous or empty resolutions), not errors. These variants cover misuse
//! of the state machine and failures reported by the host's edit sink.
//!
//! [`ParsedCommand::Unknown`]: crate::types::ParsedCommand::Unknown

use gradevox_core::GradevoxError;

use crate::disambiguation::DisambiguationState;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid disambiguation transition: {0} -> {1}")]
    InvalidTransition(DisambiguationState, DisambiguationState),
    #[error("Command does not settle a disambiguation: {0}")]
    NotASettlement(&'static str),
    #[error(transparent)]
    Core(#[from] GradevoxError),
}

pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = CommandError::InvalidTransition(
            DisambiguationState::Idle,
            DisambiguationState::Resolved,
        );
        assert_eq!(
            err.to_string(),
            "Invalid disambiguation transition: Idle -> Resolved"
        );

        let err = CommandError::NotASettlement("undo");
        assert_eq!(err.to_string(), "Command does not settle a disambiguation: undo");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: CommandError = GradevoxError::UnknownColumn("Quiz 9".into()).into();
        assert!(err.to_string().contains("Quiz 9"));
    }
}
