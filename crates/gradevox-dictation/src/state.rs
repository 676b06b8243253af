//! Capture state machine for a listening session.
//!
//! Enforces valid transitions:
//! - Idle -> Listening (start listening)
//! - Listening -> Processing (final transcript received)
//! - Processing -> Listening (continuous mode restart)
//! - Processing -> Idle (single command finished, or stop)
//! - Listening -> Idle (stop, or a session that ended on its own)

use std::fmt;

use serde::Serialize;

use gradevox_core::{GradevoxError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CaptureState {
    /// No capture in progress.
    #[default]
    Idle,
    /// The primary engine is receiving audio.
    Listening,
    /// A final transcript is running through the command pipeline.
    Processing,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Listening => write!(f, "Listening"),
            CaptureState::Processing => write!(f, "Processing"),
        }
    }
}

impl CaptureState {
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        matches!(
            (self, target),
            (CaptureState::Idle, CaptureState::Listening)
                | (CaptureState::Listening, CaptureState::Processing)
                | (CaptureState::Processing, CaptureState::Listening)
                | (CaptureState::Processing, CaptureState::Idle)
                | (CaptureState::Listening, CaptureState::Idle)
        )
    }

    /// Listening or processing.
    pub fn is_active(&self) -> bool {
        !matches!(self, CaptureState::Idle)
    }
}

/// Validated capture state. Owned by a single orchestrator.
#[derive(Debug, Default)]
pub struct CaptureStateMachine {
    state: CaptureState,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> CaptureState {
        self.state
    }

    pub fn transition(&mut self, target: CaptureState) -> Result<()> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Capture state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(GradevoxError::Dictation(format!(
                "Invalid capture transition: {} -> {}",
                self.state, target
            )))
        }
    }

    /// Force the machine back to Idle.
    pub fn reset(&mut self) {
        if self.state != CaptureState::Idle {
            tracing::debug!("Capture state reset to Idle from {}", self.state);
        }
        self.state = CaptureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(CaptureState::Idle.to_string(), "Idle");
        assert_eq!(CaptureState::Listening.to_string(), "Listening");
        assert_eq!(CaptureState::Processing.to_string(), "Processing");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(CaptureState::Idle.can_transition_to(&CaptureState::Listening));
        assert!(CaptureState::Listening.can_transition_to(&CaptureState::Processing));
        assert!(CaptureState::Processing.can_transition_to(&CaptureState::Listening));
        assert!(CaptureState::Processing.can_transition_to(&CaptureState::Idle));
        assert!(CaptureState::Listening.can_transition_to(&CaptureState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!CaptureState::Idle.can_transition_to(&CaptureState::Processing));
        assert!(!CaptureState::Idle.can_transition_to(&CaptureState::Idle));
        assert!(!CaptureState::Listening.can_transition_to(&CaptureState::Listening));
    }

    #[test]
    fn test_machine_rejects_invalid_transition() {
        let mut machine = CaptureStateMachine::new();
        let err = machine.transition(CaptureState::Processing).unwrap_err();
        assert!(err.to_string().contains("Idle -> Processing"));
        assert_eq!(machine.current(), CaptureState::Idle);
    }

    #[test]
    fn test_full_cycle_and_reset() {
        let mut machine = CaptureStateMachine::new();
        machine.transition(CaptureState::Listening).unwrap();
        machine.transition(CaptureState::Processing).unwrap();
        machine.transition(CaptureState::Listening).unwrap();
        assert!(machine.current().is_active());
        machine.reset();
        assert_eq!(machine.current(), CaptureState::Idle);
    }
}
