//! Disambiguation state machine.
//!
//! Holds a command whose name resolved to several rows until the teacher
//! picks one, confirms the first, or rejects the prompt:
//! - Idle -> AwaitingSelection (ambiguous resolution)
//! - AwaitingSelection -> Resolved (selection or confirm)
//! - AwaitingSelection -> Cancelled (reject, new command, timeout)
//! - Resolved -> Idle, Cancelled -> Idle (settled)
//!
//! An out-of-range selection leaves the machine waiting.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gradevox_core::config::DisambiguationConfig;

use crate::error::{CommandError, Result};
use crate::types::{MatchCandidate, ParsedCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisambiguationState {
    Idle,
    AwaitingSelection,
    Resolved,
    Cancelled,
}

impl fmt::Display for DisambiguationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisambiguationState::Idle => write!(f, "Idle"),
            DisambiguationState::AwaitingSelection => write!(f, "AwaitingSelection"),
            DisambiguationState::Resolved => write!(f, "Resolved"),
            DisambiguationState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl DisambiguationState {
    pub fn can_transition_to(&self, target: &DisambiguationState) -> bool {
        matches!(
            (self, target),
            (DisambiguationState::Idle, DisambiguationState::AwaitingSelection)
                | (DisambiguationState::AwaitingSelection, DisambiguationState::Resolved)
                | (DisambiguationState::AwaitingSelection, DisambiguationState::Cancelled)
                | (DisambiguationState::Resolved, DisambiguationState::Idle)
                | (DisambiguationState::Cancelled, DisambiguationState::Idle)
        )
    }
}

/// A command waiting for the teacher to choose between candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDisambiguation {
    pub command: ParsedCommand,
    /// Indexed in prompt order; `SelectCandidate { index }` refers to this.
    pub candidates: Vec<MatchCandidate>,
    pub created_at: DateTime<Utc>,
}

/// How a settlement command was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// The pending command should now be applied to `candidate`.
    Resolved {
        command: ParsedCommand,
        candidate: MatchCandidate,
    },
    Cancelled {
        command: ParsedCommand,
    },
    /// Index out of range; still waiting.
    InvalidSelection { index: usize, available: usize },
    NothingPending,
}

pub struct Disambiguator {
    state: DisambiguationState,
    pending: Option<PendingDisambiguation>,
    timeout: Option<Duration>,
}

impl Disambiguator {
    pub fn new(config: &DisambiguationConfig) -> Self {
        Self {
            state: DisambiguationState::Idle,
            pending: None,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn state(&self) -> DisambiguationState {
        self.state
    }

    /// Snapshot of the pending prompt, for the host to render.
    pub fn pending(&self) -> Option<&PendingDisambiguation> {
        self.pending.as_ref()
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == DisambiguationState::AwaitingSelection
    }

    fn transition(&mut self, target: DisambiguationState) -> Result<()> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Disambiguation state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(CommandError::InvalidTransition(self.state, target))
        }
    }

    /// Start waiting on `command`. Any prompt already pending is cancelled
    /// first and returned.
    pub fn begin(
        &mut self,
        command: ParsedCommand,
        candidates: Vec<MatchCandidate>,
    ) -> Result<Option<PendingDisambiguation>> {
        let superseded = self.cancel()?;
        self.transition(DisambiguationState::AwaitingSelection)?;
        tracing::info!(
            kind = command.kind(),
            candidates = candidates.len(),
            "Awaiting disambiguation"
        );
        self.pending = Some(PendingDisambiguation {
            command,
            candidates,
            created_at: Utc::now(),
        });
        Ok(superseded)
    }

    /// Drop the pending prompt, if any, and return to Idle.
    pub fn cancel(&mut self) -> Result<Option<PendingDisambiguation>> {
        if !self.is_awaiting() {
            return Ok(None);
        }
        self.transition(DisambiguationState::Cancelled)?;
        let pending = self.pending.take();
        self.transition(DisambiguationState::Idle)?;
        if let Some(p) = &pending {
            tracing::info!(kind = p.command.kind(), "Disambiguation cancelled");
        }
        Ok(pending)
    }

    /// Apply a `SelectCandidate`, `Confirm` or `Reject` command.
    pub fn settle(&mut self, command: &ParsedCommand) -> Result<Settlement> {
        let index = match command {
            ParsedCommand::SelectCandidate { index } => *index,
            ParsedCommand::Confirm => 0,
            ParsedCommand::Reject => {
                return Ok(match self.cancel()? {
                    Some(pending) => Settlement::Cancelled {
                        command: pending.command,
                    },
                    None => Settlement::NothingPending,
                });
            }
            other => return Err(CommandError::NotASettlement(other.kind())),
        };

        let available = match &self.pending {
            Some(pending) if self.is_awaiting() => pending.candidates.len(),
            _ => return Ok(Settlement::NothingPending),
        };
        if index >= available {
            tracing::debug!(index, available, "Selection out of range");
            return Ok(Settlement::InvalidSelection { index, available });
        }

        self.transition(DisambiguationState::Resolved)?;
        let pending = self.pending.take();
        self.transition(DisambiguationState::Idle)?;

        match pending {
            Some(mut pending) => {
                let candidate = pending.candidates.swap_remove(index);
                tracing::info!(
                    kind = pending.command.kind(),
                    row_index = candidate.row_index,
                    "Disambiguation resolved"
                );
                Ok(Settlement::Resolved {
                    command: pending.command,
                    candidate,
                })
            }
            None => Ok(Settlement::NothingPending),
        }
    }

    /// Cancel the pending prompt when it is older than the configured
    /// timeout. Without a timeout prompts never expire.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) -> Result<Option<PendingDisambiguation>> {
        let (Some(timeout), Some(pending)) = (self.timeout, &self.pending) else {
            return Ok(None);
        };
        let age = now.signed_duration_since(pending.created_at);
        if age.to_std().is_ok_and(|age| age >= timeout) {
            tracing::info!(age_secs = age.num_seconds(), "Disambiguation prompt expired");
            return self.cancel();
        }
        Ok(None)
    }
}

impl Default for Disambiguator {
    fn default() -> Self {
        Self::new(&DisambiguationConfig::default())
    }
}
