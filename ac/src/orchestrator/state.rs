//! Per-row attempt state machine

use serde::Serialize;
use tracing::{debug, warn};

/// Where a row's generation currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptState {
    Pending,
    BuildingPrompt,
    AwaitingLlm,
    Validating,
    Retrying,
    Succeeded,
    FailedAfterRetries,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedAfterRetries)
    }

    /// Legal transitions
    ///
    /// A provider failure goes straight from `AwaitingLlm` to `Retrying` or
    /// `FailedAfterRetries` without validation.
    pub fn can_transition_to(&self, next: AttemptState) -> bool {
        use AttemptState::*;
        matches!(
            (self, next),
            (Pending, BuildingPrompt)
                | (BuildingPrompt, AwaitingLlm)
                | (AwaitingLlm, Validating)
                | (AwaitingLlm, Retrying)
                | (AwaitingLlm, FailedAfterRetries)
                | (Validating, Succeeded)
                | (Validating, Retrying)
                | (Validating, FailedAfterRetries)
                | (Retrying, BuildingPrompt)
        )
    }
}

/// Ordered record of the states a generation passed through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptTrace {
    states: Vec<AttemptState>,
    attempts: u32,
}

impl Default for AttemptTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptTrace {
    pub fn new() -> Self {
        Self {
            states: vec![AttemptState::Pending],
            attempts: 0,
        }
    }

    pub fn current(&self) -> AttemptState {
        self.states.last().copied().unwrap_or(AttemptState::Pending)
    }

    /// Move to `next`; illegal transitions are logged and ignored
    pub fn advance(&mut self, next: AttemptState) -> bool {
        let current = self.current();
        if !current.can_transition_to(next) {
            warn!(?current, ?next, "Ignoring illegal attempt transition");
            return false;
        }
        if next == AttemptState::BuildingPrompt {
            self.attempts += 1;
        }
        debug!(?current, ?next, attempt = self.attempts, "AttemptTrace::advance: transition");
        self.states.push(next);
        true
    }

    pub fn states(&self) -> &[AttemptState] {
        &self.states
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
