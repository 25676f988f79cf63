//! Search lifecycle state machine.
//!
//! ```text
//! Idle -> StoplistPending -> SearchSubmitted -> Polling -> ResultsFetching -> Idle
//!                                  |              ^  |
//!                                  |              +--+  (status not done)
//!                                  +--> Idle            (results embedded in submission)
//!
//! any pending phase -> ErrorAborted | Cancelled
//! ```

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Phase of a single `run_search` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    StoplistPending,
    SearchSubmitted,
    Polling,
    ResultsFetching,
    ErrorAborted,
    Cancelled,
}

impl SearchPhase {
    /// A request is outstanding or about to be issued
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            SearchPhase::StoplistPending
                | SearchPhase::SearchSubmitted
                | SearchPhase::Polling
                | SearchPhase::ResultsFetching
        )
    }

    /// Ended without results
    pub fn is_aborted(&self) -> bool {
        matches!(self, SearchPhase::ErrorAborted | SearchPhase::Cancelled)
    }

    pub fn can_transition_to(&self, next: SearchPhase) -> bool {
        use SearchPhase::*;

        match (self, next) {
            (Idle, StoplistPending)
            | (StoplistPending, SearchSubmitted)
            | (SearchSubmitted, Idle)
            | (SearchSubmitted, Polling)
            | (Polling, Polling)
            | (Polling, ResultsFetching)
            | (ResultsFetching, Idle) => true,
            (from, ErrorAborted) | (from, Cancelled) => from.is_pending(),
            _ => false,
        }
    }
}

/// Represents a phase change of a search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SearchPhase,
    pub to: SearchPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Tracks one search run through its phases
#[derive(Debug, Clone)]
pub struct SearchMachine {
    run_id: Uuid,
    phase: SearchPhase,
    transitions: Vec<PhaseTransition>,
    polls: u32,
}

impl SearchMachine {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase: SearchPhase::Idle,
            transitions: Vec::new(),
            polls: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Recorded transitions, oldest first. Repeated polls are counted, not recorded.
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    /// Number of `Polling -> Polling` steps taken
    pub fn repeated_polls(&self) -> u32 {
        self.polls
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition_to(&mut self, next: SearchPhase, reason: impl Into<String>) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                self.phase, next
            )));
        }

        if self.phase == next {
            self.polls += 1;
            return Ok(());
        }

        let reason = reason.into();
        tracing::debug!(run_id = %self.run_id, from = %self.phase, to = %next, reason = %reason, "Search phase changed");

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to: next,
            timestamp: Utc::now(),
            reason,
        });
        self.phase = next;
        Ok(())
    }

    /// Leave a pending phase because of `error`. No-op once the run has ended.
    pub fn abort(&mut self, error: &AppError) {
        let next = match error {
            AppError::Cancelled => SearchPhase::Cancelled,
            _ => SearchPhase::ErrorAborted,
        };
        if self.phase.can_transition_to(next) {
            let _ = self.transition_to(next, error.to_string());
        }
    }
}

impl Default for SearchMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut machine = SearchMachine::new();
        machine.transition_to(SearchPhase::StoplistPending, "start").unwrap();
        machine.transition_to(SearchPhase::SearchSubmitted, "stoplist").unwrap();
        machine.transition_to(SearchPhase::Polling, "submitted").unwrap();
        machine.transition_to(SearchPhase::Polling, "running").unwrap();
        machine.transition_to(SearchPhase::Polling, "running").unwrap();
        machine.transition_to(SearchPhase::ResultsFetching, "done").unwrap();
        machine.transition_to(SearchPhase::Idle, "published").unwrap();

        assert_eq!(machine.phase(), SearchPhase::Idle);
        assert_eq!(machine.transitions().len(), 5);
        assert_eq!(machine.repeated_polls(), 2);
    }

    #[test]
    fn test_synchronous_completion_path() {
        let mut machine = SearchMachine::new();
        machine.transition_to(SearchPhase::StoplistPending, "start").unwrap();
        machine.transition_to(SearchPhase::SearchSubmitted, "stoplist").unwrap();
        assert!(machine.transition_to(SearchPhase::Idle, "embedded").is_ok());
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut machine = SearchMachine::new();
        let err = machine
            .transition_to(SearchPhase::Polling, "skip ahead")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        assert_eq!(machine.phase(), SearchPhase::Idle);

        assert!(!SearchPhase::StoplistPending.can_transition_to(SearchPhase::Polling));
        assert!(!SearchPhase::Polling.can_transition_to(SearchPhase::Idle));
        assert!(!SearchPhase::Idle.can_transition_to(SearchPhase::ErrorAborted));
        assert!(!SearchPhase::ErrorAborted.can_transition_to(SearchPhase::StoplistPending));
    }

    #[test]
    fn test_abort_from_every_pending_phase() {
        for phase in [
            SearchPhase::StoplistPending,
            SearchPhase::SearchSubmitted,
            SearchPhase::Polling,
            SearchPhase::ResultsFetching,
        ] {
            assert!(phase.can_transition_to(SearchPhase::ErrorAborted), "{}", phase);
            assert!(phase.can_transition_to(SearchPhase::Cancelled), "{}", phase);
        }
    }

    #[test]
    fn test_abort_picks_cancelled_for_cancellation() {
        let mut machine = SearchMachine::new();
        machine.transition_to(SearchPhase::StoplistPending, "start").unwrap();
        machine.abort(&AppError::Cancelled);
        assert_eq!(machine.phase(), SearchPhase::Cancelled);

        let mut machine = SearchMachine::new();
        machine.transition_to(SearchPhase::StoplistPending, "start").unwrap();
        machine.abort(&AppError::Server {
            status: 500,
            body: String::new(),
        });
        assert_eq!(machine.phase(), SearchPhase::ErrorAborted);
        assert!(machine.phase().is_aborted());
    }

    #[test]
    fn test_abort_after_finish_is_noop() {
        let mut machine = SearchMachine::new();
        machine.abort(&AppError::Cancelled);
        assert_eq!(machine.phase(), SearchPhase::Idle);
        assert!(machine.transitions().is_empty());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SearchPhase::StoplistPending.to_string(), "stoplist_pending");
        assert_eq!(SearchPhase::ErrorAborted.to_string(), "error_aborted");
    }
}
