//! Bounded transition history for post-incident audit.

use crate::state::State;
use chrono::{DateTime, Utc};
use precinct_core::constants::MAX_HISTORY_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: State,
    pub to: State,
    /// Event label, never containing images or votes
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

/// Shared, capped list of transitions. Oldest entries are dropped first.
#[derive(Debug, Clone, Default)]
pub struct TransitionHistory {
    entries: Arc<Mutex<VecDeque<StateTransition>>>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StateTransition>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, from: State, to: State, event: impl Into<String>) {
        let mut entries = self.lock();
        entries.push_back(StateTransition {
            from,
            to,
            event: event.into(),
            timestamp: Utc::now(),
        });
        while entries.len() > MAX_HISTORY_SIZE {
            entries.pop_front();
        }
    }

    /// Copy of the history, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StateTransition> {
        self.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_in_order() {
        let history = TransitionHistory::new();
        history.record(State::Connecting, State::CheckingInitialPaperStatus, "action:connected");
        history.record(State::CheckingInitialPaperStatus, State::NoPaper, "scanner:no_paper");

        let entries = history.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].from, State::Connecting);
        assert_eq!(entries[1].to, State::NoPaper);
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_history_size_limit() {
        let history = TransitionHistory::new();
        for i in 0..(MAX_HISTORY_SIZE + 10) {
            history.record(State::NoPaper, State::NoPaper, format!("event {i}"));
        }

        let entries = history.snapshot();
        assert_eq!(entries.len(), MAX_HISTORY_SIZE);
        assert_eq!(entries[0].event, "event 10");
    }

    #[test]
    fn test_history_shared_between_clones() {
        let history = TransitionHistory::new();
        let view = history.clone();
        history.record(State::Connecting, State::UnrecoverableError, "action:failed");
        assert_eq!(view.len(), 1);
        assert!(!view.is_empty());
    }
}
