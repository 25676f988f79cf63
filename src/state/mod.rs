//! Application state published by the search workflow.
//!
//! Workflow steps never touch state directly. They return [`StateUpdate`]
//! events, and the orchestrator hands them to a [`StateSink`]: either the
//! in-process [`SharedSearchState`] or a channel that a front end drains.

pub mod channel;
pub mod store;

pub use channel::ChannelSink;
pub use store::*;

use crate::models::Parallel;
use serde::{Deserialize, Serialize};

/// A single change to the published search state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StateUpdate {
    /// A full search is running
    SearchInProgress(bool),

    /// A page or sort change is being fetched
    ChangingPage(bool),

    /// Stoplist resolved for the current search
    Stopwords(Vec<String>),

    /// Identifier issued by the server for the current search
    SearchId(String),

    /// Latest reported job status
    SearchStatus {
        status: String,
        progress: Option<serde_json::Value>,
    },

    /// A freshly normalized page of results
    Results {
        parallels: Vec<Parallel>,
        total_count: u64,
    },
}

/// Receives state updates in the order they were produced
pub trait StateSink: Send + Sync {
    fn apply(&self, update: StateUpdate);

    fn apply_all(&self, updates: Vec<StateUpdate>) {
        for update in updates {
            self.apply(update);
        }
    }
}

impl<S: StateSink + ?Sized> StateSink for std::sync::Arc<S> {
    fn apply(&self, update: StateUpdate) {
        (**self).apply(update)
    }
}
