use crate::models::Parallel;
use crate::state::{StateSink, StateUpdate};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Updates kept by [`SharedSearchState`] unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Snapshot of everything the workflow publishes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub search_in_progress: bool,
    pub changing_page: bool,
    pub stopwords: Vec<String>,
    pub search_id: Option<String>,
    pub status: Option<String>,
    pub progress: Option<serde_json::Value>,
    pub results: Vec<Parallel>,
    pub total_count: u64,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one update into the state
    pub fn reduce(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::SearchInProgress(flag) => self.search_in_progress = flag,
            StateUpdate::ChangingPage(flag) => self.changing_page = flag,
            StateUpdate::Stopwords(stopwords) => self.stopwords = stopwords,
            StateUpdate::SearchId(search_id) => self.search_id = Some(search_id),
            StateUpdate::SearchStatus { status, progress } => {
                self.status = Some(status);
                self.progress = progress;
            }
            StateUpdate::Results {
                parallels,
                total_count,
            } => {
                self.results = parallels;
                self.total_count = total_count;
            }
        }
    }

    /// Either kind of request is outstanding
    pub fn is_busy(&self) -> bool {
        self.search_in_progress || self.changing_page
    }
}

/// Thread-safe shared state, cloneable across tasks.
///
/// Keeps the most recent updates up to a fixed limit; older ones are dropped.
#[derive(Clone)]
pub struct SharedSearchState {
    inner: Arc<RwLock<SearchState>>,
    history: Arc<RwLock<VecDeque<StateUpdate>>>,
    history_limit: usize,
}

impl SharedSearchState {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Keep at most `limit` updates; 0 disables the history
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SearchState::new())),
            history: Arc::new(RwLock::new(VecDeque::new())),
            history_limit: limit,
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SearchState {
        self.inner.read().clone()
    }

    /// Retained updates, oldest first
    pub fn history(&self) -> Vec<StateUpdate> {
        self.history.read().iter().cloned().collect()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    fn record(&self, update: &StateUpdate) {
        if self.history_limit == 0 {
            return;
        }
        let mut history = self.history.write();
        while history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(update.clone());
    }
}

impl Default for SharedSearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSink for SharedSearchState {
    fn apply(&self, update: StateUpdate) {
        tracing::trace!(?update, "Applying state update");
        self.record(&update);
        self.inner.write().reduce(update);
    }
}
