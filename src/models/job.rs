use serde::{Deserialize, Serialize};
use std::fmt;

/// Textual state of a search job as reported by the server.
///
/// Comparison is case-insensitive; unknown states are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Queued,
    Initialized,
    Running,
    Done,
    Failed,
    Other(String),
}

impl SearchStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "queued" => SearchStatus::Queued,
            "initialized" => SearchStatus::Initialized,
            "running" => SearchStatus::Running,
            "done" => SearchStatus::Done,
            "failed" => SearchStatus::Failed,
            _ => SearchStatus::Other(raw.to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, SearchStatus::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SearchStatus::Failed)
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::Queued => write!(f, "queued"),
            SearchStatus::Initialized => write!(f, "initialized"),
            SearchStatus::Running => write!(f, "running"),
            SearchStatus::Done => write!(f, "done"),
            SearchStatus::Failed => write!(f, "failed"),
            SearchStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Body of `GET /parallels/{id}/status/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: Option<String>,

    /// Advisory only; the server may send a number or a list of stage records
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
}

/// Client-side view of an asynchronous search job
#[derive(Debug, Clone)]
pub struct SearchJob {
    pub search_id: String,
    pub status: Option<SearchStatus>,
    pub progress: Option<serde_json::Value>,
    /// Number of status checks made so far
    pub polls: u32,
}

impl SearchJob {
    pub fn new(search_id: impl Into<String>) -> Self {
        Self {
            search_id: search_id.into(),
            status: None,
            progress: None,
            polls: 0,
        }
    }

    /// Fold one status report into the job
    pub fn record(&mut self, status: SearchStatus, progress: Option<serde_json::Value>) {
        self.status = Some(status);
        self.progress = progress;
        self.polls += 1;
    }

    pub fn is_done(&self) -> bool {
        self.status.as_ref().map_or(false, SearchStatus::is_done)
    }
}
