//! Single-request operations against the Tesserae REST API.
//!
//! Each operation issues exactly one request and returns a [`Step`]: the
//! decoded value plus the state updates it wants published. Nothing here
//! loops or retries; sequencing belongs to [`crate::workflow`].

mod results;
mod status;
mod stoplist;
mod submit;

pub use status::StatusReport;
pub use submit::{extract_search_id, SearchPayload, Submission};

use crate::state::StateUpdate;
use crate::transport::Transport;

/// Outcome of one workflow step
#[derive(Debug, Clone)]
pub struct Step<T> {
    pub value: T,
    pub updates: Vec<StateUpdate>,
}

impl<T> Step<T> {
    pub fn new(value: T, updates: Vec<StateUpdate>) -> Self {
        Self { value, updates }
    }

    /// Hand the updates to `sink` and keep the value
    pub fn publish(self, sink: &dyn crate::state::StateSink) -> T {
        sink.apply_all(self.updates);
        self.value
    }
}

/// Client for the search endpoints
#[derive(Clone)]
pub struct SearchApi<T> {
    transport: T,
}

impl<T: Transport> SearchApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
