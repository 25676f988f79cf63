use super::{SearchApi, Step};
use crate::error::Result;
use crate::models::{SearchStatus, StatusBody};
use crate::state::StateUpdate;
use crate::transport::{ApiRequest, ApiResponse, Transport};
use tracing::debug;

/// One answer from the status endpoint
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// `None` when the body carried no `status` field
    pub status: Option<SearchStatus>,
    pub progress: Option<serde_json::Value>,
    pub response: ApiResponse,
}

impl<T: Transport> SearchApi<T> {
    /// Ask once for the status of `search_id`
    pub async fn search_status(&self, search_id: &str) -> Result<Step<StatusReport>> {
        let request = ApiRequest::get(format!("parallels/{}/status/", search_id)).no_store();
        let response = self.transport.execute(request).await?.ensure_success()?;

        let body: StatusBody = response.json()?;
        let mut updates = Vec::new();

        let status = body.status.map(|raw| {
            debug!(search_id, status = %raw, "Search status reported");
            updates.push(StateUpdate::SearchStatus {
                status: raw.clone(),
                progress: body.progress.clone(),
            });
            SearchStatus::parse(&raw)
        });

        Ok(Step::new(
            StatusReport {
                status,
                progress: body.progress,
                response,
            },
            updates,
        ))
    }
}
