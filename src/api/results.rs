use super::{SearchApi, Step};
use crate::error::Result;
use crate::models::{PaginationState, ResultPage, ResultsBody};
use crate::normalize::normalize_scores;
use crate::state::StateUpdate;
use crate::transport::{ApiRequest, Transport};
use tracing::debug;

impl<T: Transport> SearchApi<T> {
    /// Fetch one page of results for `search_id`, scores normalized to 0..=10
    pub async fn fetch_results(
        &self,
        search_id: &str,
        pagination: &PaginationState,
    ) -> Result<Step<ResultPage>> {
        let request = ApiRequest::get(format!("parallels/{}", search_id))
            .with_query(pagination.query_pairs())
            .no_store();
        let response = self.transport.execute(request).await?.ensure_success()?;

        let body: ResultsBody = response.json()?;
        let raw = body.parallels.unwrap_or_default();
        let parallels = normalize_scores(&raw, body.max_score);
        let total_count = body.total_count.unwrap_or(raw.len() as u64);

        debug!(
            search_id,
            page = pagination.current_page,
            rows = parallels.len(),
            total_count,
            "Results page fetched"
        );

        Ok(Step::new(
            ResultPage {
                parallels: parallels.clone(),
                total_count,
                max_score: body.max_score.unwrap_or_default(),
            },
            vec![StateUpdate::Results {
                parallels,
                total_count,
            }],
        ))
    }
}
