use super::{SearchApi, Step};
use crate::error::Result;
use crate::models::FrequencySource;
use crate::state::StateUpdate;
use crate::transport::{ApiRequest, Transport};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct StoplistBody {
    #[serde(default)]
    stopwords: Vec<String>,
}

impl<T: Transport> SearchApi<T> {
    /// Fetch the `list_size` most frequent tokens for `feature` over `basis`
    pub async fn fetch_stoplist(
        &self,
        feature: &str,
        list_size: u32,
        basis: &FrequencySource,
    ) -> Result<Step<Vec<String>>> {
        let mut query = vec![
            ("feature".to_string(), feature.to_string()),
            ("list_size".to_string(), list_size.to_string()),
        ];
        query.extend(basis.query_pairs());

        let request = ApiRequest::get("stopwords/").with_query(query);
        let response = self
            .transport
            .execute(request)
            .await
            .and_then(|response| response.ensure_success())
            .map_err(|e| {
                warn!(feature, list_size, error = %e, "Stoplist request failed");
                e
            })?;

        let body: StoplistBody = response.json()?;
        debug!(feature, count = body.stopwords.len(), "Stoplist resolved");

        Ok(Step::new(
            body.stopwords.clone(),
            vec![StateUpdate::Stopwords(body.stopwords)],
        ))
    }
}
