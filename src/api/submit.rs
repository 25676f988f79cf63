use super::{SearchApi, Step};
use crate::error::{AppError, Result};
use crate::models::{
    PaginationState, ResultPage, ResultsBody, SearchParameters, TextReference, UnitType,
};
use crate::normalize::normalize_scores;
use crate::state::StateUpdate;
use crate::transport::{ApiRequest, ApiResponse, Transport};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

static SEARCH_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"parallels/(\w+)").expect("search id pattern is valid"));

/// Result of submitting a search
#[derive(Debug, Clone)]
pub struct Submission {
    pub search_id: String,
    /// Present when the server finished the search within the submission request
    pub results: Option<ResultPage>,
    pub response: ApiResponse,
}

/// Body of `POST /parallels/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPayload {
    pub method: SearchMethod,
    pub page_number: u32,
    pub per_page: u32,
    pub sort_by: String,
    pub sort_order: String,
    pub source: TextUnits,
    pub target: TextUnits,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMethod {
    pub name: String,
    pub feature: String,
    pub stopwords: Vec<String>,
    pub freq_basis: String,
    pub max_distance: i64,
    pub distance_basis: String,
    pub score_basis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextUnits {
    pub object_id: String,
    pub units: UnitType,
}

impl SearchPayload {
    /// Build the submission body, asking for the first page sorted by score
    pub fn new(
        source: &TextReference,
        target: &TextReference,
        params: &SearchParameters,
        stopwords: &[String],
    ) -> Self {
        let first_page = PaginationState::default();
        Self {
            method: SearchMethod {
                name: "original".to_string(),
                feature: params.feature.clone(),
                stopwords: stopwords.to_vec(),
                freq_basis: params.frequency_basis.clone(),
                max_distance: params.max_distance,
                distance_basis: params.distance_basis.clone(),
                score_basis: params.score_basis.clone(),
            },
            page_number: first_page.current_page,
            per_page: first_page.rows_per_page,
            sort_by: first_page.sort_header,
            sort_order: first_page.sort_order.as_str().to_string(),
            source: TextUnits {
                object_id: source.object_id.clone(),
                units: params.unit_type,
            },
            target: TextUnits {
                object_id: target.object_id.clone(),
                units: params.unit_type,
            },
        }
    }
}

/// Pull the search id out of a URL such as `.../parallels/3fa9c1/`
pub fn extract_search_id(url: &str) -> Option<String> {
    SEARCH_ID_PATTERN
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

impl<T: Transport> SearchApi<T> {
    /// Submit a search between `source` and `target`
    pub async fn initiate_search(
        &self,
        source: &TextReference,
        target: &TextReference,
        params: &SearchParameters,
        stopwords: &[String],
    ) -> Result<Step<Submission>> {
        let payload = SearchPayload::new(source, target, params, stopwords);
        let request = ApiRequest::post("parallels/", serde_json::to_value(&payload)?)
            .with_header("X-Requested-With", "XMLHttpRequest");

        let response = self
            .transport
            .execute(request)
            .await
            .and_then(|response| response.ensure_success())
            .map_err(|e| {
                warn!(source = %source.object_id, target = %target.object_id, error = %e, "Search submission failed");
                e
            })?;

        let search_id = response
            .location
            .as_deref()
            .and_then(extract_search_id)
            .or_else(|| response.final_url.as_deref().and_then(extract_search_id))
            .ok_or_else(|| {
                AppError::Protocol(format!(
                    "No search id in Location header ({:?}) or response URL ({:?})",
                    response.location, response.final_url
                ))
            })?;

        let mut updates = vec![StateUpdate::SearchId(search_id.clone())];

        let results = if response.has_field("parallels") {
            let body: ResultsBody = response.json()?;
            let raw = body.parallels.unwrap_or_default();
            let page = ResultPage {
                parallels: normalize_scores(&raw, body.max_score),
                total_count: body.total_count.unwrap_or(raw.len() as u64),
                max_score: body.max_score.unwrap_or_default(),
            };
            updates.push(StateUpdate::Results {
                parallels: page.parallels.clone(),
                total_count: page.total_count,
            });
            Some(page)
        } else {
            None
        };

        info!(
            search_id = %search_id,
            embedded_results = results.is_some(),
            "Search submitted"
        );

        Ok(Step::new(
            Submission {
                search_id,
                results,
                response,
            },
            updates,
        ))
    }
}
