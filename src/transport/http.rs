use super::{ApiRequest, ApiResponse, Transport};
use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, LOCATION};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// reqwest-backed transport rooted at the configured base URL
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, "Sending API request");

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.no_store {
            builder = builder.header(CACHE_CONTROL, "no-store");
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!(
                    "{} {} timed out after {} seconds",
                    request.method, url, self.timeout_secs
                ))
            } else {
                AppError::from(e)
            }
        })?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let final_url = Some(response.url().to_string());

        let text = response.text().await.map_err(AppError::from)?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(status, url = %url, "Received API response");

        Ok(ApiResponse {
            status,
            location,
            final_url,
            body,
        })
    }
}
