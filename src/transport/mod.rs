//! Request/response seam between the search workflow and the REST API.
//!
//! The workflow only speaks [`ApiRequest`] and [`ApiResponse`]; [`HttpTransport`]
//! carries them over reqwest, and tests substitute a scripted transport.

mod http;

pub use http::HttpTransport;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Executes API requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. HTTP error statuses are returned as responses;
    /// only failures that produce no response are `Err`.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        (**self).execute(request).await
    }
}

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `parallels/abc/status/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Ask intermediaries not to serve or store a cached copy
    pub no_store: bool,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            no_store: false,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(path)
        }
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    /// All values sent for a query key, in order
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// What came back from the server
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `Location` header, if any
    pub location: Option<String>,
    /// URL the request finally resolved to after redirects
    pub final_url: Option<String>,
    /// Decoded JSON body; non-JSON bodies are kept as a string, empty bodies as null
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            location: None,
            final_url: None,
            body,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = Some(url.into());
        self
    }

    /// 400..=599
    pub fn is_error_status(&self) -> bool {
        (400..600).contains(&self.status)
    }

    /// Turn a 4xx/5xx response into [`AppError::Server`]
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_error_status() {
            let body = match &self.body {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Err(AppError::Server {
                status: self.status,
                body,
            });
        }
        Ok(self)
    }

    /// Decode the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| AppError::Protocol(format!("Unexpected response body: {}", e)))
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.body.get(field).map_or(false, |v| !v.is_null())
    }
}
