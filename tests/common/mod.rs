//! Common test utilities for workflow testing
//!
//! Provides a scripted in-memory transport that answers requests from
//! per-route queues and records everything it was asked.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use tesserae_client::error::{AppError, Result};
use tesserae_client::transport::{ApiRequest, ApiResponse, Transport};

pub const BASE_URL: &str = "http://localhost:5000/api";

enum Scripted {
    Respond(ApiResponse),
    Fail(String),
}

/// Transport answering from scripted queues keyed by method and path.
///
/// The last entry of a queue is repeated once everything before it was used.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, response: ApiResponse) -> &Self {
        self.push(method, path, Scripted::Respond(response))
    }

    /// Script a failure with no response, as a dropped connection would produce
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Scripted::Fail(message.to_string()))
    }

    fn push(&self, method: Method, path: &str, entry: Scripted) -> &Self {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(entry);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().push(request);

        let mut routes = self.routes.lock();
        let queue = routes
            .get_mut(&key)
            .ok_or_else(|| AppError::Transport(format!("no scripted route for {} {}", key.0, key.1)))?;

        let entry = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|entry| match entry {
                Scripted::Respond(response) => Scripted::Respond(response.clone()),
                Scripted::Fail(message) => Scripted::Fail(message.clone()),
            })
        };

        match entry {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(AppError::Transport(message)),
            None => Err(AppError::Transport(format!("script exhausted for {} {}", key.0, key.1))),
        }
    }
}

pub fn status_path(search_id: &str) -> String {
    format!("parallels/{}/status/", search_id)
}

pub fn results_path(search_id: &str) -> String {
    format!("parallels/{}", search_id)
}

pub fn stoplist_response(words: &[&str]) -> ApiResponse {
    ApiResponse::new(200, json!({ "stopwords": words }))
}

/// 201 Created pointing at the new search
pub fn accepted_response(search_id: &str) -> ApiResponse {
    ApiResponse::new(201, Value::Null)
        .with_location(format!("{}/parallels/{}/", BASE_URL, search_id))
        .with_final_url(format!("{}/parallels/", BASE_URL))
}

pub fn status_response(status: &str) -> ApiResponse {
    ApiResponse::new(200, json!({ "status": status, "progress": [] }))
}

pub fn results_response(scores: &[f64], max_score: f64) -> ApiResponse {
    let parallels: Vec<Value> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            json!({
                "object_id": format!("p{}", i),
                "source_tag": format!("aeneid 1.{}", i + 1),
                "target_tag": format!("bellum civile 1.{}", i + 1),
                "matched_features": ["arma", "vir"],
                "source_snippet": "arma virumque cano",
                "target_snippet": "bella per emathios",
                "score": score,
            })
        })
        .collect();

    ApiResponse::new(
        200,
        json!({
            "parallels": parallels,
            "max_score": max_score,
            "total_count": scores.len() * 3,
        }),
    )
}

pub fn server_error(status: u16) -> ApiResponse {
    ApiResponse::new(status, json!({ "message": "internal error" }))
}
