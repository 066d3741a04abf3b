use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::Value;

use crate::http::types::ProxyError;

/// Forwards `/api/todos*` to the backend unchanged, adding nothing but the caller's
/// `Authorization` header.
#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    backend_url: String,
}

impl ProxyState {
    pub fn new(backend_url: &str) -> Self {
        Self { client: reqwest::Client::new(), backend_url: backend_url.trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.backend_url, path) }

    async fn forward(&self, method: Method, url: String, headers: &HeaderMap, body: Option<Value>) -> anyhow::Result<Response> {
        let mut req = self.client.request(method, url).header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = headers.get(header::AUTHORIZATION) {
            req = req.header(header::AUTHORIZATION, auth.clone());
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
        let data: Value = resp.json().await?;
        Ok((status, Json(data)).into_response())
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/:id", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/api/todos/:id/complete", patch(complete_todo))
        .route("/api/todos/:id/incomplete", patch(incomplete_todo))
        .with_state(state)
}

fn relay(result: anyhow::Result<Response>, failure: &str) -> Response {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "{failure}");
        ProxyError::new(failure).into_response()
    })
}

fn parse_body(body: &Bytes) -> anyhow::Result<Value> { Ok(serde_json::from_slice(body)?) }

async fn list_todos(State(state): State<ProxyState>, RawQuery(query): RawQuery, headers: HeaderMap) -> Response {
    let mut url = state.url("/todos");
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&q);
    }
    relay(state.forward(Method::GET, url, &headers, None).await, "Failed to fetch todos")
}

async fn create_todo(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> Response {
    let result = match parse_body(&body) {
        Ok(json) => state.forward(Method::POST, state.url("/todos"), &headers, Some(json)).await,
        Err(e) => Err(e),
    };
    relay(result, "Failed to create todo")
}

async fn get_todo(State(state): State<ProxyState>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    relay(state.forward(Method::GET, state.url(&format!("/todos/{id}")), &headers, None).await, "Failed to fetch todo")
}

async fn update_todo(State(state): State<ProxyState>, Path(id): Path<String>, headers: HeaderMap, body: Bytes) -> Response {
    let result = match parse_body(&body) {
        Ok(json) => state.forward(Method::PUT, state.url(&format!("/todos/{id}")), &headers, Some(json)).await,
        Err(e) => Err(e),
    };
    relay(result, "Failed to update todo")
}

async fn delete_todo(State(state): State<ProxyState>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    relay(state.forward(Method::DELETE, state.url(&format!("/todos/{id}")), &headers, None).await, "Failed to delete todo")
}

async fn complete_todo(State(state): State<ProxyState>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    relay(state.forward(Method::PATCH, state.url(&format!("/todos/{id}/complete")), &headers, None).await, "Failed to complete todo")
}

async fn incomplete_todo(State(state): State<ProxyState>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    relay(
        state.forward(Method::PATCH, state.url(&format!("/todos/{id}/incomplete")), &headers, None).await,
        "Failed to mark todo as incomplete",
    )
}
