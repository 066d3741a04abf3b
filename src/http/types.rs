use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Body of the fixed 500 answer the proxy gives when it cannot reach or talk to the backend.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyError {
    pub error: String,
    pub success: bool,
}

impl ProxyError {
    pub fn new(message: &str) -> Self { Self { error: message.to_string(), success: false } }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response { (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(self)).into_response() }
}
