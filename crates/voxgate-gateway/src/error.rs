use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use voxgate_core::redact;
use voxgate_stt::TranscribeError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// A transcription fault mapped onto the single JSON error contract.
///
/// Client-input faults answer 400, everything else 500. Provider 4xx codes
/// are deliberately not passed through: a rejected model name or exhausted
/// quota is a deployment problem, not the uploader's.
pub(crate) struct ApiError(pub(crate) TranscribeError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        if self.0.is_client_fault() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<TranscribeError> for ApiError {
    fn from(e: TranscribeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(kind = self.0.kind(), %status, "request failed: {}", self.0);
        let error = redact::scrub_secrets(&self.0.to_string()).into_owned();
        let details = self.0.detail().map(scrub_detail);
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

// Providers sometimes echo the credential back inside error bodies; scrub
// the serialized detail before it reaches the client.
fn scrub_detail(detail: &Value) -> Value {
    match serde_json::to_string(detail) {
        Ok(raw) => {
            let scrubbed = redact::scrub_secrets(&raw);
            serde_json::from_str(&scrubbed).unwrap_or_else(|_| Value::String(scrubbed.into_owned()))
        }
        Err(_) => Value::Null,
    }
}
