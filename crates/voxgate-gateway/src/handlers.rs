use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use voxgate_stt::{TranscribeError, TranscriptionRequest};

use crate::error::ApiError;
use crate::receive;
use crate::server::AppState;

#[derive(serde::Serialize)]
struct TranscribeResponse {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn transcribe_handler(State(state): State<AppState>, req: Request) -> Response {
    match transcribe(&state, req).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// Receive, dispatch, respond. One adapter invocation at most, one payload
/// release exactly, on every path out of this function.
async fn transcribe(state: &AppState, req: Request) -> Result<TranscribeResponse, TranscribeError> {
    // A misconfigured deployment answers every request with the same
    // configuration fault, before any body parsing starts.
    let Some(adapter) = state.adapter.clone() else {
        return Err(TranscribeError::Configuration(
            "no speech-to-text provider is configured".into(),
        ));
    };

    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| TranscribeError::MalformedUpload(e.to_string()))?;
    let payload = receive::receive(&mut multipart, state.limits).await?;

    tracing::debug!(
        bytes = payload.len(),
        declared_mime = payload.declared_mime().unwrap_or("<none>"),
        provider = adapter.name(),
        "dispatching transcription"
    );

    let mut request = TranscriptionRequest::new(state.language.clone(), state.detail, payload);
    let outcome = tokio::time::timeout(state.request_timeout, adapter.transcribe(&request)).await;
    request.release_payload();

    let transcript = match outcome {
        Ok(result) => result?,
        Err(_) => {
            return Err(TranscribeError::ProviderUnavailable(format!(
                "no reply from {} within {}s",
                adapter.name(),
                state.request_timeout.as_secs()
            )));
        }
    };

    if transcript.text.is_empty() {
        tracing::warn!(
            provider = adapter.name(),
            "provider returned an empty transcript"
        );
    }
    if let Some(detected) = transcript.language.as_deref()
        && !language_matches(&state.language, detected)
    {
        tracing::warn!(
            pinned = %state.language,
            detected,
            "detected language differs from pinned target"
        );
    }

    let text = refine(state, &transcript.text).await;
    Ok(TranscribeResponse {
        text,
        language: transcript.language,
    })
}

/// Providers report detected languages as codes ("fr") or names ("french");
/// either counts as agreeing with the pinned code.
fn language_matches(pinned: &str, detected: &str) -> bool {
    detected
        .to_ascii_lowercase()
        .starts_with(&pinned.to_ascii_lowercase())
}

async fn refine(state: &AppState, text: &str) -> String {
    let Some(refiner) = &state.refiner else {
        return text.to_owned();
    };
    if text.is_empty() {
        return String::new();
    }
    match refiner.refine(text, &state.language).await {
        Ok(refined) => refined,
        Err(e) => {
            tracing::warn!(
                refiner = refiner.name(),
                error = %e,
                "refinement failed, keeping raw transcript"
            );
            text.to_owned()
        }
    }
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub(crate) async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({"error": "Method not allowed"})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_and_names_match() {
        assert!(language_matches("fr", "fr"));
        assert!(language_matches("fr", "french"));
        assert!(language_matches("fr", "FR"));
        assert!(!language_matches("fr", "english"));
        assert!(!language_matches("fr", "en"));
    }

    #[test]
    fn transcribe_response_omits_absent_language() {
        let json = serde_json::to_string(&TranscribeResponse {
            text: "bonjour".into(),
            language: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"text":"bonjour"}"#);
    }

    #[test]
    fn health_response_serializes() {
        let json = serde_json::to_string(&HealthResponse {
            status: "ok",
            uptime_secs: 7,
        })
        .unwrap();
        assert!(json.contains("\"status\":\"ok\""));
    }
}
