use serde_json::Value;

/// Every transcription failure converges to one of these kinds before it
/// leaves the gateway; provider SDK fault types never cross this boundary.
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("provider not configured: {0}")]
    Configuration(String),

    #[error("malformed upload: {0}")]
    MalformedUpload(String),

    #[error("no audio part in upload")]
    MissingPayload,

    #[error("audio upload exceeds the {limit}-byte ceiling")]
    PayloadTooLarge { limit: u64 },

    #[error("provider rejected the request (status {status})")]
    ProviderRejected { status: u16, detail: Option<Value> },

    #[error("provider unreachable: {0}")]
    ProviderUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TranscribeError {
    /// Stable classification tag for logs and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::MalformedUpload(_) => "malformed_upload",
            Self::MissingPayload => "missing_payload",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    /// Opaque provider detail payload, when one was preserved.
    #[must_use]
    pub fn detail(&self) -> Option<&Value> {
        match self {
            Self::ProviderRejected { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// True for faults caused by the client's upload rather than the
    /// provider or the gateway itself.
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::MalformedUpload(_) | Self::MissingPayload | Self::PayloadTooLarge { .. }
        )
    }
}

// All reqwest send errors at this layer are transport-level: DNS, connect,
// TLS, or timeout. Response bodies are decoded separately by each adapter.
impl From<reqwest::Error> for TranscribeError {
    fn from(e: reqwest::Error) -> Self {
        Self::ProviderUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TranscribeError>;

/// Preserve a provider error body as an opaque detail payload, truncated so
/// a misbehaving provider cannot balloon the response.
#[must_use]
pub fn detail_from_body(body: &str) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        return Some(parsed);
    }
    let mut text = body.to_owned();
    if text.len() > 500 {
        let mut end = 500;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    Some(Value::String(text))
}
