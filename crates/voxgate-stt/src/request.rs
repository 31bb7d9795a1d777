use crate::payload::AudioPayload;

/// How much metadata to ask the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseDetail {
    /// Transcript text only.
    #[default]
    Text,
    /// Text plus detected language and confidence where the provider
    /// supports them.
    Verbose,
}

/// One transcription attempt: a pinned target language, the desired detail
/// level, and the audio payload. Constructed once per request; immutable.
#[derive(Debug)]
pub struct TranscriptionRequest {
    language: String,
    detail: ResponseDetail,
    payload: AudioPayload,
}

impl TranscriptionRequest {
    #[must_use]
    pub fn new(language: impl Into<String>, detail: ResponseDetail, payload: AudioPayload) -> Self {
        Self {
            language: language.into(),
            detail,
            payload,
        }
    }

    /// Target language, always pinned on the outgoing provider request.
    /// Auto-detection misclassifies short noisy clips, so it is never left
    /// to the provider.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn detail(&self) -> ResponseDetail {
        self.detail
    }

    #[must_use]
    pub fn payload(&self) -> &AudioPayload {
        &self.payload
    }

    /// Release the payload's temporary storage. Called by the gateway
    /// exactly once per request, on every outcome path.
    pub fn release_payload(&mut self) {
        self.payload.release();
    }
}

/// Provider-agnostic transcription result.
///
/// Backends differ in what they can report: the text is always present
/// (possibly empty), everything else is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTranscript {
    /// Trimmed transcript text; empty when the provider heard nothing.
    pub text: String,
    /// Language the provider detected, when it reports one. A mismatch with
    /// the pinned target is a warning, never a failure.
    pub language: Option<String>,
    /// Ordered per-segment confidence scores, absent when the provider
    /// does not expose them.
    pub confidence: Option<Vec<f32>>,
}

impl NormalizedTranscript {
    /// Text-only transcript; trims surrounding whitespace.
    #[must_use]
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.trim().to_owned(),
            language: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Vec<f32>) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
