use std::fmt;

use serde::Deserialize;

use crate::error::{TranscribeError, detail_from_body};
use crate::mime;
use crate::provider::{SpeechToText, TranscribeFuture};
use crate::request::{NormalizedTranscript, ResponseDetail, TranscriptionRequest};

/// IBM Watson Speech-to-Text backend: binary body POST to `/v1/recognize`.
///
/// The language is pinned through the `model` identifier (Watson models are
/// per-language), so this backend never reports a detected language.
pub struct WatsonAdapter {
    client: reqwest::Client,
    api_key: String,
    service_url: String,
    model: String,
    background_audio_suppression: f32,
    max_alternatives: u32,
}

impl WatsonAdapter {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        service_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let mut service_url = service_url.into();
        while service_url.ends_with('/') {
            service_url.pop();
        }
        Self {
            client,
            api_key: api_key.into(),
            service_url,
            model: model.into(),
            background_audio_suppression: 0.5,
            max_alternatives: 1,
        }
    }

    /// Noise-suppression sensitivity, 0.0 (off) to 1.0 (aggressive).
    #[must_use]
    pub fn with_background_audio_suppression(mut self, level: f32) -> Self {
        self.background_audio_suppression = level.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_max_alternatives(mut self, max: u32) -> Self {
        self.max_alternatives = max.max(1);
        self
    }
}

impl fmt::Debug for WatsonAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatsonAdapter")
            .field("api_key", &"<redacted>")
            .field("service_url", &self.service_url)
            .field("model", &self.model)
            .field(
                "background_audio_suppression",
                &self.background_audio_suppression,
            )
            .field("max_alternatives", &self.max_alternatives)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Deserialize)]
struct RecognizeAlternative {
    transcript: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl RecognizeResponse {
    /// Join the best alternative of each result block into one transcript.
    fn flatten(&self) -> (String, Vec<f32>) {
        let mut parts = Vec::new();
        let mut confidence = Vec::new();
        for best in self.results.iter().filter_map(|r| r.alternatives.first()) {
            let text = best.transcript.trim();
            if !text.is_empty() {
                parts.push(text);
            }
            if let Some(c) = best.confidence {
                confidence.push(c);
            }
        }
        (parts.join(" "), confidence)
    }
}

impl SpeechToText for WatsonAdapter {
    fn transcribe<'a>(&'a self, req: &'a TranscriptionRequest) -> TranscribeFuture<'a> {
        Box::pin(async move {
            let audio = req
                .payload()
                .read()
                .await
                .map_err(|e| TranscribeError::Internal(format!("payload read failed: {e}")))?;

            let content_type = mime::normalize(req.payload().declared_mime());
            let suppression = self.background_audio_suppression.to_string();
            let alternatives = self.max_alternatives.to_string();

            let url = format!("{}/v1/recognize", self.service_url);
            let resp = self
                .client
                .post(&url)
                .basic_auth("apikey", Some(&self.api_key))
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .query(&[
                    ("model", self.model.as_str()),
                    ("background_audio_suppression", suppression.as_str()),
                    ("max_alternatives", alternatives.as_str()),
                    ("smart_formatting", "true"),
                ])
                .body(audio)
                .send()
                .await?;

            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| TranscribeError::ProviderUnavailable(e.to_string()))?;

            if !status.is_success() {
                tracing::error!(%status, "watson recognize request rejected");
                return Err(TranscribeError::ProviderRejected {
                    status: status.as_u16(),
                    detail: detail_from_body(&body),
                });
            }

            let parsed: RecognizeResponse =
                serde_json::from_str(&body).map_err(|e| TranscribeError::ProviderRejected {
                    status: status.as_u16(),
                    detail: Some(serde_json::json!({ "unparseable_response": e.to_string() })),
                })?;

            let (text, confidence) = parsed.flatten();
            let mut transcript = NormalizedTranscript::plain(&text);
            if req.detail() == ResponseDetail::Verbose && !confidence.is_empty() {
                transcript.confidence = Some(confidence);
            }
            Ok(transcript)
        })
    }

    fn name(&self) -> &'static str {
        "watson"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> WatsonAdapter {
        WatsonAdapter::new(
            reqwest::Client::new(),
            "watson-secret",
            "https://api.eu-de.speech-to-text.watson.cloud.ibm.com/",
            "fr-FR_BroadbandModel",
        )
    }

    #[test]
    fn new_strips_trailing_slash() {
        assert_eq!(
            adapter().service_url,
            "https://api.eu-de.speech-to-text.watson.cloud.ibm.com"
        );
    }

    #[test]
    fn builder_clamps_tuning() {
        let a = adapter()
            .with_background_audio_suppression(1.7)
            .with_max_alternatives(0);
        assert!((a.background_audio_suppression - 1.0).abs() < f32::EPSILON);
        assert_eq!(a.max_alternatives, 1);
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", adapter());
        assert!(!debug.contains("watson-secret"));
        assert!(debug.contains("fr-FR_BroadbandModel"));
    }

    #[test]
    fn flatten_joins_result_blocks() {
        let json = r#"{
            "result_index": 0,
            "results": [
                {"final": true, "alternatives": [
                    {"transcript": "bonjour ", "confidence": 0.93},
                    {"transcript": "bon jour "}
                ]},
                {"final": true, "alternatives": [
                    {"transcript": "le monde ", "confidence": 0.88}
                ]}
            ]
        }"#;
        let parsed: RecognizeResponse = serde_json::from_str(json).unwrap();
        let (text, confidence) = parsed.flatten();
        assert_eq!(text, "bonjour le monde");
        assert_eq!(confidence, vec![0.93, 0.88]);
    }

    #[test]
    fn flatten_empty_results() {
        let parsed: RecognizeResponse = serde_json::from_str(r#"{"results":[]}"#).unwrap();
        let (text, confidence) = parsed.flatten();
        assert!(text.is_empty());
        assert!(confidence.is_empty());
    }

    #[test]
    fn flatten_skips_blank_alternatives() {
        let json = r#"{"results":[{"alternatives":[{"transcript":"   "}]}]}"#;
        let parsed: RecognizeResponse = serde_json::from_str(json).unwrap();
        let (text, confidence) = parsed.flatten();
        assert!(text.is_empty());
        assert!(confidence.is_empty());
    }

    #[test]
    fn name_is_watson() {
        assert_eq!(adapter().name(), "watson");
    }
}
