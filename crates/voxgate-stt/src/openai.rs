use std::fmt;

use serde::Deserialize;

use crate::error::{TranscribeError, detail_from_body};
use crate::mime;
use crate::provider::{SpeechToText, TranscribeFuture};
use crate::request::{NormalizedTranscript, ResponseDetail, TranscriptionRequest};

/// OpenAI Whisper-style backend: multipart upload to `/audio/transcriptions`.
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAdapter {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            api_key: api_key.into(),
            base_url,
            model: model.into(),
        }
    }
}

impl fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

#[derive(Deserialize)]
struct WhisperVerboseResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    avg_logprob: f32,
}

impl SpeechToText for OpenAiAdapter {
    fn transcribe<'a>(&'a self, req: &'a TranscriptionRequest) -> TranscribeFuture<'a> {
        Box::pin(async move {
            let audio = req
                .payload()
                .read()
                .await
                .map_err(|e| TranscribeError::Internal(format!("payload read failed: {e}")))?;

            let content_type = mime::normalize(req.payload().declared_mime());
            let part = reqwest::multipart::Part::bytes(audio)
                .file_name(mime::filename(content_type))
                .mime_str(content_type)
                .map_err(|e| TranscribeError::Internal(e.to_string()))?;

            let response_format = match req.detail() {
                ResponseDetail::Text => "json",
                ResponseDetail::Verbose => "verbose_json",
            };
            // Temperature pinned to the most deterministic setting; this is
            // transcription, not generation.
            let form = reqwest::multipart::Form::new()
                .text("model", self.model.clone())
                .text("language", req.language().to_owned())
                .text("temperature", "0")
                .text("response_format", response_format)
                .part("file", part);

            let url = format!("{}/audio/transcriptions", self.base_url);
            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await?;

            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| TranscribeError::ProviderUnavailable(e.to_string()))?;

            if !status.is_success() {
                tracing::error!(%status, "whisper request rejected");
                return Err(TranscribeError::ProviderRejected {
                    status: status.as_u16(),
                    detail: detail_from_body(&body),
                });
            }

            match req.detail() {
                ResponseDetail::Text => {
                    let parsed: WhisperResponse = serde_json::from_str(&body)
                        .map_err(|e| unparseable(status.as_u16(), &e))?;
                    Ok(NormalizedTranscript::plain(&parsed.text))
                }
                ResponseDetail::Verbose => {
                    let parsed: WhisperVerboseResponse = serde_json::from_str(&body)
                        .map_err(|e| unparseable(status.as_u16(), &e))?;
                    let mut transcript = NormalizedTranscript::plain(&parsed.text);
                    transcript.language = parsed.language;
                    if !parsed.segments.is_empty() {
                        // avg_logprob is a log probability; exp() gives a
                        // rough 0..1 confidence per segment.
                        transcript.confidence = Some(
                            parsed
                                .segments
                                .iter()
                                .map(|s| s.avg_logprob.exp().clamp(0.0, 1.0))
                                .collect(),
                        );
                    }
                    Ok(transcript)
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn unparseable(status: u16, e: &serde_json::Error) -> TranscribeError {
    TranscribeError::ProviderRejected {
        status,
        detail: Some(serde_json::json!({ "unparseable_response": e.to_string() })),
    }
}
