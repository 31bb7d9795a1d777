//! Optional LLM post-correction stage composed after transcription.
//!
//! Refinement has its own failure mode: the gateway degrades to the
//! unrefined transcript when this stage errors, it never fails the request.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::{TranscribeError, detail_from_body};

pub type RefineFuture<'a> = Pin<Box<dyn Future<Output = Result<String, TranscribeError>> + Send + 'a>>;

/// Post-correction pass over a finished transcript.
pub trait TranscriptRefiner: Send + Sync {
    /// Return a corrected version of `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`TranscribeError`] when the refinement backend fails;
    /// callers treat this as non-fatal.
    fn refine<'a>(&'a self, text: &'a str, language: &'a str) -> RefineFuture<'a>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Chat-completions refiner pinned to deterministic decoding.
pub struct OpenAiRefiner {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiRefiner {
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

impl fmt::Debug for OpenAiRefiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiRefiner")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl TranscriptRefiner for OpenAiRefiner {
    fn refine<'a>(&'a self, text: &'a str, language: &'a str) -> RefineFuture<'a> {
        Box::pin(async move {
            let system = format!(
                "You correct speech-to-text transcripts in language '{language}'. \
                 Fix recognition and punctuation mistakes without changing the \
                 meaning. Reply with the corrected transcript only."
            );
            let body = ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: &system,
                    },
                    ChatMessage {
                        role: "user",
                        content: text,
                    },
                ],
                temperature: 0.0,
            };

            let url = format!("{}/chat/completions", self.base_url);
            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            let raw = resp
                .text()
                .await
                .map_err(|e| TranscribeError::ProviderUnavailable(e.to_string()))?;

            if !status.is_success() {
                tracing::warn!(%status, "refine request rejected");
                return Err(TranscribeError::ProviderRejected {
                    status: status.as_u16(),
                    detail: detail_from_body(&raw),
                });
            }

            let parsed: ChatResponse = serde_json::from_str(&raw)
                .map_err(|e| TranscribeError::Internal(format!("refine response parse: {e}")))?;
            parsed
                .choices
                .first()
                .map(|c| c.message.content.trim().to_owned())
                .ok_or_else(|| TranscribeError::Internal("refine response had no choices".into()))
        })
    }

    fn name(&self) -> &'static str {
        "openai-refine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refiner() -> OpenAiRefiner {
        OpenAiRefiner::new(
            reqwest::Client::new(),
            "sk-refine",
            "https://api.openai.com/v1/",
            "gpt-4o-mini",
        )
    }

    #[test]
    fn new_strips_trailing_slash() {
        assert_eq!(refiner().base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", refiner());
        assert!(!debug.contains("sk-refine"));
        assert!(debug.contains("gpt-4o-mini"));
    }

    #[test]
    fn chat_request_serialization() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "fix",
                },
                ChatMessage {
                    role: "user",
                    content: "bonjour",
                },
            ],
            temperature: 0.0,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"model\":\"gpt-4o-mini\""));
        assert!(json.contains("\"temperature\":0"));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn parse_chat_response() {
        let json = r#"{"choices":[{"message":{"content":" Bonjour, le monde. "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.trim(),
            "Bonjour, le monde."
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let r = OpenAiRefiner::new(
            reqwest::Client::new(),
            "sk-refine",
            "http://127.0.0.1:1",
            "gpt-4o-mini",
        );
        let err = r.refine("bonjour", "fr").await.unwrap_err();
        assert_eq!(err.kind(), "provider_unavailable");
    }
}
