//! Provider-agnostic speech-to-text contract and backend adapters.
//!
//! Every backend implements [`SpeechToText`] over the same normalized
//! request/transcript/error shapes, so the gateway orchestrates one contract
//! regardless of which remote provider is configured.

pub mod error;
pub mod http;
pub mod mime;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod payload;
pub mod provider;
pub mod refine;
pub mod request;
pub mod watson;

pub use error::TranscribeError;
pub use payload::AudioPayload;
pub use provider::SpeechToText;
pub use refine::TranscriptRefiner;
pub use request::{NormalizedTranscript, ResponseDetail, TranscriptionRequest};
