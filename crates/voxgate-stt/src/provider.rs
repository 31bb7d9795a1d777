use std::future::Future;
use std::pin::Pin;

use crate::error::TranscribeError;
use crate::request::{NormalizedTranscript, TranscriptionRequest};

pub type TranscribeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<NormalizedTranscript, TranscribeError>> + Send + 'a>>;

/// Async trait for speech-to-text backends.
///
/// Implementations translate the normalized request into their provider's
/// wire shape and translate the reply or fault back; no provider-specific
/// error type may escape.
pub trait SpeechToText: Send + Sync {
    /// Transcribe the request's audio payload into text.
    ///
    /// # Errors
    ///
    /// Returns a [`TranscribeError`] when the provider rejects the request,
    /// cannot be reached, or replies with something unparseable.
    fn transcribe<'a>(&'a self, req: &'a TranscriptionRequest) -> TranscribeFuture<'a>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}
