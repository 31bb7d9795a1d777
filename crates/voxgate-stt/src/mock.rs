//! Test-only scriptable backends.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::TranscribeError;
use crate::provider::{SpeechToText, TranscribeFuture};
use crate::refine::{RefineFuture, TranscriptRefiner};
use crate::request::{NormalizedTranscript, TranscriptionRequest};

/// Deterministic stand-in for a remote speech-to-text backend.
///
/// Records every invocation and the spool path of every payload it saw, so
/// tests can assert dispatch counts and storage cleanup.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    transcripts: Arc<Mutex<Vec<NormalizedTranscript>>>,
    pub default_transcript: NormalizedTranscript,
    pub fail_unavailable: bool,
    pub fail_rejected: Option<u16>,
    /// Milliseconds to sleep before answering.
    pub delay_ms: u64,
    calls: Arc<AtomicUsize>,
    seen_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self {
            transcripts: Arc::new(Mutex::new(Vec::new())),
            default_transcript: NormalizedTranscript::plain("mock transcript"),
            fail_unavailable: false,
            fail_rejected: None,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
            seen_paths: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockAdapter {
    /// Queue of transcripts returned in order; the default transcript is
    /// returned once the queue drains.
    #[must_use]
    pub fn with_transcripts(transcripts: Vec<NormalizedTranscript>) -> Self {
        Self {
            transcripts: Arc::new(Mutex::new(transcripts)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn returning(transcript: NormalizedTranscript) -> Self {
        Self {
            default_transcript: transcript,
            ..Self::default()
        }
    }

    /// Every call fails as a transport-level fault.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            fail_unavailable: true,
            ..Self::default()
        }
    }

    /// Every call fails as a provider rejection with the given status.
    #[must_use]
    pub fn rejected(status: u16) -> Self {
        Self {
            fail_rejected: Some(status),
            ..Self::default()
        }
    }

    /// Sleep this long before answering; pairs with short gateway timeouts
    /// in tests.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Number of times `transcribe` was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Spool paths of every payload passed in, in invocation order.
    #[must_use]
    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths.lock().expect("mock lock poisoned").clone()
    }
}

impl SpeechToText for MockAdapter {
    fn transcribe<'a>(&'a self, req: &'a TranscriptionRequest) -> TranscribeFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(path) = req.payload().path() {
                self.seen_paths
                    .lock()
                    .expect("mock lock poisoned")
                    .push(path.to_path_buf());
            }

            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_unavailable {
                return Err(TranscribeError::ProviderUnavailable(
                    "mock transport failure".into(),
                ));
            }
            if let Some(status) = self.fail_rejected {
                return Err(TranscribeError::ProviderRejected {
                    status,
                    detail: None,
                });
            }

            let mut queue = self.transcripts.lock().expect("mock lock poisoned");
            if queue.is_empty() {
                Ok(self.default_transcript.clone())
            } else {
                Ok(queue.remove(0))
            }
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Deterministic stand-in for a refinement backend.
#[derive(Debug, Clone, Default)]
pub struct MockRefiner {
    /// Prepended to the input text so tests can observe the stage ran.
    pub prefix: String,
    pub fail: bool,
}

impl MockRefiner {
    #[must_use]
    pub fn prefixing(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fail: false,
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            prefix: String::new(),
            fail: true,
        }
    }
}

impl TranscriptRefiner for MockRefiner {
    fn refine<'a>(&'a self, text: &'a str, _language: &'a str) -> RefineFuture<'a> {
        Box::pin(async move {
            if self.fail {
                return Err(TranscribeError::ProviderUnavailable(
                    "mock refine failure".into(),
                ));
            }
            Ok(format!("{}{text}", self.prefix))
        })
    }

    fn name(&self) -> &'static str {
        "mock-refine"
    }
}
