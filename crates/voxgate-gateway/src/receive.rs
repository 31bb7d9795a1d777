use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use tokio::io::AsyncWriteExt;
use voxgate_stt::{AudioPayload, TranscribeError};

/// Multipart field the audio clip must arrive under.
pub(crate) const AUDIO_FIELD: &str = "audio";

/// Upload size window enforced before any provider dispatch.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: u64,
    /// Recorder glitches produce near-empty clips; rejecting them here
    /// saves a pointless provider round-trip.
    pub min_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
            min_bytes: 100,
        }
    }
}

/// Decode the multipart body into an audio payload spooled to disk.
///
/// The ceiling is checked while streaming, so an oversized upload fails
/// without being fully written. The returned payload's spool is the
/// caller's to release.
pub(crate) async fn receive(
    multipart: &mut Multipart,
    limits: UploadLimits,
) -> Result<AudioPayload, TranscribeError> {
    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let declared_mime = field.content_type().map(ToOwned::to_owned);

        let spool = tempfile::Builder::new()
            .prefix("voxgate-")
            .suffix(".audio")
            .tempfile()
            .map_err(|e| TranscribeError::Internal(format!("audio spool create failed: {e}")))?;
        let (file, path) = spool.into_parts();
        let mut writer = tokio::fs::File::from_std(file);

        let mut written: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            written += chunk.len() as u64;
            if written > limits.max_bytes {
                return Err(TranscribeError::PayloadTooLarge {
                    limit: limits.max_bytes,
                });
            }
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| TranscribeError::Internal(format!("audio spool write failed: {e}")))?;
        }
        writer
            .flush()
            .await
            .map_err(|e| TranscribeError::Internal(format!("audio spool flush failed: {e}")))?;
        drop(writer);

        if written < limits.min_bytes {
            return Err(TranscribeError::MalformedUpload(format!(
                "audio part is {written} bytes, below the {}-byte minimum",
                limits.min_bytes
            )));
        }
        return Ok(AudioPayload::new(path, written, declared_mime, AUDIO_FIELD));
    }

    Err(TranscribeError::MissingPayload)
}

fn malformed(e: MultipartError) -> TranscribeError {
    TranscribeError::MalformedUpload(e.to_string())
}
