use std::fmt;
use std::io;
use std::path::Path;

use tempfile::TempPath;

/// A received audio clip spooled to temporary storage.
///
/// The payload is created once per request by the upload receiver and owned
/// by the gateway for the request's duration. Releasing the spooled file is
/// the gateway's job, not the receiver's; [`AudioPayload::release`] is
/// best-effort and `Drop` is the backstop, so the file cannot outlive the
/// request even on a panic path.
pub struct AudioPayload {
    spool: Option<TempPath>,
    len: u64,
    declared_mime: Option<String>,
    field: String,
}

impl AudioPayload {
    #[must_use]
    pub fn new(
        spool: TempPath,
        len: u64,
        declared_mime: Option<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            spool: Some(spool),
            len,
            declared_mime,
            field: field.into(),
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Declared MIME type from the upload. Untrusted; adapters normalize it
    /// through the fallback table before forwarding anything.
    #[must_use]
    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    /// Multipart field name the audio arrived under.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Location of the spooled bytes, or `None` once released.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.spool.as_deref()
    }

    /// Read the spooled audio bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload was already released or the spool
    /// file cannot be read.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        let Some(path) = self.path() else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "audio payload already released",
            ));
        };
        tokio::fs::read(path).await
    }

    /// Delete the spooled file. Idempotent; removal failures are logged and
    /// swallowed so cleanup never overrides the request outcome.
    pub fn release(&mut self) {
        if let Some(spool) = self.spool.take()
            && let Err(e) = spool.close()
        {
            tracing::warn!(error = %e, "failed to remove spooled audio payload");
        }
    }
}

impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPayload")
            .field("len", &self.len)
            .field("declared_mime", &self.declared_mime)
            .field("field", &self.field)
            .field("released", &self.spool.is_none())
            .finish()
    }
}
