//! Declared-MIME normalization.
//!
//! The content type a browser attaches to a recorded clip is untrusted: it
//! may be missing, generic (`application/octet-stream`), or carry codec
//! suffixes providers choke on. Forwarding it verbatim makes the remote
//! decoder reject the clip, so the declared value is only a hint matched
//! against a bounded substring table with a safe container default.

/// Safe default: browser recorders overwhelmingly produce WebM/Opus.
pub const FALLBACK: &str = "audio/webm";

// Substring → provider-accepted content type. Order matters: earlier
// entries win, so container names come before codec aliases.
const TABLE: &[(&str, &str)] = &[
    ("webm", "audio/webm"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/ogg"),
    ("wav", "audio/wav"),
    ("wave", "audio/wav"),
    ("mpeg", "audio/mpeg"),
    ("mp3", "audio/mpeg"),
    ("mpga", "audio/mpeg"),
    ("mp4", "audio/mp4"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/mp4"),
    ("flac", "audio/flac"),
];

/// Map a declared MIME type to a provider-accepted content type.
#[must_use]
pub fn normalize(declared: Option<&str>) -> &'static str {
    let Some(declared) = declared else {
        return FALLBACK;
    };
    let declared = declared.to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(marker, _)| declared.contains(marker))
        .map_or(FALLBACK, |(_, normalized)| normalized)
}

/// File extension matching a normalized content type. Whisper infers the
/// container format from the uploaded filename, so the extension must agree
/// with the content type.
#[must_use]
pub fn extension(content_type: &str) -> &'static str {
    match content_type {
        "audio/ogg" => "ogg",
        "audio/wav" => "wav",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/flac" => "flac",
        _ => "webm",
    }
}

/// Synthetic filename for the multipart file part.
#[must_use]
pub fn filename(content_type: &str) -> String {
    format!("audio.{}", extension(content_type))
}
