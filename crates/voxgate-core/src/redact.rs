use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Token prefixes that mark a provider credential wherever they appear.
const SECRET_PREFIXES: &[&str] = &["sk-", "ibm-", "apikey:"];

// One alternation so a single pass covers every prefix.
static SECRET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = SECRET_PREFIXES.join("|");
    let full = format!("(?:{pattern})[^\\s\"'`,;{{}}\\[\\]]*");
    Regex::new(&full).expect("secret redaction regex is valid")
});

/// Replace tokens carrying known credential prefixes with `[REDACTED]`.
///
/// Covers secrets echoed back inside provider error bodies. Returns
/// `Cow::Borrowed` when nothing matches.
#[must_use]
pub fn scrub_secrets(text: &str) -> Cow<'_, str> {
    if !SECRET_PREFIXES.iter().any(|p| text.contains(p)) {
        return Cow::Borrowed(text);
    }
    SECRET_REGEX.replace_all(text, "[REDACTED]")
}

/// Replace every occurrence of a known credential value with `[REDACTED]`.
///
/// Watson keys carry no recognizable prefix, so callers holding the actual
/// credential scrub it by value before logging provider output.
#[must_use]
pub fn scrub_value<'a>(text: &'a str, secret: &str) -> Cow<'a, str> {
    if secret.is_empty() || !text.contains(secret) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace(secret, "[REDACTED]"))
}
