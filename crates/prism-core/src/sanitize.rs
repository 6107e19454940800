//! Message sanitization for caller-visible output
//!
//! Everything echoed back to an API consumer, upstream error messages
//! in particular, passes through [`redact`] first, so credentials and
//! addresses that leak into upstream errors never reach callers.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder substituted for email addresses
pub const EMAIL_PLACEHOLDER: &str = "[EMAIL_REDACTED]";

/// Placeholder substituted for token- or key-shaped substrings
pub const TOKEN_PLACEHOLDER: &str = "[TOKEN_REDACTED]";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email pattern")
});

/// Bearer tokens, vendor-prefixed API keys, and long opaque secrets
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:bearer\s+[A-Za-z0-9._~+/=-]{8,}|sk-[A-Za-z0-9_-]{8,}|[A-Za-z0-9_-]{32,})")
        .expect("valid token pattern")
});

/// Redact emails and token/key-shaped substrings with fixed placeholders
pub fn redact(message: &str) -> String {
    let message = EMAIL_RE.replace_all(message, EMAIL_PLACEHOLDER);
    TOKEN_RE.replace_all(&message, TOKEN_PLACEHOLDER).into_owned()
}

/// Strip control characters from text content
///
/// Removes \x00–\x1F (keeping newline and tab) and \x7F.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || c == '\t' || (c != '\x7f' && !c.is_control()))
        .collect()
}

/// Whether text carries template-injection or script markers
///
/// Detects `{{`/`}}` template markers, `<script` tags, and
/// `javascript:` URIs.
pub fn contains_injection(text: &str) -> bool {
    let lowered = text.to_lowercase();
    text.contains("{{") || text.contains("}}") || lowered.contains("<script") || lowered.contains("javascript:")
}
