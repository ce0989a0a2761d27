//! JSON payloads accepted by the API, validated before they reach the ledger.

pub mod batches;
pub mod permissions;
pub mod stock;

/// Maximum length of a free-text note attached to a ledger entry.
pub(crate) const NOTE_MAX_LEN: usize = 512;
pub(crate) const NOTE_MAX_LEN_VALIDATOR: u64 = NOTE_MAX_LEN as u64;

/// Maximum length of a client supplied idempotency key.
pub(crate) const REQUEST_KEY_MAX_LEN_VALIDATOR: u64 = 64;

/// Collapse runs of whitespace and drop control characters.
pub(crate) fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

/// Sanitized optional text; blank input becomes `None`.
pub(crate) fn clean_optional(input: Option<String>) -> Option<String> {
    input
        .map(|value| sanitize_inline_text(&value))
        .filter(|value| !value.is_empty())
}
