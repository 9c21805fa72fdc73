//! Text helpers shared by notifiers.

/// Longest response body kept in an error.
pub const MAX_BODY_LENGTH: usize = 500;

/// Truncates `s` to at most `max_chars` characters, appending a marker when
/// anything was cut. Never splits a multi-byte character.
pub fn truncate_chars(s: &str, max_chars: usize, marker: &str) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}{}", &s[..cut], marker),
    }
}
