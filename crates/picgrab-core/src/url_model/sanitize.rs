//! Filesystem-safe filename sanitization (portable across Windows and Linux).

/// Placeholder used when nothing usable is left of a name.
pub const DEFAULT_STEM: &str = "image";

const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename.
///
/// - Drops anything from the first `?` or `#`
/// - Replaces `< > : " / \ | ? *` and control characters with `_`
/// - Trims leading/trailing spaces and dots
/// - Limits length to 255 bytes
/// - Returns [`DEFAULT_STEM`] if the result is empty
pub fn sanitize_filename(name: &str) -> String {
    let name = name.split(['?', '#']).next().unwrap_or("");

    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');

    let limited = if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        &trimmed[..take]
    } else {
        trimmed
    };

    if limited.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        limited.to_string()
    }
}
