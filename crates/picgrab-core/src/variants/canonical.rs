//! Canonicalization: mapping every variant URL of an image onto one key.

use super::hint::{PIN_DIR_RE, SIZE_SUFFIX_RE};

/// Stand-in directory for pinned-size segments.
pub const ORIGINALS_SEGMENT: &str = "/originals/";

/// Replace every pinned-size directory (`/236x/`) with `/originals/`.
pub fn rewrite_pinned(path: &str) -> String {
    PIN_DIR_RE.replace_all(path, ORIGINALS_SEGMENT).into_owned()
}

pub fn is_original_path(path: &str) -> bool {
    path.contains(ORIGINALS_SEGMENT)
}

/// Canonical key for a URL path: pinned segments rewritten, last component
/// taken, trailing `-WxH` size suffixes stripped, lowercased.
/// Pure and idempotent.
pub fn canonical_key(path: &str) -> String {
    let rewritten = rewrite_pinned(path);
    let mut name = rewritten
        .rsplit('/')
        .next()
        .unwrap_or(&rewritten)
        .to_string();
    loop {
        let stripped = SIZE_SUFFIX_RE.replace(&name, ".$3").into_owned();
        if stripped == name {
            break;
        }
        name = stripped;
    }
    name.to_lowercase()
}
