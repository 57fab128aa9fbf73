//! Image MIME types and extension choice.

use once_cell::sync::Lazy;
use regex::Regex;

const MIME_TO_EXT: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/avif", ".avif"),
    ("image/svg+xml", ".svg"),
    ("image/bmp", ".bmp"),
    ("image/tiff", ".tif"),
];

static IMAGE_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(png|jpe?g|gif|webp|avif|svg|bmp|tiff?)$").unwrap());

/// Media type without parameters, lowercased (`"Image/PNG; q=1"` → `"image/png"`).
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Extension (with dot) for a known image MIME type.
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let essence = essence(content_type);
    MIME_TO_EXT
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// True for any `image/*` content type.
pub fn is_image_content_type(content_type: &str) -> bool {
    essence(content_type).starts_with("image/")
}

/// True if the filename ends in a recognized image extension.
pub fn has_image_extension(filename: &str) -> bool {
    IMAGE_EXT_RE.is_match(filename)
}

/// Final extension for a file: the content type's extension when it is known
/// and disagrees with the filename, otherwise the filename's own extension,
/// `.bin` when neither yields one.
pub fn choose_extension(filename: &str, content_type: Option<&str>) -> String {
    let own = super::file_extension(filename);
    let guessed = content_type.and_then(extension_for_mime);
    match guessed {
        Some(g) if own != g => g.to_string(),
        _ if own.is_empty() => ".bin".to_string(),
        _ => own,
    }
}
