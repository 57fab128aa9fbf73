//! URL modeling and filename derivation.
//!
//! Derives safe local filenames from image URLs, maps MIME types to
//! extensions, and decodes inline `data:` URLs.

mod data_url;
mod mime;
mod path;
mod sanitize;

pub use data_url::{decode_data_url, is_data_url, DataUrlError};
pub use mime::{choose_extension, extension_for_mime, has_image_extension, is_image_content_type};
pub use path::filename_from_url_path;
pub use sanitize::{sanitize_filename, DEFAULT_STEM};

/// Derives the on-disk filename for an image URL: sanitized last path segment
/// with its extension replaced by [`choose_extension`].
///
/// # Examples
///
/// - `derive_filename("https://cdn.example.com/a/cat.jpeg", Some("image/jpeg"))` → `"cat.jpg"`
/// - `derive_filename("https://example.com/", None)` → `"image.bin"`
pub fn derive_filename(url: &str, content_type: Option<&str>) -> String {
    let raw = filename_from_url_path(url).unwrap_or_default();
    let sanitized = sanitize_filename(&raw);
    let ext = choose_extension(&sanitized, content_type);
    format!("{}{}", file_stem(&sanitized), ext)
}

/// Name without its extension (`"a.b.jpg"` → `"a.b"`; dotfiles keep their name).
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

/// Lowercased extension including the dot, or `""`.
pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(i) if i > 0 && i + 1 < name.len() => name[i..].to_ascii_lowercase(),
        _ => String::new(),
    }
}
