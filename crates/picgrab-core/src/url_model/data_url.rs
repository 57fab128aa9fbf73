//! Inline `data:<mime>[;params],<payload>` URLs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

use super::mime::extension_for_mime;

static DATA_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^data:([^;,]+)?((?:;[^,]*)*),(.*)$").unwrap());

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data: URL")]
    Malformed,
    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

pub fn is_data_url(url: &str) -> bool {
    url.get(..5)
        .map(|p| p.eq_ignore_ascii_case("data:"))
        .unwrap_or(false)
}

/// Decode a data URL into its bytes and the extension for its MIME type
/// (`.bin` for unknown types).
pub fn decode_data_url(data_url: &str) -> Result<(Vec<u8>, &'static str), DataUrlError> {
    let caps = DATA_URL_RE.captures(data_url).ok_or(DataUrlError::Malformed)?;
    let mime = caps
        .get(1)
        .map(|m| m.as_str().trim().to_ascii_lowercase())
        .unwrap_or_default();
    let params = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let payload = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let raw = if params.split(';').any(|p| p.trim() == "base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| DataUrlError::Base64(e.to_string()))?
    } else {
        percent_decode_str(payload).collect::<Vec<u8>>()
    };

    Ok((raw, extension_for_mime(&mime).unwrap_or(".bin")))
}
