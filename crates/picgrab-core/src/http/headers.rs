//! Parse HTTP response header lines collected from libcurl.

/// Headers of the final response in a (possibly redirected) exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// Status code from the last `HTTP/x y` status line.
    pub status: Option<u32>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// Lowercased `Content-Type` value, parameters included.
    pub content_type: Option<String>,
}

/// Parse collected header lines. When redirects were followed the lines of
/// every hop are present; only the block after the last status line counts.
pub fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut out = ResponseHeaders::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(code) = parse_status_line(line) {
            out = ResponseHeaders {
                status: Some(code),
                ..ResponseHeaders::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                out.content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("content-type") {
                out.content_type = Some(value.to_ascii_lowercase());
            }
        }
    }

    out
}

/// `HTTP/1.1 200 OK` → `Some(200)`.
pub fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
