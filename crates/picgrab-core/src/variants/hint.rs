//! Size hints: where a candidate URL tells us how big the image is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use url::Url;

/// Estimated pixel dimensions of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeHint {
    pub width: u32,
    pub height: u32,
}

impl SizeHint {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Hints gathered by the extractor, keyed by resolved URL. Passed explicitly
/// from extraction to resolution and dropped with the run.
pub type HintTable = HashMap<String, SizeHint>;

/// `-<W>x<H>` right before a known image extension at the end of a file name.
pub(crate) static SIZE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)-(\d{2,5})x(\d{2,5})\.(jpe?g|png|webp|gif|avif|bmp|tiff?)$").unwrap()
});

/// A `/<N>x/` directory pinning the served width.
pub(crate) static PIN_DIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{2,5})x/").unwrap());

static QUERY_PAIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2,5})[x,](\d{2,5})").unwrap());

const PAIR_KEYS: &[&str] = &["fit", "resize", "size", "dim", "dimensions"];
const WIDTH_KEYS: &[&str] = &["w", "width", "maxwidth", "maxw"];
const HEIGHT_KEYS: &[&str] = &["h", "height", "maxheight", "maxh"];

/// Hint from the path: a `-WxH` file-name suffix, else a pinned `/Nx/` directory.
pub fn size_from_path(path: &str) -> Option<SizeHint> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if let Some(c) = SIZE_SUFFIX_RE.captures(file_name) {
        return Some(SizeHint::new(c[1].parse().ok()?, c[2].parse().ok()?));
    }
    let c = PIN_DIR_RE.captures(path)?;
    Some(SizeHint::square(c[1].parse().ok()?))
}

/// Hint from the query string. A pair key (`fit=800,600`, `resize=800x600`)
/// wins; otherwise width/height keys, with a square assumed when only one of
/// them is present.
pub fn size_from_query(url: &Url) -> Option<SizeHint> {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    let first = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

    for key in PAIR_KEYS {
        if let Some(raw) = first(key) {
            if let Some(c) = QUERY_PAIR_RE.captures(&raw.to_ascii_lowercase()) {
                if let (Ok(w), Ok(h)) = (c[1].parse(), c[2].parse()) {
                    return Some(SizeHint::new(w, h));
                }
            }
        }
    }

    let leading_int = |key: &str| -> Option<u32> {
        let raw = first(key)?;
        let head = raw.split(',').next()?.split('x').next()?;
        head.trim().parse().ok().filter(|n| *n > 0)
    };
    let w = WIDTH_KEYS.iter().find_map(|k| leading_int(k));
    let h = HEIGHT_KEYS.iter().find_map(|k| leading_int(k));
    match (w, h) {
        (Some(w), Some(h)) => Some(SizeHint::new(w, h)),
        (Some(e), None) | (None, Some(e)) => Some(SizeHint::square(e)),
        (None, None) => None,
    }
}
