//! Candidate image discovery in static HTML.
//!
//! The page is parsed as markup only (no scripts run). Sources considered:
//! `<img>` primary and lazy-load attributes, `srcset` on `<img>`/`<source>`,
//! `url(...)` inside `style` attributes, and `<a href>` targets that end in an
//! image extension. Relative URLs are resolved against the page URL; data URLs
//! pass through untouched.

mod srcset;

pub use srcset::{parse_srcset, SrcsetEntry};

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::url_model::is_data_url;
use crate::variants::HintTable;

/// `<img>` attributes that may carry the image URL directly.
pub const IMG_SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-original", "data-lazy", "data-lazy-src"];

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static SRCSET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[srcset], source[srcset]").unwrap());
static STYLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("[style]").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

static STYLE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"]*))\s*\)"#).unwrap()
});
static LINK_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|avif|svg|bmp|tiff?)(\?|#|$)").unwrap()
});

/// Candidates found on one page, plus the size hints their descriptors gave.
#[derive(Debug, Default, Clone)]
pub struct PageImages {
    /// Resolved candidate URLs, duplicates collapsed, first-seen order.
    pub urls: Vec<String>,
    /// Hints from `srcset` descriptors, keyed by resolved URL.
    pub hints: HintTable,
}

impl PageImages {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    fn push(&mut self, seen: &mut HashSet<String>, url: String) {
        if seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }
}

/// Resolve one attribute value against the page. Data URLs are returned as-is;
/// anything that does not end up as http(s) is dropped.
pub fn resolve_candidate(base: Option<&Url>, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if is_data_url(raw) {
        return Some(raw.to_string());
    }
    let joined = match base {
        Some(b) => b.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}

/// Extract candidate image URLs from `html`. Never fails: unparsable pieces
/// are skipped and an empty result means "no images on this page".
pub fn extract(html: &str, base_url: &str) -> PageImages {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();
    let base = base.as_ref();
    let mut out = PageImages::default();
    let mut seen = HashSet::new();

    for img in document.select(&IMG_SELECTOR) {
        for attr in IMG_SOURCE_ATTRS {
            if let Some(url) = img.value().attr(attr).and_then(|v| resolve_candidate(base, v)) {
                out.push(&mut seen, url);
            }
        }
    }

    for el in document.select(&SRCSET_SELECTOR) {
        let Some(srcset) = el.value().attr("srcset") else {
            continue;
        };
        for entry in parse_srcset(srcset) {
            let Some(url) = resolve_candidate(base, &entry.url) else {
                continue;
            };
            if let Some(hint) = entry.hint {
                out.hints.insert(url.clone(), hint);
            }
            out.push(&mut seen, url);
        }
    }

    for el in document.select(&STYLE_SELECTOR) {
        let Some(style) = el.value().attr("style") else {
            continue;
        };
        for raw in style_urls(style) {
            if let Some(url) = resolve_candidate(base, raw) {
                out.push(&mut seen, url);
            }
        }
    }

    for a in document.select(&LINK_SELECTOR) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if !is_data_url(href) && !LINK_IMAGE_RE.is_match(href) {
            continue;
        }
        if let Some(url) = resolve_candidate(base, href) {
            out.push(&mut seen, url);
        }
    }

    tracing::debug!(
        page = base_url,
        candidates = out.urls.len(),
        hints = out.hints.len(),
        "extracted image candidates"
    );
    out
}

/// `url(...)` references in an inline style, quotes removed.
pub fn style_urls(style: &str) -> Vec<&str> {
    STYLE_URL_RE
        .captures_iter(style)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}
