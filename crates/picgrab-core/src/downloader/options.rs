//! Per-run downloader settings.

use std::path::PathBuf;
use url::Url;

use crate::config::{clamp_workers, GrabConfig};

/// Extensions a saved file may carry. Empty means "anything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// Parse a comma-separated list (`"jpg, .PNG,webp"`): case-insensitive,
    /// leading dots and blanks ignored.
    pub fn parse(list: &str) -> Self {
        let mut exts: Vec<String> = Vec::new();
        for raw in list.split(',') {
            let ext = raw.trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() && !exts.contains(&ext) {
                exts.push(ext);
            }
        }
        Self(exts)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `ext` is lowercase without the dot. A file with no extension passes.
    pub fn permits(&self, ext: &str) -> bool {
        self.0.is_empty() || ext.is_empty() || self.0.iter().any(|e| e == ext)
    }
}

/// How the `Referer` header of image requests is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefererPolicy {
    /// Sent as-is when set.
    pub explicit: Option<String>,
    /// Use `scheme://host/` of the originating page.
    pub auto_from_page: bool,
    /// With nothing else configured, send the image's own URL.
    pub same_url_fallback: bool,
}

impl Default for RefererPolicy {
    fn default() -> Self {
        Self {
            explicit: None,
            auto_from_page: true,
            same_url_fallback: true,
        }
    }
}

impl RefererPolicy {
    /// Referer derived from the page, before the per-image fallback.
    pub fn for_page(&self, page_url: &str) -> Option<String> {
        if let Some(r) = self.explicit.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return Some(r.to_string());
        }
        if !self.auto_from_page {
            return None;
        }
        let u = Url::parse(page_url).ok()?;
        let host = u.host_str()?;
        Some(match u.port() {
            Some(port) => format!("{}://{}:{}/", u.scheme(), host, port),
            None => format!("{}://{}/", u.scheme(), host),
        })
    }

    /// Referer for one image given the page-level choice.
    pub fn for_image(&self, page_referer: Option<&str>, image_url: &str) -> Option<String> {
        match page_referer {
            Some(r) => Some(r.to_string()),
            None if self.same_url_fallback => Some(image_url.to_string()),
            None => None,
        }
    }
}

/// Everything the downloader needs for one run.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub allow_extensions: AllowList,
    pub min_bytes: u64,
    pub accept_data_urls: bool,
    pub referer: RefererPolicy,
    pub workers: usize,
}

impl DownloadOptions {
    /// Options from the `[grab]` config section; `output_dir` falls back to `./images`.
    pub fn from_config(cfg: &GrabConfig) -> Self {
        Self {
            output_dir: cfg
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("images")),
            allow_extensions: AllowList::parse(&cfg.allowed_extensions),
            min_bytes: cfg.min_bytes,
            accept_data_urls: cfg.accept_data_urls,
            referer: RefererPolicy {
                explicit: cfg.referer.clone(),
                auto_from_page: cfg.auto_referer,
                same_url_fallback: true,
            },
            workers: clamp_workers(cfg.workers),
        }
    }
}
