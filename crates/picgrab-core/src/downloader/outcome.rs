//! Per-item results and their consumer-facing messages.

use std::fmt;
use std::path::PathBuf;

/// Why a body was not written. Skips are normal outcomes, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnImage { content_type: Option<String> },
    TooSmall { min_bytes: u64 },
    ExtensionNotAllowed,
    Duplicate,
    DataUrlsDisabled,
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnImage { content_type } => write!(
                f,
                "not an image ({})",
                content_type.as_deref().unwrap_or("no content-type")
            ),
            SkipReason::TooSmall { min_bytes } => write!(f, "smaller than {}B", min_bytes),
            SkipReason::ExtensionNotAllowed => write!(f, "extension not in allow-list"),
            SkipReason::Duplicate => write!(f, "duplicate content"),
            SkipReason::DataUrlsDisabled => write!(f, "data URLs disabled"),
            SkipReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Saved(PathBuf),
    /// Skipped; carries the file name the body would have had, when known.
    Skipped { reason: SkipReason, name: Option<String> },
    Failed(String),
}

/// Result of one unit of download work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub url: String,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn new(url: impl Into<String>, status: ItemStatus) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.status, ItemStatus::Saved(_))
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.status {
            ItemStatus::Skipped { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// One human-readable line for the consumer log.
    pub fn message(&self) -> String {
        match &self.status {
            ItemStatus::Saved(path) => format!("Saved: {}", path.display()),
            ItemStatus::Skipped { reason, name } => {
                format!("Skipped ({}): {}", reason, name.as_deref().unwrap_or(&self.url))
            }
            ItemStatus::Failed(err) => format!("Failed {}: {}", short_url(&self.url), err),
        }
    }
}

/// Data URLs can be megabytes long; keep log lines readable.
fn short_url(url: &str) -> String {
    const MAX: usize = 120;
    if url.len() <= MAX {
        return url.to_string();
    }
    let mut end = MAX;
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &url[..end])
}
