//! Blocking HTTP client on libcurl.
//!
//! One easy handle per request, redirects followed, every call wrapped in the
//! injected [`RetryPolicy`]. Runs in the calling thread; the downloader calls
//! it from its worker threads and async consumers from `spawn_blocking`.

mod headers;
mod request;

pub use headers::{parse_headers, parse_status_line, ResponseHeaders};
pub use request::ImageResponse;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PicgrabConfig, TimeoutConfig, DEFAULT_USER_AGENT};
use crate::retry::RetryPolicy;

/// Distinct timeout for each kind of network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub page: Duration,
    pub head: Duration,
    pub image: Duration,
    pub manifest: Duration,
    pub update: Duration,
}

impl From<&TimeoutConfig> for Timeouts {
    fn from(cfg: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(cfg.connect_secs),
            page: Duration::from_secs(cfg.page_secs),
            head: Duration::from_secs(cfg.head_secs),
            image: Duration::from_secs(cfg.image_secs),
            manifest: Duration::from_secs(cfg.manifest_secs),
            update: Duration::from_secs(cfg.update_secs),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

/// Everything the client needs at construction time.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub timeouts: Timeouts,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Shared HTTP client. Cheap to clone; safe to use from many threads.
#[derive(Debug, Clone)]
pub struct HttpClient {
    opts: Arc<ClientOptions>,
}

impl HttpClient {
    pub fn new(opts: ClientOptions) -> Self {
        Self {
            opts: Arc::new(opts),
        }
    }

    pub fn from_config(cfg: &PicgrabConfig) -> Self {
        Self::new(ClientOptions {
            user_agent: cfg.user_agent.clone(),
            retry: cfg.retry_policy(),
            timeouts: Timeouts::from(&cfg.timeouts),
        })
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.opts.timeouts
    }

    /// Fresh easy handle with the shared settings applied.
    fn easy(&self, url: &str, timeout: Duration) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.opts.user_agent)?;
        easy.connect_timeout(self.opts.timeouts.connect)?;
        easy.timeout(timeout)?;
        Ok(easy)
    }
}
