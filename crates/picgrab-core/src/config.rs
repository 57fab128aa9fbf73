use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Upper bound on download workers regardless of what the config asks for.
pub const MAX_WORKERS: usize = 32;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    /// Values too large for a `Duration` fall back to `max_delay_secs`.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// HTTP statuses that are retried.
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u32>,
}

fn default_retry_statuses() -> Vec<u32> {
    vec![429, 500, 502, 503, 504]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
            retry_statuses: default_retry_statuses(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::try_from_secs_f64(self.base_delay_secs.max(0.0))
                .unwrap_or(Duration::from_secs(self.max_delay_secs)),
            max_delay: Duration::from_secs(self.max_delay_secs),
            retry_statuses: self.retry_statuses.clone(),
        }
    }
}

/// Per-call network timeouts in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub page_secs: u64,
    pub head_secs: u64,
    pub image_secs: u64,
    pub manifest_secs: u64,
    pub update_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 15,
            page_secs: 25,
            head_secs: 10,
            image_secs: 20,
            manifest_secs: 10,
            update_secs: 60,
        }
    }
}

/// Defaults for a grab run; every field can be overridden per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrabConfig {
    /// Output directory (None = `./images` relative to the working directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Comma-separated extension allow-list; empty = allow everything.
    pub allowed_extensions: String,
    /// Bodies smaller than this many bytes are never written.
    pub min_bytes: u64,
    /// Save inline `data:` images.
    pub accept_data_urls: bool,
    /// Derive the Referer from the scheme and host of the first page.
    pub auto_referer: bool,
    /// Explicit Referer sent with every image request (wins over auto_referer).
    #[serde(default)]
    pub referer: Option<String>,
    /// Number of download workers (clamped to 1..=MAX_WORKERS).
    pub workers: usize,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            allowed_extensions: "jpg,png,webp,gif,avif".to_string(),
            min_bytes: 30_000,
            accept_data_urls: false,
            auto_referer: true,
            referer: None,
            workers: 8,
        }
    }
}

/// Self-update settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// URL of the JSON version manifest. Empty disables update checks.
    #[serde(default)]
    pub manifest_url: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            manifest_url: String::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/picgrab/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PicgrabConfig {
    /// User-Agent sent with every request.
    pub user_agent: String,
    #[serde(default)]
    pub grab: GrabConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub update: UpdateConfig,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119 Safari/537.36";

impl Default for PicgrabConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            grab: GrabConfig::default(),
            retry: None,
            timeouts: TimeoutConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

impl PicgrabConfig {
    /// Retry policy from the `[retry]` section or the built-in default.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }
}

/// Clamp a requested worker count to `1..=MAX_WORKERS`.
pub fn clamp_workers(n: usize) -> usize {
    n.clamp(1, MAX_WORKERS)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("picgrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PicgrabConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PicgrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PicgrabConfig = toml::from_str(&data)?;
    Ok(cfg)
}
