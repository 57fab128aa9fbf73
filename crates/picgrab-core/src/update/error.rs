use crate::retry::FetchError;

/// Failures of the update flow. None of them affect the running process.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("could not fetch update manifest: {0}")]
    ManifestFetch(#[source] FetchError),
    #[error("invalid update manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),
    #[error("manifest has no {platform} download for version {version}")]
    NoAsset {
        platform: &'static str,
        version: String,
    },
    #[error("update download failed: {0}")]
    Download(#[source] FetchError),
    #[error("checksum mismatch (manifest {expected}, downloaded {actual})")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("could not hash downloaded file: {0:#}")]
    Checksum(anyhow::Error),
    #[error("could not start update helper: {0}")]
    Apply(#[source] std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
