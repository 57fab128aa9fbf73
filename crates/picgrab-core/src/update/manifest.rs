//! Remote version manifest.

use serde::Deserialize;

use super::error::UpdateError;
use super::version::Version;
use crate::http::HttpClient;

/// Download location of one platform's build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformAsset {
    pub url: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

impl PlatformAsset {
    /// Expected digest, lowercased; `None` when absent or blank.
    pub fn expected_sha256(&self) -> Option<String> {
        self.sha256
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }
}

/// `{"version": "2.0.0", "windows": {"url": "...", "sha256": "..."}, ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub windows: Option<PlatformAsset>,
    #[serde(default)]
    pub linux: Option<PlatformAsset>,
    #[serde(default)]
    pub macos: Option<PlatformAsset>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

/// Manifest key for the platform this binary was built for.
pub const fn current_platform() -> &'static str {
    if cfg!(windows) {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    }
}

impl Manifest {
    /// Parse manifest JSON; a leading BOM is tolerated.
    pub fn parse(text: &str) -> Result<Self, UpdateError> {
        Ok(serde_json::from_str(text.trim_start_matches('\u{feff}'))?)
    }

    pub fn version(&self) -> Version {
        Version::parse(&self.version)
    }

    pub fn asset_for(&self, platform: &str) -> Option<&PlatformAsset> {
        let asset = match platform {
            "windows" => self.windows.as_ref(),
            "macos" => self.macos.as_ref(),
            "linux" => self.linux.as_ref(),
            _ => None,
        };
        asset.filter(|a| !a.url.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    UpToDate { latest: Version },
    Available { version: Version, asset: PlatformAsset },
}

/// Decide from an already-fetched manifest.
pub fn evaluate(manifest: &Manifest, current: &str, platform: &'static str) -> Result<UpdateCheck, UpdateError> {
    let latest = manifest.version();
    if !latest.is_newer_than(&Version::parse(current)) {
        return Ok(UpdateCheck::UpToDate { latest });
    }
    let asset = manifest
        .asset_for(platform)
        .cloned()
        .ok_or_else(|| UpdateError::NoAsset {
            platform,
            version: latest.to_string(),
        })?;
    Ok(UpdateCheck::Available {
        version: latest,
        asset,
    })
}

/// Fetch the manifest and compare it with `current`. A fetch or parse failure
/// aborts the check; nothing is offered.
pub fn check_for_update(
    client: &HttpClient,
    manifest_url: &str,
    current: &str,
) -> Result<UpdateCheck, UpdateError> {
    let text = client
        .get_text(manifest_url, client.timeouts().manifest)
        .map_err(UpdateError::ManifestFetch)?;
    let manifest = Manifest::parse(&text)?;
    let check = evaluate(&manifest, current, current_platform())?;
    tracing::info!(current, latest = %manifest.version(), "update check done");
    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\u{feff}{\"version\": \"2.0.0\", \"windows\": {\"url\": \"https://dl.test/app.exe\", \"sha256\": \" ABCDEF \"}, \"linux\": {\"url\": \"https://dl.test/app\"}}";

    #[test]
    fn parses_with_bom_and_optional_fields() {
        let m = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(m.version(), Version(2, 0, 0));
        assert_eq!(m.windows.as_ref().unwrap().expected_sha256().as_deref(), Some("abcdef"));
        assert_eq!(m.linux.as_ref().unwrap().expected_sha256(), None);
        assert!(m.asset_for("macos").is_none());
    }

    #[test]
    fn newer_version_is_offered() {
        let m = Manifest::parse(MANIFEST).unwrap();
        match evaluate(&m, "1.0.3", "windows").unwrap() {
            UpdateCheck::Available { version, asset } => {
                assert_eq!(version, Version(2, 0, 0));
                assert_eq!(asset.url, "https://dl.test/app.exe");
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn older_or_equal_version_is_not_offered() {
        let m = Manifest::parse(r#"{"version": "1.0.0", "windows": {"url": "u"}}"#).unwrap();
        assert_eq!(
            evaluate(&m, "1.0.3", "windows").unwrap(),
            UpdateCheck::UpToDate { latest: Version(1, 0, 0) }
        );
        let same = Manifest::parse(r#"{"version": "1.0.3"}"#).unwrap();
        assert!(matches!(evaluate(&same, "1.0.3", "linux").unwrap(), UpdateCheck::UpToDate { .. }));
    }

    #[test]
    fn missing_platform_asset_is_an_error() {
        let m = Manifest::parse(MANIFEST).unwrap();
        let err = evaluate(&m, "1.0.3", "macos").unwrap_err();
        assert!(matches!(err, UpdateError::NoAsset { platform: "macos", .. }));
    }

    #[test]
    fn garbage_manifest_is_rejected() {
        assert!(matches!(Manifest::parse("<html>"), Err(UpdateError::ManifestParse(_))));
    }
}
