//! Download an update artifact and verify it before anything else touches it.

use std::path::{Path, PathBuf};

use super::error::UpdateError;
use super::manifest::PlatformAsset;
use super::version::Version;
use crate::checksum::{sha256_path, verify_path};
use crate::http::HttpClient;

/// Stream `asset` into a fresh file in the OS temp directory and check it
/// against the manifest digest (when one is given).
///
/// On download failure or digest mismatch the file is removed and an error is
/// returned; the caller must not attempt a replace. On success the file is
/// left in place (executable on Unix) and its path returned.
pub fn download_verified(
    client: &HttpClient,
    asset: &PlatformAsset,
    version: &Version,
    on_percent: &mut dyn FnMut(u8),
) -> Result<PathBuf, UpdateError> {
    let dest = tempfile::Builder::new()
        .prefix(&format!("picgrab_{}_", version))
        .suffix(std::env::consts::EXE_SUFFIX)
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|e| UpdateError::Io(e.error))?;
    tracing::info!(url = %asset.url, dest = %dest.display(), "downloading update");

    if let Err(e) = client.download_to_file(&asset.url, &dest, client.timeouts().update, on_percent) {
        discard(&dest);
        return Err(UpdateError::Download(e));
    }

    if let Some(expected) = asset.expected_sha256() {
        match verify_path(&dest, &expected) {
            Ok(true) => {}
            Ok(false) => {
                let actual = sha256_path(&dest).unwrap_or_default();
                discard(&dest);
                tracing::warn!(%expected, %actual, "update checksum mismatch");
                return Err(UpdateError::ChecksumMismatch { expected, actual });
            }
            Err(e) => {
                discard(&dest);
                return Err(UpdateError::Checksum(e));
            }
        }
    }

    mark_executable(&dest)?;
    Ok(dest)
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), "could not remove update artifact: {}", e);
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
