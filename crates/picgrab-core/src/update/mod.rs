//! Self-update: manifest check, verified download, detached atomic replace.
//!
//! The running executable cannot replace itself while it is mapped (and on
//! Windows, locked). [`apply_update`] writes a small helper script that keeps
//! retrying the copy until the old process has exited, relaunches the new
//! binary and cleans up after itself. The caller exits right after launching it.

mod error;
mod fetch;
mod manifest;
mod replace;
mod version;

pub use error::UpdateError;
pub use fetch::download_verified;
pub use manifest::{check_for_update, current_platform, evaluate, Manifest, PlatformAsset, UpdateCheck};
pub use replace::{
    apply_update, platform_strategy, write_helper_script, ReplaceStrategy, UnixShell,
    WindowsBatch, REPLACE_ATTEMPTS,
};
pub use version::Version;
