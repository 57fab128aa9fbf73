//! The single filter pipeline every fetched body goes through.

use std::path::Path;

use super::options::AllowList;
use super::outcome::{ItemStatus, SkipReason};
use crate::control::CancelToken;
use crate::dedup::SeenHashes;
use crate::storage::{bare_extension, write_unique};

/// Shared, read-only view of the run that `save_bytes` needs.
#[derive(Debug, Clone, Copy)]
pub struct SaveContext<'a> {
    pub output_dir: &'a Path,
    pub allow: &'a AllowList,
    pub min_bytes: u64,
    pub seen: &'a SeenHashes,
    pub cancel: &'a CancelToken,
}

/// Filter then write, in order: minimum size, extension allow-list,
/// content-hash dedup. Only a body that passes all three reaches the disk.
pub fn save_bytes(ctx: &SaveContext<'_>, bytes: &[u8], file_name: &str) -> ItemStatus {
    let skip = |reason| ItemStatus::Skipped {
        reason,
        name: Some(file_name.to_string()),
    };

    if ctx.min_bytes > 0 && (bytes.len() as u64) < ctx.min_bytes {
        return skip(SkipReason::TooSmall {
            min_bytes: ctx.min_bytes,
        });
    }
    if !ctx.allow.permits(&bare_extension(file_name)) {
        return skip(SkipReason::ExtensionNotAllowed);
    }
    if ctx.cancel.is_cancelled() {
        return skip(SkipReason::Cancelled);
    }
    if !ctx.seen.insert_if_new(bytes) {
        return skip(SkipReason::Duplicate);
    }
    match write_unique(ctx.output_dir, file_name, bytes) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved image");
            ItemStatus::Saved(path)
        }
        Err(e) => {
            ctx.seen.forget(bytes);
            ItemStatus::Failed(format!("{:#}", e))
        }
    }
}
