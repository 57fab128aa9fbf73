//! Deduplicated concurrent image downloader.
//!
//! Takes the resolved URL list, fetches each URL on a bounded worker pool,
//! runs every fetched body through one filter pipeline (minimum size,
//! extension allow-list, content-hash dedup) and writes survivors to the
//! output directory under collision-free names.

mod item;
mod options;
mod outcome;
mod run;
mod save;

pub use item::download_one;
pub use options::{AllowList, DownloadOptions, RefererPolicy};
pub use outcome::{ItemOutcome, ItemStatus, SkipReason};
pub use run::{download_all, DownloadSummary};
pub use save::{save_bytes, SaveContext};
