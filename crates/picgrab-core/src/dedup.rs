//! Run-scoped set of content digests already written to disk.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::checksum::sha256_bytes;

/// Seen-hash set shared by every download worker of one run (wrap in `Arc`).
#[derive(Debug, Default)]
pub struct SeenHashes {
    seen: Mutex<HashSet<String>>,
}

impl SeenHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the digest of `bytes`. Returns `true` if it was not seen before
    /// in this run. The digest is computed outside the lock; the lock covers
    /// only the check-and-insert.
    pub fn insert_if_new(&self, bytes: &[u8]) -> bool {
        let digest = sha256_bytes(bytes);
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.insert(digest)
    }

    /// Drop the digest of `bytes` again, after its write failed, so a later
    /// copy of the same content can still be saved.
    pub fn forget(&self, bytes: &[u8]) -> bool {
        let digest = sha256_bytes(bytes);
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.remove(&digest)
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .map(|s| s.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
