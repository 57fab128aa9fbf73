//! Collision-safe file creation in the output directory.
//!
//! The output directory is append-only during a run. Names are claimed with
//! `create_new`, so two workers racing on the same name can never both win
//! and an existing file is never overwritten.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::url_model::{file_extension, file_stem};

/// Upper bound on `_n` suffixes tried before giving up.
const MAX_SUFFIX: u32 = 100_000;

/// Candidate name for attempt `n`: `name` itself, then `stem_1.ext`, `stem_2.ext`, …
pub fn numbered_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    let stem = file_stem(file_name);
    let ext = &file_name[stem.len()..];
    format!("{}_{}{}", stem, n, ext)
}

/// Create a new file in `dir` named `file_name`, or the first free numbered
/// variant of it. Returns the open file and its path.
pub fn create_unique(dir: &Path, file_name: &str) -> io::Result<(File, PathBuf)> {
    for n in 0..=MAX_SUFFIX {
        let path = dir.join(numbered_name(file_name, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {} in {}", file_name, dir.display()),
    ))
}

/// Write `bytes` to a fresh, uniquely named file in `dir` and return its path.
pub fn write_unique(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let (mut file, path) = create_unique(dir, file_name)
        .with_context(|| format!("failed to create {} in {}", file_name, dir.display()))?;
    if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = std::fs::remove_file(&path);
        return Err(e).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(path)
}

/// Lowercased extension without the dot (`"a.JPG"` → `"jpg"`), or `""`.
pub fn bare_extension(file_name: &str) -> String {
    file_extension(file_name).trim_start_matches('.').to_string()
}
