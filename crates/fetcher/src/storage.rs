//! Local filesystem helpers: output roots, idempotency check, atomic writes.

use std::fs;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Create `path` and any missing parents. An existing directory is not an error.
pub fn ensure_directory(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Whether a regular file already sits at `path` with exactly `expected_length` bytes.
///
/// Only the size is compared. Two different payloads of equal length are
/// treated as the same download.
pub fn is_already_downloaded(path: &Path, expected_length: u64) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.len() == expected_length,
        Err(_) => false,
    }
}

/// Creates a temporary file next to `target`, so the final rename stays
/// on one filesystem.
pub(crate) fn temp_file_beside(target: &Path) -> io::Result<NamedTempFile> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(parent)
}

/// Moves a finished temporary file over `target`.
pub(crate) fn persist(temp: NamedTempFile, target: &Path) -> io::Result<()> {
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
