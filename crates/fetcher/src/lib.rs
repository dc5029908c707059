//! # Fetcher
//!
//! Downloads arXiv e-print source archives and extracts them.
//!
//! For each identifier the remote location `https://arxiv.org/e-print/<id>`
//! is probed with a HEAD request. A local copy in the download directory
//! whose size matches the advertised length is reused, otherwise the
//! resource is downloaded. The file is then extracted into
//! `<extract_dir>/<id>/`, either as a tar archive or, for a single
//! compressed file, as `<extract_dir>/<id>/<id>`.
//!
//! ## Supported Payloads
//!
//! - TAR (plain, gzip, bzip2 or xz compressed)
//! - Single gzip, bzip2 or xz stream
//!
//! ## Example
//!
//! ```rust,no_run
//! use fetcher::{Fetcher, FetcherConfig};
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(FetcherConfig::new("dl", "extracted"))?;
//! fetcher.prepare()?;
//!
//! let cancel_flag = Arc::new(AtomicBool::new(false));
//! let progress_cb = |id: &str, bytes: u64, total: Option<u64>| {
//!     println!("{id}: {bytes}/{total:?}");
//!     true // Continue download
//! };
//!
//! let report = fetcher
//!     .run(["1910.02474"], &progress_cb, cancel_flag)
//!     .await;
//! println!("{} failed", report.failed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod format;
pub mod identifier;
pub mod resolve;
pub mod storage;
pub mod types;

// Re-export main types
pub use config::{FetcherConfig, ARXIV_BASE_URL, DEFAULT_DL_DIR, DEFAULT_EXTRACT_DIR, EPRINT_PATH};
pub use error::FetchError;
pub use fetcher::Fetcher;
pub use format::{detect_file_format, detect_format};
pub use identifier::Identifier;
pub use resolve::resolve_url;
pub use storage::{ensure_directory, is_already_downloaded};
pub use types::{
    ArchiveFormat, Compression, DownloadState, ExtractStats, ItemReport, ItemState, ProbeResponse,
    RunReport,
};

use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Type alias for download progress callbacks.
///
/// The callback receives:
/// - `identifier`: The item being downloaded
/// - `bytes_received`: Number of bytes received so far
/// - `total_bytes`: Advertised size of the download, if known
///
/// Returns `true` to continue, `false` to cancel.
pub type ProgressCallback = dyn Fn(&str, u64, Option<u64>) -> bool + Send + Sync;

/// Extract a downloaded e-print into `<extract_root>/<identifier>/`.
///
/// # Errors
///
/// Returns an error if:
/// - The file is neither a tar archive nor a compressed stream
/// - The file is recognised but corrupted
/// - Extraction is cancelled
/// - I/O errors occur
pub fn extract(
    input_path: &Path,
    identifier: &Identifier,
    extract_root: &Path,
    cancel_flag: &AtomicBool,
) -> Result<ExtractStats, FetchError> {
    extract::extract_archive(input_path, identifier, extract_root, cancel_flag)
}
