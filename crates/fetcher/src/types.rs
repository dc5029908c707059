//! Type definitions for fetching and extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Compression layer wrapped around a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Stored as-is
    None,
    /// gzip / zlib deflate stream
    Gzip,
    /// bzip2 stream
    Bzip2,
    /// xz (LZMA2) stream
    Xz,
}

/// Payload classification made before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "compression", rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// A tar container, possibly compressed
    TapeArchive(Compression),
    /// A single compressed stream with no member structure
    SingleStream(Compression),
    /// Not recognised
    Unknown,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::TapeArchive(Compression::None) => write!(f, "TAR"),
            ArchiveFormat::TapeArchive(Compression::Gzip) => write!(f, "TAR.GZ"),
            ArchiveFormat::TapeArchive(Compression::Bzip2) => write!(f, "TAR.BZ2"),
            ArchiveFormat::TapeArchive(Compression::Xz) => write!(f, "TAR.XZ"),
            ArchiveFormat::SingleStream(Compression::Gzip) => write!(f, "GZIP"),
            ArchiveFormat::SingleStream(Compression::Bzip2) => write!(f, "BZIP2"),
            ArchiveFormat::SingleStream(Compression::Xz) => write!(f, "XZ"),
            ArchiveFormat::SingleStream(Compression::None) => write!(f, "RAW"),
            ArchiveFormat::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Result of a metadata-only request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,

    /// Advertised body length, if the server sent a parsable one
    pub content_length: Option<u64>,
}

impl ProbeResponse {
    /// Whether the status is 200 OK.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Statistics about a completed extraction operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Format the payload was extracted as
    pub format: ArchiveFormat,

    /// Number of files successfully extracted
    pub files_extracted: u64,

    /// Total bytes written to disk
    pub bytes_written: u64,

    /// Duration of the extraction operation (in seconds)
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ExtractStats {
    pub(crate) fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            files_extracted: 0,
            bytes_written: 0,
            duration: Duration::from_secs(0),
        }
    }
}

/// How the downloaded file came to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    /// A file of the advertised size was already present
    Cached,
    /// The file was fetched during this run
    Downloaded,
}

/// Terminal state of one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Probe or download failed; nothing was extracted
    SkippedOnError,
    /// Unpacked as a tar archive
    Extracted,
    /// Written as a single decompressed file
    ExtractionFallback,
    /// Downloaded but could not be extracted
    ExtractionFailed,
}

impl ItemState {
    pub fn is_success(self) -> bool {
        matches!(self, ItemState::Extracted | ItemState::ExtractionFallback)
    }
}

/// Outcome of processing a single identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub identifier: String,

    /// Resolved remote location, absent if the identifier was rejected
    pub url: Option<String>,

    pub state: ItemState,

    /// Set once a file of the expected size is on disk
    pub download: Option<DownloadState>,

    /// Size of the downloaded file in bytes
    pub bytes: Option<u64>,

    pub extraction: Option<ExtractStats>,

    /// Human-readable failure cause
    pub error: Option<String>,
}

impl ItemReport {
    pub(crate) fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            url: None,
            state: ItemState::SkippedOnError,
            download: None,
            bytes: None,
            extraction: None,
            error: None,
        }
    }

    pub(crate) fn skipped(mut self, error: impl fmt::Display) -> Self {
        self.state = ItemState::SkippedOnError;
        self.error = Some(error.to_string());
        self
    }
}

/// Outcome of a whole invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub items: Vec<ItemReport>,

    /// Set when processing stopped early on user request
    pub cancelled: bool,
}

impl RunReport {
    /// Number of identifiers that did not reach a successful terminal state.
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| !i.state.is_success()).count()
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_failed_count() {
        let mut ok = ItemReport::new("1910.02474");
        ok.state = ItemState::Extracted;
        let mut fallback = ItemReport::new("1910.02475");
        fallback.state = ItemState::ExtractionFallback;
        let mut broken = ItemReport::new("1910.02476");
        broken.state = ItemState::ExtractionFailed;
        let skipped = ItemReport::new("9999.99999").skipped("status code 404");

        let report = RunReport {
            items: vec![ok, fallback, broken, skipped],
            cancelled: false,
        };
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_item_report_json_shape() {
        let mut item = ItemReport::new("1910.02474");
        item.state = ItemState::Extracted;
        item.download = Some(DownloadState::Cached);
        item.extraction = Some(ExtractStats {
            format: ArchiveFormat::TapeArchive(Compression::Gzip),
            files_extracted: 3,
            bytes_written: 1024,
            duration: Duration::from_millis(1500),
        });

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["state"], "extracted");
        assert_eq!(json["download"], "cached");
        assert_eq!(json["extraction"]["format"]["kind"], "tape_archive");
        assert_eq!(json["extraction"]["format"]["compression"], "gzip");
        assert_eq!(json["extraction"]["duration"], 1.5);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(
            ArchiveFormat::TapeArchive(Compression::Gzip).to_string(),
            "TAR.GZ"
        );
        assert_eq!(
            ArchiveFormat::SingleStream(Compression::Gzip).to_string(),
            "GZIP"
        );
        assert_eq!(
            ArchiveFormat::TapeArchive(Compression::Xz).to_string(),
            "TAR.XZ"
        );
        assert_eq!(ArchiveFormat::Unknown.to_string(), "UNKNOWN");
    }
}
