//! Per-identifier orchestration: resolve, probe, download, extract.

use crate::config::FetcherConfig;
use crate::download;
use crate::error::FetchError;
use crate::extract::extract_archive;
use crate::identifier::Identifier;
use crate::resolve::resolve_url;
use crate::storage::{ensure_directory, is_already_downloaded};
use crate::types::{
    ArchiveFormat, DownloadState, ExtractStats, ItemReport, ItemState, ProbeResponse, RunReport,
};
use crate::ProgressCallback;
use reqwest::Client;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Downloads and extracts e-prints, one identifier at a time.
///
/// A single HTTP client is shared by every request of a run.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    /// Build a fetcher. Certificate validation is always enabled.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Create the download and extraction roots.
    ///
    /// Must succeed before any identifier is processed; a failure here is
    /// fatal for the whole run.
    pub fn prepare(&self) -> Result<(), FetchError> {
        ensure_directory(&self.config.dl_dir)?;
        ensure_directory(&self.config.extract_dir)?;
        Ok(())
    }

    pub fn resolve(&self, identifier: &Identifier) -> Url {
        resolve_url(&self.config.base_url, identifier)
    }

    /// `<dl_dir>/<identifier>`
    pub fn download_path(&self, identifier: &Identifier) -> PathBuf {
        self.config.dl_dir.join(identifier.relative_path())
    }

    /// `<extract_dir>/<identifier>/`
    pub fn extraction_dir(&self, identifier: &Identifier) -> PathBuf {
        self.config.extract_dir.join(identifier.relative_path())
    }

    pub async fn probe(
        &self,
        url: &Url,
        cancel_flag: &AtomicBool,
    ) -> Result<ProbeResponse, FetchError> {
        download::probe(&self.client, url, cancel_flag).await
    }

    /// Extract a downloaded file on the blocking pool.
    pub async fn extract(
        &self,
        identifier: &Identifier,
        cancel_flag: Arc<AtomicBool>,
    ) -> Result<ExtractStats, FetchError> {
        let input_path = self.download_path(identifier);
        let extract_root = self.config.extract_dir.clone();
        let identifier = identifier.clone();

        tokio::task::spawn_blocking(move || {
            extract_archive(&input_path, &identifier, &extract_root, &cancel_flag)
        })
        .await
        .map_err(|e| FetchError::Io(io::Error::other(e)))?
    }

    /// Process one identifier through to a terminal state.
    ///
    /// Never fails as a whole: every error is recorded on the returned
    /// report so the caller can move on to the next identifier.
    pub async fn fetch(
        &self,
        raw_identifier: &str,
        progress_cb: &ProgressCallback,
        cancel_flag: Arc<AtomicBool>,
    ) -> ItemReport {
        let mut report = ItemReport::new(raw_identifier);

        let identifier = match Identifier::new(raw_identifier) {
            Ok(identifier) => identifier,
            Err(e) => {
                warn!("Error: {e}");
                return report.skipped(e);
            }
        };

        let url = self.resolve(&identifier);
        report.url = Some(url.to_string());

        info!("Requesting {url} ...");
        let probe = match self.probe(&url, &cancel_flag).await {
            Ok(probe) => probe,
            Err(e) => {
                warn!("Error: {e}");
                return report.skipped(e);
            }
        };

        if !probe.is_ok() {
            warn!("Error: status code {}", probe.status);
            return report.skipped(FetchError::Status {
                url: url.to_string(),
                status: probe.status,
            });
        }

        let output_path = self.download_path(&identifier);
        let cached = match probe.content_length {
            Some(expected) => is_already_downloaded(&output_path, expected),
            None => {
                debug!(%url, "no content length advertised, cannot reuse local copy");
                false
            }
        };

        let state = if cached {
            info!("Item {identifier} is already downloaded.");
            DownloadState::Cached
        } else {
            info!("Downloading {url} ...");
            let result = download::download(
                &self.client,
                &url,
                &output_path,
                identifier.as_str(),
                progress_cb,
                &cancel_flag,
            )
            .await;

            if let Err(e) = result {
                warn!("Error: download of {identifier} failed: {e}");
                return report.skipped(e);
            }
            DownloadState::Downloaded
        };

        report.download = Some(state);
        report.bytes = std::fs::metadata(&output_path).ok().map(|m| m.len());

        match self.extract(&identifier, cancel_flag).await {
            Ok(stats) => {
                report.state = match stats.format {
                    ArchiveFormat::TapeArchive(_) => ItemState::Extracted,
                    _ => ItemState::ExtractionFallback,
                };
                info!(
                    "Extracted {identifier} as {} ({} files, {} bytes)",
                    stats.format, stats.files_extracted, stats.bytes_written
                );
                report.extraction = Some(stats);
            }
            Err(e) => {
                warn!("Error: extraction of {identifier} failed: {e}");
                report.state = ItemState::ExtractionFailed;
                report.error = Some(e.to_string());
            }
        }

        report
    }

    /// Process identifiers in order. A failed identifier does not stop the
    /// batch; a set `cancel_flag` stops it before the next identifier.
    pub async fn run<I, S>(
        &self,
        identifiers: I,
        progress_cb: &ProgressCallback,
        cancel_flag: Arc<AtomicBool>,
    ) -> RunReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run = RunReport::default();

        for identifier in identifiers {
            if cancel_flag.load(Ordering::Relaxed) {
                run.cancelled = true;
                break;
            }

            let report = self
                .fetch(identifier.as_ref(), progress_cb, cancel_flag.clone())
                .await;
            run.items.push(report);
        }

        if cancel_flag.load(Ordering::Relaxed) {
            run.cancelled = true;
        }

        run
    }
}
