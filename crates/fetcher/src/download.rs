//! HTTP side of a fetch: metadata probe and full download.

use crate::error::FetchError;
use crate::storage::{persist, temp_file_beside};
use crate::types::ProbeResponse;
use crate::ProgressCallback;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// How often a pending request checks the cancel flag.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Resolves once `cancel_flag` is set.
async fn cancelled(cancel_flag: &AtomicBool) {
    while !cancel_flag.load(Ordering::Relaxed) {
        tokio::time::sleep(CANCEL_POLL).await;
    }
}

/// Await `request` unless `cancel_flag` is set first. A stalled server
/// never blocks cancellation; dropping `request` closes the connection.
async fn until_cancelled<T, F>(cancel_flag: &AtomicBool, request: F) -> Result<T, FetchError>
where
    F: Future<Output = reqwest::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancelled(cancel_flag) => Err(FetchError::Cancelled),
        result = request => Ok(result?),
    }
}

/// Issue a HEAD request and report status and advertised length.
///
/// The length is read from the `Content-Length` header directly: a HEAD
/// response has no body, so the body size hint would always be zero.
///
/// Returns `Cancelled` as soon as `cancel_flag` is set, even while waiting
/// on the server.
pub async fn probe(
    client: &Client,
    url: &Url,
    cancel_flag: &AtomicBool,
) -> Result<ProbeResponse, FetchError> {
    let response = until_cancelled(cancel_flag, client.head(url.clone()).send()).await?;

    let content_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    let probe = ProbeResponse {
        status: response.status().as_u16(),
        content_length,
    };
    debug!(%url, status = probe.status, content_length = ?probe.content_length, "probe");
    Ok(probe)
}

/// GET `url` and store the body at `output_path`.
///
/// The body is streamed into a temporary file beside `output_path` and
/// renamed over it once complete, so the output path only ever holds a
/// whole download. On a non-200 status, transport error or cancellation
/// the output path is left untouched and the temporary file is removed.
///
/// `progress_cb` is called after every chunk with `label`, the bytes
/// received so far and the advertised total; returning `false` cancels.
/// Setting `cancel_flag` cancels too, also while a response or the next
/// chunk is still pending.
///
/// Returns the number of bytes written.
pub async fn download(
    client: &Client,
    url: &Url,
    output_path: &Path,
    label: &str,
    progress_cb: &ProgressCallback,
    cancel_flag: &AtomicBool,
) -> Result<u64, FetchError> {
    let mut response = until_cancelled(cancel_flag, client.get(url.clone()).send()).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length();
    let mut temp = temp_file_beside(output_path)?;
    let mut received = 0u64;

    while let Some(chunk) = until_cancelled(cancel_flag, response.chunk()).await? {
        temp.write_all(&chunk)?;
        received += chunk.len() as u64;

        if !progress_cb(label, received, total) {
            return Err(FetchError::Cancelled);
        }
    }

    temp.flush()?;
    persist(temp, output_path)?;

    debug!(%url, path = %output_path.display(), bytes = received, "download complete");
    Ok(received)
}
