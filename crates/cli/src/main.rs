//! Command-line interface for downloading and extracting arXiv e-prints.
//!
//! Each identifier is probed, downloaded unless an identical-size copy is
//! already present, and extracted. Failures are reported per identifier
//! and never stop the remaining ones.

use clap::Parser;
use fetcher::{Fetcher, FetcherConfig, RunReport, DEFAULT_DL_DIR, DEFAULT_EXTRACT_DIR};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Exit status when interrupted with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "arxiv-dl")]
#[command(version, about = "downloads and extracts archives from arXiv.org", long_about = None)]
struct Cli {
    /// Archive id (such as 1910.02474)
    #[arg(required = true)]
    ids: Vec<String>,

    /// Directory to download archives to
    #[arg(long, default_value = DEFAULT_DL_DIR)]
    dl_dir: PathBuf,

    /// Directory to extract archives to
    #[arg(long, default_value = DEFAULT_EXTRACT_DIR)]
    extract_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print a JSON report when done
    #[arg(long)]
    json: bool,

    /// Hide the download progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match handle_fetch(cli).await {
        Ok(report) if report.cancelled => process::exit(EXIT_INTERRUPTED),
        Ok(report) if report.failed() > 0 => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_fetch(cli: Cli) -> Result<RunReport, Box<dyn std::error::Error>> {
    let config = FetcherConfig::new(cli.dl_dir, cli.extract_dir)
        .with_timeout(cli.timeout.map(Duration::from_secs));

    let fetcher = Fetcher::new(config)?;
    fetcher.prepare()?;

    let cancel_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel_flag.clone();
    // First Ctrl-C stops the run cleanly, a second one exits at once.
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::Relaxed) {
            process::exit(EXIT_INTERRUPTED);
        }
    })?;

    let progress = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    progress.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )?
        .progress_chars("=> "),
    );

    let progress_for_cb = progress.clone();
    let progress_cb = move |identifier: &str, bytes: u64, total: Option<u64>| {
        if progress_for_cb.message() != identifier {
            progress_for_cb.reset();
            progress_for_cb.set_message(identifier.to_string());
        }
        if let Some(total) = total {
            progress_for_cb.set_length(total);
        }
        progress_for_cb.set_position(bytes);
        true
    };

    let report = fetcher.run(&cli.ids, &progress_cb, cancel_flag).await;
    progress.finish_and_clear();

    for item in report.items.iter().filter(|i| !i.state.is_success()) {
        if let Some(error) = &item.error {
            eprintln!("Error: {}: {}", item.identifier, error);
        }
    }

    if report.cancelled {
        eprintln!("Interrupted, remaining identifiers were not processed");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["arxiv-dl", "1910.02474"]).unwrap();
        assert_eq!(cli.ids, ["1910.02474"]);
        assert_eq!(cli.dl_dir, PathBuf::from("dl"));
        assert_eq!(cli.extract_dir, PathBuf::from("extracted"));
        assert!(cli.timeout.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_multiple_ids_and_dirs() {
        let cli = Cli::try_parse_from([
            "arxiv-dl",
            "1910.02474",
            "hep-th/9901001",
            "--dl-dir",
            "raw",
            "--extract-dir",
            "src",
            "--timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.ids, ["1910.02474", "hep-th/9901001"]);
        assert_eq!(cli.dl_dir, PathBuf::from("raw"));
        assert_eq!(cli.extract_dir, PathBuf::from("src"));
        assert_eq!(cli.timeout, Some(30));
    }

    #[test]
    fn test_requires_an_id() {
        assert!(Cli::try_parse_from(["arxiv-dl"]).is_err());
    }
}
