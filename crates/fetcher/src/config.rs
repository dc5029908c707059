//! Fixed remote location and per-run settings.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Scheme and host every e-print is served from.
pub const ARXIV_BASE_URL: &str = "https://arxiv.org";

/// Path prefix placed before the identifier.
pub const EPRINT_PATH: &str = "e-print";

/// Default directory for raw downloads.
pub const DEFAULT_DL_DIR: &str = "dl";

/// Default root for extracted sources.
pub const DEFAULT_EXTRACT_DIR: &str = "extracted";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`crate::Fetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Scheme and host the e-print path is appended to
    pub base_url: Url,

    /// Directory raw downloads are written to
    pub dl_dir: PathBuf,

    /// Root under which each identifier gets its own directory
    pub extract_dir: PathBuf,

    /// Per-request timeout; none by default
    pub timeout: Option<Duration>,

    /// Value of the User-Agent header
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            dl_dir: PathBuf::from(DEFAULT_DL_DIR),
            extract_dir: PathBuf::from(DEFAULT_EXTRACT_DIR),
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn new(dl_dir: impl Into<PathBuf>, extract_dir: impl Into<PathBuf>) -> Self {
        Self {
            dl_dir: dl_dir.into(),
            extract_dir: extract_dir.into(),
            ..Self::default()
        }
    }

    /// Point requests at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_base_url() -> Url {
    Url::parse(ARXIV_BASE_URL).expect("ARXIV_BASE_URL is a valid URL")
}
