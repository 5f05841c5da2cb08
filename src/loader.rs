//! Source resolution: local paths and remote URIs to raw bytes.
//!
//! [`SourceLoader`] turns a [`SourceLocator`] into the raw container bytes
//! the metadata extractor and frame decoder work on. Remote fetches go
//! through the [`ByteFetcher`] trait so hosts (and tests) can substitute
//! the transport; the default [`HttpFetcher`] uses `ureq`.
//!
//! Retry policy: transient remote failures are retried up to
//! [`MAX_FETCH_ATTEMPTS`] total attempts for the same URI, then surface as
//! [`PlaybackError::NetworkError`]. Local failures and parse/decode
//! failures are permanent given the same bytes and are never retried.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{SourceLoader, SourceLocator};
//!
//! let loader = SourceLoader::new();
//! let bytes = loader.load(&SourceLocator::parse("spinner.gif"))?;
//! # Ok::<(), flipbook::PlaybackError>(())
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::error::PlaybackError;

/// Maximum number of fetch attempts for one remote URI (initial + retries).
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Upper bound on remote body size accepted by the default fetcher.
const MAX_REMOTE_BYTES: u64 = 64 * 1024 * 1024;

/// A logical source location: a filesystem path or a remote URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// Local filesystem path (with resource-directory fallback search).
    Path(PathBuf),
    /// Remote `http`/`https` URI.
    Url(String),
}

impl SourceLocator {
    /// Classify a source string: `http://`/`https://` prefixes become
    /// [`SourceLocator::Url`], everything else a local path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            SourceLocator::Url(source.to_string())
        } else {
            SourceLocator::Path(PathBuf::from(source))
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Path(path) => write!(f, "{}", path.display()),
            SourceLocator::Url(url) => write!(f, "{url}"),
        }
    }
}

/// A transport failure from a [`ByteFetcher`].
///
/// All fetch failures are considered transient and eligible for retry;
/// permanent conditions (bad bytes, unsupported formats) only show up
/// later, at parse time, and are never retried.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Trait for resolving a remote URI into raw bytes.
///
/// Implementations must be `Send + Sync`: fetches run on decode workers,
/// never on the playback timeline.
pub trait ByteFetcher: Send + Sync {
    /// Fetch the full body for `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Default [`ByteFetcher`] backed by `ureq`.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    /// Create a new HTTP fetcher.
    pub fn new() -> Self {
        Self
    }
}

impl ByteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = ureq::get(url)
            .call()
            .map_err(|e| FetchError(e.to_string()))?;
        response
            .body_mut()
            .with_config()
            .limit(MAX_REMOTE_BYTES)
            .read_to_vec()
            .map_err(|e| FetchError(e.to_string()))
    }
}

/// Resolves a [`SourceLocator`] into raw source bytes.
#[derive(Clone)]
pub struct SourceLoader {
    fetcher: Arc<dyn ByteFetcher>,
    search_paths: Vec<PathBuf>,
}

impl fmt::Debug for SourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceLoader")
            .field("search_paths", &self.search_paths)
            .finish()
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader {
    /// Create a loader with the default HTTP fetcher and no extra search
    /// paths.
    pub fn new() -> Self {
        Self {
            fetcher: Arc::new(HttpFetcher::new()),
            search_paths: Vec::new(),
        }
    }

    /// Substitute the transport used for remote URIs.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ByteFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Directories searched (by file name) when a literal local path does
    /// not exist: the bundled-resource fallback.
    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Resolve a locator to raw bytes.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::FileNotFound`] when neither the literal path nor
    ///   any search-path candidate exists.
    /// - [`PlaybackError::ReadError`] when a found file cannot be read
    ///   (permanent, never retried).
    /// - [`PlaybackError::NetworkError`] when a remote fetch fails
    ///   [`MAX_FETCH_ATTEMPTS`] times.
    pub fn load(&self, locator: &SourceLocator) -> Result<Vec<u8>, PlaybackError> {
        match locator {
            SourceLocator::Path(path) => self.load_path(path),
            SourceLocator::Url(url) => self.load_url(url),
        }
    }

    fn load_path(&self, path: &Path) -> Result<Vec<u8>, PlaybackError> {
        let resolved = self
            .resolve_path(path)
            .ok_or_else(|| PlaybackError::FileNotFound {
                path: path.to_path_buf(),
            })?;

        fs::read(&resolved).map_err(|e| PlaybackError::ReadError {
            path: resolved,
            reason: e.to_string(),
        })
    }

    /// Return the literal path when it exists, otherwise the first
    /// search-path candidate with the same file name.
    fn resolve_path(&self, path: &Path) -> Option<PathBuf> {
        if path.exists() {
            return Some(path.to_path_buf());
        }

        let file_name = path.file_name()?;
        self.search_paths
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.exists())
    }

    fn load_url(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            match self.fetcher.fetch(url) {
                Ok(bytes) => {
                    if attempt > 1 {
                        log::info!("fetch of {url} recovered on attempt {attempt}");
                    }
                    return Ok(bytes);
                }
                Err(e) => {
                    log::warn!("fetch attempt {attempt}/{MAX_FETCH_ATTEMPTS} for {url} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(PlaybackError::NetworkError {
            url: url.to_string(),
            attempts: MAX_FETCH_ATTEMPTS,
            reason: last_error.map(|e| e.0).unwrap_or_default(),
        })
    }
}
