//! Engine configuration.
//!
//! [`EngineOptions`] is a builder that threads the buffer window size, loop
//! bound, worker pool size, transport, resource search paths, and the
//! lifecycle listener into [`PlaybackEngine::new`](crate::PlaybackEngine::new)
//! without polluting every signature.
//!
//! # Example
//!
//! ```
//! use flipbook::EngineOptions;
//!
//! let options = EngineOptions::new()
//!     .with_buffer_window(8)
//!     .with_loop_count(3)
//!     .with_worker_threads(2);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::events::{NoOpListener, PlaybackListener};
use crate::loader::ByteFetcher;
use crate::window::DEFAULT_BUFFER_WINDOW;

/// Default number of decode worker threads.
const DEFAULT_WORKER_THREADS: usize = 2;

/// Configuration for a [`PlaybackEngine`](crate::PlaybackEngine).
///
/// All fields have sensible defaults; a default-constructed options value
/// plays any source with a 5-frame window, infinite looping, and the
/// built-in HTTP transport.
#[derive(Clone)]
pub struct EngineOptions {
    /// Look-ahead window capacity in frames.
    pub(crate) buffer_window: usize,
    /// Loop bound; 0 means loop forever.
    pub(crate) loop_count: u32,
    /// Decode worker pool size.
    pub(crate) worker_threads: usize,
    /// Remote transport override. `None` uses the `ureq`-backed default.
    pub(crate) fetcher: Option<Arc<dyn ByteFetcher>>,
    /// Resource-directory fallback search paths for local sources.
    pub(crate) search_paths: Vec<PathBuf>,
    /// Lifecycle listener. Defaults to a no-op.
    pub(crate) listener: Arc<dyn PlaybackListener>,
}

impl Debug for EngineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EngineOptions")
            .field("buffer_window", &self.buffer_window)
            .field("loop_count", &self.loop_count)
            .field("worker_threads", &self.worker_threads)
            .field("has_fetcher", &self.fetcher.is_some())
            .field("search_paths", &self.search_paths)
            .finish()
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineOptions {
    /// Create options with default settings.
    ///
    /// Defaults: 5-frame window, infinite looping, 2 decode workers, the
    /// built-in HTTP fetcher, no search paths, no listener.
    pub fn new() -> Self {
        Self {
            buffer_window: DEFAULT_BUFFER_WINDOW,
            loop_count: 0,
            worker_threads: DEFAULT_WORKER_THREADS,
            fetcher: None,
            search_paths: Vec::new(),
            listener: Arc::new(NoOpListener),
        }
    }

    /// Set the look-ahead window capacity. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_buffer_window(mut self, frames: usize) -> Self {
        self.buffer_window = frames.max(1);
        self
    }

    /// Set the loop bound. 0 loops forever.
    #[must_use]
    pub fn with_loop_count(mut self, loops: u32) -> Self {
        self.loop_count = loops;
        self
    }

    /// Set the decode worker pool size. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    /// Substitute the transport used for remote URIs.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ByteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Add a resource-directory fallback search path for local sources.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Attach a lifecycle listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn PlaybackListener>) -> Self {
        self.listener = listener;
        self
    }
}
