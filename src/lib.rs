//! Decode-and-playback engine for animated images.
//!
//! `flipbook` turns a GIF, animated PNG, or still image (on disk or
//! behind a URL) into a clock-driven sequence of RGBA frames, ready for a
//! host render loop to display. Decoding runs incrementally on a worker
//! pool behind a bounded look-ahead window, so memory stays proportional
//! to the window size rather than the animation length.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use flipbook::{EngineOptions, PlaybackEngine, PlaybackState, SourceLocator};
//!
//! let mut engine = PlaybackEngine::new(EngineOptions::new());
//! engine.set_source(SourceLocator::parse("spinner.gif"));
//!
//! loop {
//!     if engine.tick(Duration::from_millis(16)) {
//!         // engine.current_frame() changed; re-upload it
//!     }
//!     if engine.state() == PlaybackState::Failed {
//!         break;
//!     }
//!     std::thread::sleep(Duration::from_millis(16));
//! }
//! ```
//!
//! # Architecture
//!
//! The pipeline has five stages, each its own module:
//!
//! - [`loader`]: resolves a [`SourceLocator`] to raw bytes, either local
//!   path lookup with fallback search paths or HTTP with bounded retry.
//! - [`metadata`]: one cheap pass over the container to get dimensions and
//!   per-frame durations, without decoding any pixels.
//! - [`decode`]: random-access decoding of individual frames to RGBA8.
//! - [`window`]: the bounded look-ahead buffer between decode workers and
//!   the playhead.
//! - [`scheduler`]: the clock-driven state machine that consumes frames as
//!   their durations expire.
//!
//! [`engine`] ties the stages together and owns the worker pool;
//! [`events`] is the lifecycle-observation seam for hosts.
//!
//! All public errors are [`PlaybackError`]; recoverable and terminal
//! failures are distinguished per source, never per engine: a failed
//! load leaves the engine ready for the next
//! [`set_source`](PlaybackEngine::set_source).

pub mod decode;
pub mod engine;
pub mod error;
pub mod events;
pub mod loader;
pub mod metadata;
pub mod options;
pub mod scheduler;
pub mod window;

pub use decode::{DecodedFrame, FrameDecoder, SourceFormat};
pub use engine::PlaybackEngine;
pub use error::PlaybackError;
pub use events::{PlaybackEvent, PlaybackListener};
pub use loader::{
    ByteFetcher, FetchError, HttpFetcher, MAX_FETCH_ATTEMPTS, SourceLoader, SourceLocator,
};
pub use metadata::{AnimationMetadata, DEFAULT_FRAME_DURATION};
pub use options::EngineOptions;
pub use scheduler::{PlaybackScheduler, PlaybackState, TickOutcome};
pub use window::{DEFAULT_BUFFER_WINDOW, FrameWindow};
