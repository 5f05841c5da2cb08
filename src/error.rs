//! Error types for the `flipbook` crate.
//!
//! This module defines [`PlaybackError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose the problem at the call site: file paths, URLs, frame indices,
//! and upstream error messages.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for all `flipbook` operations.
///
/// Every public method that can fail returns `Result<T, PlaybackError>`.
///
/// Variants split into two classes the engine treats differently:
/// source-level failures (`EmptyInput`, `UnsupportedFormat`, `NoFrames`,
/// `FileNotFound`, `ReadError`, `NetworkError`) are terminal for the current
/// source, while a per-frame [`DecodeFailed`](PlaybackError::DecodeFailed)
/// during steady-state playback only leaves that frame's buffer slot empty.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaybackError {
    /// The source resolved to zero bytes.
    #[error("Source contains no bytes")]
    EmptyInput,

    /// No decoder could open the container.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The container opened but resolved to zero frames.
    #[error("Image contains no frames")]
    NoFrames,

    /// The requested frame index exceeds the frame count.
    ///
    /// Under correct scheduling this never occurs; if it does, the engine
    /// treats it as a decode failure for that frame only.
    #[error("Frame {index} is out of range (animation has {frame_count} frames)")]
    FrameOutOfRange {
        /// The frame index that was requested.
        index: usize,
        /// The total number of frames in the animation.
        frame_count: usize,
    },

    /// The local file does not exist, nor does any resource-directory
    /// fallback candidate.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The local file exists but could not be read. Never retried.
    #[error("Failed to read {path}: {reason}")]
    ReadError {
        /// The path that was being read.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },

    /// A remote fetch failed after exhausting the retry budget.
    #[error("Network error fetching {url} after {attempts} attempts: {reason}")]
    NetworkError {
        /// The URL that was being fetched.
        url: String,
        /// How many fetch attempts were made.
        attempts: u32,
        /// The last transport error observed.
        reason: String,
    },

    /// A specific frame failed to produce a bitmap.
    #[error("Failed to decode frame {index}: {reason}")]
    DecodeFailed {
        /// The frame index that failed.
        index: usize,
        /// Underlying decoder error message.
        reason: String,
    },
}

impl PlaybackError {
    /// Whether this error is terminal for the whole source.
    ///
    /// A per-frame decode failure during windowed playback is recoverable
    /// (the slot is re-attempted once, then skipped); everything else ends
    /// the current load.
    pub fn is_fatal_for_source(&self) -> bool {
        !matches!(
            self,
            PlaybackError::DecodeFailed { .. } | PlaybackError::FrameOutOfRange { .. }
        )
    }
}
