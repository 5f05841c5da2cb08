//! Container-level metadata extraction.
//!
//! [`extract`] parses frame count, pixel dimensions, and per-frame display
//! durations from raw source bytes, once per source. It never decodes pixel
//! data for animated GIF sources (the `gif` crate's frame-info scan walks
//! the container structure only), so probing stays cheap even for long
//! animations. APNG sources are probed through the `image` crate's APNG
//! decoder.
//!
//! Extraction is CPU-bound and must run off the playback timeline; the
//! engine submits it to a decode worker together with the source load.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::metadata;
//!
//! let bytes = std::fs::read("animation.gif")?;
//! let meta = metadata::extract(&bytes)?;
//! println!(
//!     "{}x{}, {} frames, {:?} total",
//!     meta.width(),
//!     meta.height(),
//!     meta.frame_count(),
//!     meta.total_duration(),
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Cursor;
use std::time::Duration;

use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, ImageDecoder};

use crate::decode::SourceFormat;
use crate::error::PlaybackError;

/// Fallback display duration for frames whose container timing field is
/// zero or missing (~1/24 s).
///
/// A zero duration would make the advance loop spin through the whole
/// animation in a single tick, so it is never allowed to survive extraction.
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / 24);

/// Immutable metadata for one successfully parsed source.
///
/// Created once per source by [`extract`] and shared (via `Arc`) between
/// the playback timeline and the decode workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationMetadata {
    width: u32,
    height: u32,
    frame_durations: Vec<Duration>,
    total_duration: Duration,
}

impl AnimationMetadata {
    /// Build metadata from raw per-frame durations.
    ///
    /// Zero durations are replaced by [`DEFAULT_FRAME_DURATION`]; the total
    /// duration is derived from the normalized values.
    pub(crate) fn new(width: u32, height: u32, raw_durations: Vec<Duration>) -> Self {
        let frame_durations: Vec<Duration> = raw_durations
            .into_iter()
            .map(|d| if d.is_zero() { DEFAULT_FRAME_DURATION } else { d })
            .collect();
        let total_duration = frame_durations.iter().sum();

        Self {
            width,
            height,
            frame_durations,
            total_duration,
        }
    }

    /// Canvas width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames in the animation. Always at least 1.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_durations.len()
    }

    /// `true` when the source has more than one frame.
    #[inline]
    pub fn is_animated(&self) -> bool {
        self.frame_durations.len() > 1
    }

    /// Display duration of the given frame, or `None` when out of range.
    ///
    /// Every returned duration is strictly positive.
    pub fn frame_duration(&self, index: usize) -> Option<Duration> {
        self.frame_durations.get(index).copied()
    }

    /// All per-frame display durations, in frame order.
    #[inline]
    pub fn frame_durations(&self) -> &[Duration] {
        &self.frame_durations
    }

    /// Sum of all frame durations (one full loop).
    #[inline]
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }
}

/// Parse container-level metadata from raw source bytes.
///
/// # Errors
///
/// - [`PlaybackError::EmptyInput`] when `bytes` is empty.
/// - [`PlaybackError::UnsupportedFormat`] when no decoder can open the
///   container (including truncated animated containers).
/// - [`PlaybackError::NoFrames`] when the container opens but resolves to
///   zero frames.
pub fn extract(bytes: &[u8]) -> Result<AnimationMetadata, PlaybackError> {
    if bytes.is_empty() {
        return Err(PlaybackError::EmptyInput);
    }

    match SourceFormat::detect(bytes) {
        SourceFormat::Gif => extract_gif(bytes),
        SourceFormat::Png => extract_png(bytes),
        SourceFormat::Still => extract_still(bytes),
    }
}

/// Scan a GIF's frame structure without decompressing pixel data.
fn extract_gif(bytes: &[u8]) -> Result<AnimationMetadata, PlaybackError> {
    let options = gif::DecodeOptions::new();
    let mut reader = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;

    let width = u32::from(reader.width());
    let height = u32::from(reader.height());

    let mut durations = Vec::new();
    loop {
        match reader.next_frame_info() {
            Ok(Some(frame)) => {
                // GIF graphic-control delay is in centiseconds.
                durations.push(Duration::from_millis(u64::from(frame.delay) * 10));
            }
            Ok(None) => break,
            Err(e) => return Err(PlaybackError::UnsupportedFormat(e.to_string())),
        }
    }

    if durations.is_empty() {
        return Err(PlaybackError::NoFrames);
    }

    log::debug!("GIF metadata: {width}x{height}, {} frames", durations.len());
    Ok(AnimationMetadata::new(width, height, durations))
}

/// Probe a PNG: APNG frame-control delays when animated, single frame
/// otherwise.
fn extract_png(bytes: &[u8]) -> Result<AnimationMetadata, PlaybackError> {
    let decoder = PngDecoder::new(Cursor::new(bytes))
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;
    let (width, height) = decoder.dimensions();

    let animated = decoder
        .is_apng()
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;
    if !animated {
        return Ok(AnimationMetadata::new(
            width,
            height,
            vec![DEFAULT_FRAME_DURATION],
        ));
    }

    let apng = decoder
        .apng()
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;

    let mut durations = Vec::new();
    for frame in apng.into_frames() {
        let frame = frame.map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;
        durations.push(frame_delay_duration(frame.delay()));
    }

    if durations.is_empty() {
        return Err(PlaybackError::NoFrames);
    }

    log::debug!("APNG metadata: {width}x{height}, {} frames", durations.len());
    Ok(AnimationMetadata::new(width, height, durations))
}

/// Any other `image`-decodable format is treated as a single static frame.
fn extract_still(bytes: &[u8]) -> Result<AnimationMetadata, PlaybackError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;
    Ok(AnimationMetadata::new(
        img.width(),
        img.height(),
        vec![DEFAULT_FRAME_DURATION],
    ))
}

/// Convert an `image` frame delay to a `Duration`.
pub(crate) fn frame_delay_duration(delay: image::Delay) -> Duration {
    let (numer, denom) = delay.numer_denom_ms();
    if denom == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(u64::from(numer) * 1000 / u64::from(denom))
}
