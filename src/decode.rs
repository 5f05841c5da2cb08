//! On-demand frame decoding.
//!
//! [`FrameDecoder`] is the per-frame decode primitive: given the immutable
//! source bytes and a frame index, it produces one fully rasterized RGBA8
//! bitmap. Each call is independent and side-effect-free, so the engine's
//! worker pool may decode distinct indices concurrently against the same
//! source.
//!
//! Decoded frames are always materialized into an owned pixel buffer before
//! they are handed back. A lazily-backed decode result crossing into the
//! shared buffer would reintroduce a just-in-time rasterization stall on
//! the playback timeline, the exact stall the look-ahead window exists to
//! avoid.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::AnimationDecoder;

use crate::error::PlaybackError;
use crate::metadata::AnimationMetadata;

/// Container format of a source, detected from its magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Animated (or single-frame) GIF.
    Gif,
    /// PNG; may be an APNG animation or a plain still.
    Png,
    /// Anything else the `image` crate can open, treated as one frame.
    Still,
}

impl SourceFormat {
    /// Detect the container format from leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

        if bytes.len() >= 6 && (&bytes[..6] == b"GIF87a" || &bytes[..6] == b"GIF89a") {
            SourceFormat::Gif
        } else if bytes.len() >= 8 && bytes[..8] == PNG_MAGIC {
            SourceFormat::Png
        } else {
            SourceFormat::Still
        }
    }
}

/// One decoded bitmap plus its frame index.
///
/// The pixel buffer is tightly packed RGBA8, `width * height * 4` bytes.
/// Ownership flows from the decode worker into the frame window, and from
/// the window to the display side when the frame is consumed.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Index of this frame within the animation.
    pub index: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Rasterized RGBA8 pixel data.
    pub data: Vec<u8>,
}

/// Stateless per-call frame decoder for one source.
///
/// Created together with the source's [`AnimationMetadata`] once the bytes
/// are fully available, and torn down together with it when the source
/// changes. Cheap to clone behind an `Arc` for submission to decode
/// workers.
#[derive(Debug)]
pub struct FrameDecoder {
    bytes: Arc<[u8]>,
    metadata: Arc<AnimationMetadata>,
    format: SourceFormat,
}

impl FrameDecoder {
    /// Create a decoder over immutable source bytes and their metadata.
    pub fn new(bytes: Arc<[u8]>, metadata: Arc<AnimationMetadata>) -> Self {
        let format = SourceFormat::detect(&bytes);
        Self {
            bytes,
            metadata,
            format,
        }
    }

    /// The metadata extracted from this decoder's source.
    #[inline]
    pub fn metadata(&self) -> &Arc<AnimationMetadata> {
        &self.metadata
    }

    /// Decode a single frame to a rasterized RGBA8 bitmap.
    ///
    /// Safe to call concurrently for distinct indices; every call opens a
    /// fresh decoder over the shared immutable bytes.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::FrameOutOfRange`] when `index` is not in
    ///   `[0, frame_count)`.
    /// - [`PlaybackError::DecodeFailed`] when the underlying decoder cannot
    ///   produce the frame (corrupt or truncated data).
    pub fn decode(&self, index: usize) -> Result<DecodedFrame, PlaybackError> {
        let frame_count = self.metadata.frame_count();
        if index >= frame_count {
            return Err(PlaybackError::FrameOutOfRange { index, frame_count });
        }

        match self.format {
            SourceFormat::Gif => {
                let decoder = GifDecoder::new(Cursor::new(self.bytes.as_ref()))
                    .map_err(|e| decode_failed(index, &e))?;
                self.nth_animation_frame(decoder, index)
            }
            SourceFormat::Png if self.metadata.is_animated() => {
                let decoder = PngDecoder::new(Cursor::new(self.bytes.as_ref()))
                    .and_then(|d| d.apng())
                    .map_err(|e| decode_failed(index, &e))?;
                self.nth_animation_frame(decoder, index)
            }
            _ => self.decode_still(index),
        }
    }

    /// Walk an animation decoder to the requested frame and materialize it.
    fn nth_animation_frame<'a, D>(
        &self,
        decoder: D,
        index: usize,
    ) -> Result<DecodedFrame, PlaybackError>
    where
        D: AnimationDecoder<'a>,
    {
        match decoder.into_frames().nth(index) {
            Some(Ok(frame)) => {
                let buffer = frame.into_buffer();
                let (width, height) = buffer.dimensions();
                Ok(DecodedFrame {
                    index,
                    width,
                    height,
                    data: buffer.into_raw(),
                })
            }
            Some(Err(e)) => Err(decode_failed(index, &e)),
            None => Err(PlaybackError::DecodeFailed {
                index,
                reason: "container ended before the requested frame".to_string(),
            }),
        }
    }

    /// Decode a static single-frame source.
    fn decode_still(&self, index: usize) -> Result<DecodedFrame, PlaybackError> {
        let img = image::load_from_memory(&self.bytes).map_err(|e| decode_failed(index, &e))?;
        let buffer = img.to_rgba8();
        let (width, height) = buffer.dimensions();
        Ok(DecodedFrame {
            index,
            width,
            height,
            data: buffer.into_raw(),
        })
    }
}

fn decode_failed(index: usize, error: &dyn std::fmt::Display) -> PlaybackError {
    PlaybackError::DecodeFailed {
        index,
        reason: error.to_string(),
    }
}
