//! AnimationMetadata extraction tests: GIF, APNG, still images, and
//! malformed input.

use std::io::Cursor;
use std::time::Duration;

use flipbook::metadata::{self, DEFAULT_FRAME_DURATION};
use flipbook::{PlaybackError, SourceFormat};

/// Encode an in-memory GIF with one frame per entry in `delays_cs`
/// (centiseconds, as stored in the GIF graphic-control block).
fn make_gif(width: u16, height: u16, delays_cs: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, width, height, &[]).expect("gif encoder");
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .expect("gif repeat");
        for (i, &delay) in delays_cs.iter().enumerate() {
            let shade = (i * 50 % 256) as u8;
            let pixels = vec![shade; usize::from(width) * usize::from(height) * 3];
            let mut frame = gif::Frame::from_rgb(width, height, &pixels);
            frame.delay = delay;
            encoder.write_frame(&frame).expect("gif frame");
        }
    }
    bytes
}

/// Encode an in-memory single-frame PNG.
fn make_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encode");
    bytes
}

// ── Format detection ─────────────────────────────────────────────

#[test]
fn detect_gif_magic() {
    let bytes = make_gif(2, 2, &[10]);
    assert_eq!(SourceFormat::detect(&bytes), SourceFormat::Gif);
}

#[test]
fn detect_png_magic() {
    let bytes = make_png(2, 2);
    assert_eq!(SourceFormat::detect(&bytes), SourceFormat::Png);
}

#[test]
fn detect_unknown_falls_back_to_still() {
    assert_eq!(SourceFormat::detect(b"not an image"), SourceFormat::Still);
}

// ── GIF extraction ───────────────────────────────────────────────

#[test]
fn gif_dimensions_and_frame_count() {
    let bytes = make_gif(8, 6, &[10, 20, 10]);
    let meta = metadata::extract(&bytes).expect("extract");

    assert_eq!(meta.width(), 8);
    assert_eq!(meta.height(), 6);
    assert_eq!(meta.frame_count(), 3);
    assert!(meta.is_animated());
}

#[test]
fn gif_delays_are_centiseconds() {
    let bytes = make_gif(4, 4, &[10, 20, 5]);
    let meta = metadata::extract(&bytes).expect("extract");

    assert_eq!(meta.frame_duration(0), Some(Duration::from_millis(100)));
    assert_eq!(meta.frame_duration(1), Some(Duration::from_millis(200)));
    assert_eq!(meta.frame_duration(2), Some(Duration::from_millis(50)));
    assert_eq!(meta.total_duration(), Duration::from_millis(350));
}

#[test]
fn gif_zero_delay_normalized_to_default() {
    let bytes = make_gif(4, 4, &[0, 10]);
    let meta = metadata::extract(&bytes).expect("extract");

    assert_eq!(meta.frame_duration(0), Some(DEFAULT_FRAME_DURATION));
    assert_eq!(meta.frame_duration(1), Some(Duration::from_millis(100)));
}

#[test]
fn gif_single_frame_not_animated() {
    let bytes = make_gif(4, 4, &[10]);
    let meta = metadata::extract(&bytes).expect("extract");

    assert_eq!(meta.frame_count(), 1);
    assert!(!meta.is_animated());
}

#[test]
fn frame_duration_out_of_range_is_none() {
    let bytes = make_gif(4, 4, &[10, 10]);
    let meta = metadata::extract(&bytes).expect("extract");

    assert!(meta.frame_duration(2).is_none());
}

// ── Still images ─────────────────────────────────────────────────

#[test]
fn still_png_single_default_duration_frame() {
    let bytes = make_png(16, 9);
    let meta = metadata::extract(&bytes).expect("extract");

    assert_eq!(meta.width(), 16);
    assert_eq!(meta.height(), 9);
    assert_eq!(meta.frame_count(), 1);
    assert!(!meta.is_animated());
    assert_eq!(meta.frame_duration(0), Some(DEFAULT_FRAME_DURATION));
}

// ── Malformed input ──────────────────────────────────────────────

#[test]
fn empty_input_rejected() {
    assert!(matches!(
        metadata::extract(&[]),
        Err(PlaybackError::EmptyInput)
    ));
}

#[test]
fn garbage_bytes_rejected() {
    let result = metadata::extract(b"definitely not an image");
    assert!(matches!(result, Err(PlaybackError::UnsupportedFormat(_))));
}

#[test]
fn truncated_gif_rejected() {
    let mut bytes = make_gif(4, 4, &[10, 10, 10]);
    bytes.truncate(bytes.len() / 2);

    let result = metadata::extract(&bytes);
    assert!(result.is_err(), "truncated GIF must not extract cleanly");
}
