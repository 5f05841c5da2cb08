//! PlaybackScheduler tests: the tick advance algorithm, accumulator clamp,
//! loop bounds, and pause/resume.

use std::sync::Arc;
use std::time::Duration;

use flipbook::{
    AnimationMetadata, DecodedFrame, FrameWindow, PlaybackScheduler, PlaybackState, metadata,
};

/// Encode an in-memory 4x4 GIF with one frame per entry in `delays_cs`
/// (centiseconds).
fn make_gif(delays_cs: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, 4, 4, &[]).expect("gif encoder");
        for (i, &delay) in delays_cs.iter().enumerate() {
            let shade = (i * 50 % 256) as u8;
            let pixels = vec![shade; 4 * 4 * 3];
            let mut frame = gif::Frame::from_rgb(4, 4, &pixels);
            frame.delay = delay;
            encoder.write_frame(&frame).expect("gif frame");
        }
    }
    bytes
}

fn meta(delays_cs: &[u16]) -> Arc<AnimationMetadata> {
    Arc::new(metadata::extract(&make_gif(delays_cs)).expect("extract"))
}

fn frame(index: usize) -> DecodedFrame {
    DecodedFrame {
        index,
        width: 4,
        height: 4,
        data: vec![0; 64],
    }
}

fn preload(window: &mut FrameWindow, indices: &[usize]) {
    for &index in indices {
        window.schedule(index);
        window.on_decoded(index, Ok(frame(index)));
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

// ── Advance algorithm ────────────────────────────────────────────

#[test]
fn bounded_playback_scenario() {
    // Three frames of 100 ms, 200 ms, 100 ms, loop bound 1, all frames
    // buffered up front.
    let mut scheduler = PlaybackScheduler::new(1);
    scheduler.start(meta(&[10, 20, 10]));
    let mut window = FrameWindow::new(5, 3);
    preload(&mut window, &[1, 2, 0]);

    // 50 ms: inside frame 0's duration.
    let outcome = scheduler.tick(ms(50), &mut window);
    assert!(outcome.new_frame.is_none());
    assert_eq!(scheduler.current_index(), 0);

    // +100 ms = 150 ms: frame 0 expires, 50 ms carries into frame 1.
    let outcome = scheduler.tick(ms(100), &mut window);
    assert_eq!(outcome.new_frame.expect("advance").index, 1);
    assert_eq!(scheduler.accumulated_time(), ms(50));

    // +100 ms = 150 ms against frame 1's 200 ms: no advance.
    let outcome = scheduler.tick(ms(100), &mut window);
    assert!(outcome.new_frame.is_none());
    assert_eq!(scheduler.current_index(), 1);

    // +150 ms = 300 ms: frame 1 expires (100 ms left), frame 2 expires,
    // the playhead wraps to 0 and the loop bound is hit.
    let outcome = scheduler.tick(ms(150), &mut window);
    assert_eq!(outcome.new_frame.expect("advance").index, 0);
    assert!(outcome.finished);
    assert_eq!(scheduler.state(), PlaybackState::Stopped);
    assert_eq!(scheduler.current_index(), 0);
    assert_eq!(scheduler.loops_completed(), 1);
}

#[test]
fn missing_frame_clamps_accumulator() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10]));
    let mut window = FrameWindow::new(5, 2);

    // Frame 1 is not decoded yet: a huge delta must not bank up.
    let outcome = scheduler.tick(Duration::from_secs(1), &mut window);
    assert!(outcome.new_frame.is_none());
    assert_eq!(scheduler.current_index(), 0);
    assert_eq!(scheduler.accumulated_time(), ms(100));

    // The tick asked for the missing frames.
    assert!(outcome.to_decode.contains(&1));
    window.on_decoded(1, Ok(frame(1)));

    // Once the frame arrives, exactly one step is released, no burst.
    let outcome = scheduler.tick(Duration::ZERO, &mut window);
    assert_eq!(outcome.new_frame.expect("advance").index, 1);
    assert_eq!(scheduler.current_index(), 1);
    assert_eq!(scheduler.accumulated_time(), Duration::ZERO);
}

#[test]
fn multi_step_advance_reports_newest_frame_only() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10, 10]));
    let mut window = FrameWindow::new(5, 3);
    preload(&mut window, &[1, 2]);

    let outcome = scheduler.tick(ms(250), &mut window);
    assert_eq!(outcome.new_frame.expect("advance").index, 2);
    assert_eq!(scheduler.current_index(), 2);
    assert_eq!(scheduler.accumulated_time(), ms(50));
}

#[test]
fn playhead_only_moves_one_step_at_a_time() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10, 10, 10]));
    let mut window = FrameWindow::new(5, 4);
    // Frames 2 and 3 are decoded, frame 1 is not: completion order must
    // not let the playhead jump over the gap.
    preload(&mut window, &[2, 3]);

    let outcome = scheduler.tick(ms(500), &mut window);
    assert!(outcome.new_frame.is_none());
    assert_eq!(scheduler.current_index(), 0);
}

// ── Looping ──────────────────────────────────────────────────────

#[test]
fn infinite_loop_keeps_playing() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10]));
    let mut window = FrameWindow::new(5, 2);

    for expected_loops in 1..=3 {
        preload(&mut window, &[1, 0]);
        let outcome = scheduler.tick(ms(200), &mut window);
        assert!(!outcome.finished);
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert_eq!(scheduler.loops_completed(), expected_loops);
    }
}

#[test]
fn loop_bound_stops_playback() {
    let mut scheduler = PlaybackScheduler::new(2);
    scheduler.start(meta(&[10, 10]));
    let mut window = FrameWindow::new(5, 2);

    preload(&mut window, &[1, 0]);
    let outcome = scheduler.tick(ms(200), &mut window);
    assert!(!outcome.finished);
    assert_eq!(scheduler.loops_completed(), 1);

    preload(&mut window, &[1, 0]);
    let outcome = scheduler.tick(ms(200), &mut window);
    assert!(outcome.finished);
    assert_eq!(scheduler.state(), PlaybackState::Stopped);
    assert_eq!(scheduler.loops_completed(), 2);

    // Terminal: further ticks are inert.
    let outcome = scheduler.tick(ms(500), &mut window);
    assert!(outcome.new_frame.is_none());
    assert!(outcome.to_decode.is_empty());
}

#[test]
fn lowering_loop_bound_stops_on_the_spot() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10]));
    let mut window = FrameWindow::new(5, 2);

    preload(&mut window, &[1, 0]);
    scheduler.tick(ms(200), &mut window);
    assert_eq!(scheduler.loops_completed(), 1);

    scheduler.set_loop_bound(1);
    assert_eq!(scheduler.state(), PlaybackState::Stopped);
}

// ── Pause and resume ─────────────────────────────────────────────

#[test]
fn pause_suspends_the_clock() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10]));
    let mut window = FrameWindow::new(5, 2);
    preload(&mut window, &[1]);

    scheduler.pause();
    assert_eq!(scheduler.state(), PlaybackState::Paused);

    let outcome = scheduler.tick(Duration::from_secs(10), &mut window);
    assert!(outcome.new_frame.is_none());
    assert_eq!(scheduler.accumulated_time(), Duration::ZERO);

    scheduler.resume();
    assert_eq!(scheduler.state(), PlaybackState::Playing);
    let outcome = scheduler.tick(ms(100), &mut window);
    assert_eq!(outcome.new_frame.expect("advance").index, 1);
}

#[test]
fn resume_without_pause_is_inert() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10]));

    scheduler.resume();
    assert_eq!(scheduler.state(), PlaybackState::Playing);
}

// ── Lifecycle ────────────────────────────────────────────────────

#[test]
fn static_source_stops_immediately() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10]));
    assert_eq!(scheduler.state(), PlaybackState::Stopped);

    let mut window = FrameWindow::new(5, 1);
    let outcome = scheduler.tick(Duration::from_secs(1), &mut window);
    assert!(outcome.new_frame.is_none());
    assert!(outcome.to_decode.is_empty());
}

#[test]
fn start_resets_counters() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10]));
    let mut window = FrameWindow::new(5, 2);
    preload(&mut window, &[1, 0]);
    scheduler.tick(ms(200), &mut window);
    assert_eq!(scheduler.loops_completed(), 1);

    scheduler.start(meta(&[10, 10]));
    assert_eq!(scheduler.current_index(), 0);
    assert_eq!(scheduler.loops_completed(), 0);
    assert_eq!(scheduler.accumulated_time(), Duration::ZERO);
    assert_eq!(scheduler.state(), PlaybackState::Playing);
}

#[test]
fn tick_before_start_is_inert() {
    let mut scheduler = PlaybackScheduler::new(0);
    let mut window = FrameWindow::new(5, 3);

    assert_eq!(scheduler.state(), PlaybackState::Idle);
    let outcome = scheduler.tick(Duration::from_secs(1), &mut window);
    assert!(outcome.new_frame.is_none());
    assert!(outcome.to_decode.is_empty());

    scheduler.begin_loading();
    assert_eq!(scheduler.state(), PlaybackState::Loading);
    let outcome = scheduler.tick(Duration::from_secs(1), &mut window);
    assert!(outcome.new_frame.is_none());
}

#[test]
fn tick_requests_refill_of_missing_frames() {
    let mut scheduler = PlaybackScheduler::new(0);
    scheduler.start(meta(&[10, 10, 10]));
    let mut window = FrameWindow::new(2, 3);

    let outcome = scheduler.tick(Duration::ZERO, &mut window);
    assert_eq!(outcome.to_decode, vec![1, 2]);

    // Already pending: the next tick must not resubmit them.
    let outcome = scheduler.tick(Duration::ZERO, &mut window);
    assert!(outcome.to_decode.is_empty());
}
