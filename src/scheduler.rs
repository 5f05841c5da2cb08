//! Playback state machine and the per-tick advance algorithm.
//!
//! [`PlaybackScheduler`] owns the playhead: current frame index, the
//! elapsed-time accumulator, and the loop counter. It is driven by the
//! host's clock: each [`tick`](PlaybackScheduler::tick) receives the wall
//! time elapsed since the previous tick and consumes frames from the
//! [`FrameWindow`](crate::FrameWindow) as their display durations expire.
//!
//! A tick that finds the next frame missing never waits: it clamps the
//! accumulator to the current frame's duration and defers advancement to a
//! later tick. Without the clamp, a temporarily slow decode would bank up
//! elapsed time and release it as a burst of skipped frames once decoding
//! catches up.

use std::sync::Arc;
use std::time::Duration;

use crate::decode::DecodedFrame;
use crate::metadata::{AnimationMetadata, DEFAULT_FRAME_DURATION};
use crate::window::FrameWindow;

/// Lifecycle state of the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No source assigned yet.
    Idle,
    /// Source bytes, metadata, or the first frame are in flight.
    Loading,
    /// The clock-driven advance loop is running.
    Playing,
    /// Playback suspended by the host; the displayed frame persists.
    Paused,
    /// Terminal: static image, or the configured loop bound was reached.
    /// The displayed frame persists.
    Stopped,
    /// Terminal: the current source failed to load or decode.
    Failed,
}

/// What one tick produced.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// The newest frame consumed this tick, if the playhead advanced.
    /// Intermediate frames of a multi-step advance are dropped.
    pub new_frame: Option<DecodedFrame>,
    /// Indices the caller must submit decode tasks for.
    pub to_decode: Vec<usize>,
    /// `true` when this tick hit the loop bound and stopped playback.
    pub finished: bool,
}

/// Clock-driven playhead over one animation.
#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    metadata: Option<Arc<AnimationMetadata>>,
    current_index: usize,
    accumulated: Duration,
    loops_completed: u32,
    loop_bound: u32,
}

impl PlaybackScheduler {
    /// Create an idle scheduler. `loop_bound` of 0 means loop forever.
    pub fn new(loop_bound: u32) -> Self {
        Self {
            state: PlaybackState::Idle,
            metadata: None,
            current_index: 0,
            accumulated: Duration::ZERO,
            loops_completed: 0,
            loop_bound,
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The frame index currently displayed (the playhead).
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// How many times the playhead has wrapped back to frame 0.
    #[inline]
    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    /// Elapsed time accumulated against the current frame's duration.
    #[inline]
    pub fn accumulated_time(&self) -> Duration {
        self.accumulated
    }

    /// The configured loop bound (0 = infinite).
    #[inline]
    pub fn loop_bound(&self) -> u32 {
        self.loop_bound
    }

    /// Enter `Loading`: a new source's pipeline has started.
    pub fn begin_loading(&mut self) {
        self.state = PlaybackState::Loading;
        self.metadata = None;
        self.current_index = 0;
        self.accumulated = Duration::ZERO;
        self.loops_completed = 0;
    }

    /// Enter the terminal `Failed` state.
    pub fn fail(&mut self) {
        self.state = PlaybackState::Failed;
    }

    /// Return to `Idle`, dropping the current animation.
    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.metadata = None;
        self.current_index = 0;
        self.accumulated = Duration::ZERO;
        self.loops_completed = 0;
    }

    /// First frame is displayed: start the clock, or stop immediately for
    /// a static image (no clock for a single frame).
    pub fn start(&mut self, metadata: Arc<AnimationMetadata>) {
        self.current_index = 0;
        self.accumulated = Duration::ZERO;
        self.loops_completed = 0;
        self.state = if metadata.is_animated() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        };
        self.metadata = Some(metadata);
    }

    /// Suspend the advance loop. Only meaningful while `Playing`.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume a paused animation.
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Change the loop bound; applies to in-progress playback.
    ///
    /// If the new bound has already been met, playback stops on the spot.
    pub fn set_loop_bound(&mut self, loop_bound: u32) {
        self.loop_bound = loop_bound;
        if loop_bound > 0
            && self.loops_completed >= loop_bound
            && matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
        {
            self.state = PlaybackState::Stopped;
        }
    }

    /// Advance the playhead by `delta` of wall time.
    ///
    /// While the accumulator covers the current frame's duration and the
    /// next frame is buffered, consume it: advance one position, subtract
    /// the predecessor's duration, and count loop wraps against the bound.
    /// The playhead only ever moves `+1 mod frame_count` per step,
    /// regardless of decode completion order.
    ///
    /// After the advance loop the window is refilled for the span starting
    /// after the playhead, whether or not an advance happened; the returned
    /// [`TickOutcome::to_decode`] indices need decode tasks submitted.
    pub fn tick(&mut self, delta: Duration, window: &mut FrameWindow) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::default();
        }
        let Some(metadata) = self.metadata.clone() else {
            return TickOutcome::default();
        };

        let frame_count = metadata.frame_count();
        self.accumulated += delta;

        let mut newest = None;
        let mut finished = false;

        loop {
            let current_duration = metadata
                .frame_duration(self.current_index)
                .unwrap_or(DEFAULT_FRAME_DURATION);
            if self.accumulated < current_duration {
                break;
            }

            let next = (self.current_index + 1) % frame_count;
            match window.take(next) {
                Some(frame) => {
                    self.accumulated -= current_duration;
                    self.current_index = next;
                    newest = Some(frame);

                    if next == 0 {
                        self.loops_completed += 1;
                        if self.loop_bound > 0 && self.loops_completed >= self.loop_bound {
                            self.state = PlaybackState::Stopped;
                            finished = true;
                            break;
                        }
                    }
                }
                None => {
                    // Next frame not decoded yet: defer, and clamp the
                    // accumulator so the wait cannot bank up skipped frames.
                    self.accumulated = self.accumulated.min(current_duration);
                    break;
                }
            }
        }

        let to_decode = if self.state == PlaybackState::Playing {
            window.refill((self.current_index + 1) % frame_count)
        } else {
            Vec::new()
        };

        TickOutcome {
            new_frame: newest,
            to_decode,
            finished,
        }
    }
}
