//! Bounded look-ahead buffer of decoded frames.
//!
//! [`FrameWindow`] maps frame indices to decoded bitmaps ahead of the
//! playhead, tracks which indices are currently out at the decode workers,
//! and enforces a fixed capacity: total buffered bitmap memory is bounded
//! by `capacity × frame size`, independent of the animation's frame count.
//!
//! The window is plain data. It never submits decode work itself:
//! [`schedule`](FrameWindow::schedule) and [`refill`](FrameWindow::refill)
//! tell the caller which indices need a decode task, and the engine routes
//! worker results back through [`on_decoded`](FrameWindow::on_decoded) on
//! the playback timeline. That single hand-back point is what keeps buffer
//! mutation race-free without locks.

use std::collections::{HashMap, HashSet};

use crate::decode::DecodedFrame;
use crate::error::PlaybackError;

/// Default number of decoded-ahead frames kept ready for display.
pub const DEFAULT_BUFFER_WINDOW: usize = 5;

/// Decode attempts allowed per frame slot: the initial attempt plus one
/// re-attempt. A slot that fails twice is skipped forever so a permanently
/// undecodable frame cannot stall the pool with endless resubmission.
const MAX_DECODE_ATTEMPTS: u8 = 2;

/// Bounded mapping from frame index to decoded bitmap.
#[derive(Debug)]
pub struct FrameWindow {
    capacity: usize,
    frame_count: usize,
    buffered: HashMap<usize, DecodedFrame>,
    pending: HashSet<usize>,
    attempts: HashMap<usize, u8>,
}

impl FrameWindow {
    /// Create a window holding at most `capacity` frames of an animation
    /// with `frame_count` frames.
    pub fn new(capacity: usize, frame_count: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            frame_count: frame_count.max(1),
            buffered: HashMap::new(),
            pending: HashSet::new(),
            attempts: HashMap::new(),
        }
    }

    /// Mark `index` for decoding.
    ///
    /// Returns `true` when the caller must submit a decode task. Idempotent:
    /// an index already buffered or pending is never resubmitted, and an
    /// index that has exhausted its decode attempts is skipped. Scheduling
    /// also refuses to exceed the capacity bound.
    pub fn schedule(&mut self, index: usize) -> bool {
        if self.buffered.contains_key(&index) || self.pending.contains(&index) {
            return false;
        }
        if self.attempts.get(&index).copied().unwrap_or(0) >= MAX_DECODE_ATTEMPTS {
            return false;
        }
        if self.buffered.len() + self.pending.len() >= self.capacity {
            return false;
        }

        self.pending.insert(index);
        *self.attempts.entry(index).or_insert(0) += 1;
        true
    }

    /// Merge a decode result back into the window.
    ///
    /// On success the frame becomes available for [`take`](FrameWindow::take)
    /// and the slot's attempt count resets (so the same index can be decoded
    /// again on a later loop). On failure the slot simply stays empty; the
    /// scheduler will find it missing and may reschedule it on a later tick,
    /// up to the per-slot attempt bound.
    pub fn on_decoded(&mut self, index: usize, result: Result<DecodedFrame, PlaybackError>) {
        self.pending.remove(&index);

        match result {
            Ok(frame) => {
                self.attempts.remove(&index);
                self.buffered.insert(index, frame);
            }
            Err(e) => {
                log::warn!("decode of frame {index} failed: {e}");
            }
        }
    }

    /// Consume the decoded frame at `index`, if present.
    ///
    /// Each decoded frame is consumed exactly once; ownership transfers to
    /// the caller and the slot is released.
    pub fn take(&mut self, index: usize) -> Option<DecodedFrame> {
        self.buffered.remove(&index)
    }

    /// Whether `index` is currently buffered.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.buffered.contains_key(&index)
    }

    /// Schedule up to `capacity` consecutive indices starting at `start`,
    /// wrapping modulo the frame count.
    ///
    /// Returns the indices that were newly scheduled and need a decode
    /// task submitted.
    pub fn refill(&mut self, start: usize) -> Vec<usize> {
        let span = self.capacity.min(self.frame_count);
        let mut scheduled = Vec::new();

        for offset in 0..span {
            let index = (start + offset) % self.frame_count;
            if self.schedule(index) {
                scheduled.push(index);
            }
        }

        scheduled
    }

    /// Drop all buffered frames, pending marks, and attempt history.
    pub fn clear(&mut self) {
        self.buffered.clear();
        self.pending.clear();
        self.attempts.clear();
    }

    /// Number of frames currently buffered.
    #[inline]
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    /// Number of indices currently out at the decode workers.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The fixed capacity bound.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
