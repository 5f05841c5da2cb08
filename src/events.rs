//! Lifecycle events and the listener seam.
//!
//! The engine reports load/error lifecycle through plain data events, not
//! tied to any UI-framework callback convention. Hosts implement
//! [`PlaybackListener`] and receive every event on the playback timeline
//! thread (the thread that calls [`tick`](crate::PlaybackEngine::tick)),
//! never from a decode worker.

/// A lifecycle signal emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackEvent {
    /// A new source was assigned; fired before any bytes are fetched.
    /// Exactly once per `set_source`.
    LoadStart,
    /// The first frame is decoded and displayed. Exactly once per
    /// successful load.
    Loaded {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
        /// Number of frames in the animation.
        frame_count: usize,
    },
    /// The load reached success or terminal failure. Exactly once per
    /// `set_source` that runs to completion (a source superseded mid-flight
    /// emits no `LoadEnd` of its own).
    LoadEnd,
    /// A failure surfaced; carries a human-readable reason.
    Error(String),
}

/// Observer for engine lifecycle events.
///
/// Implementations must be `Send + Sync` so the engine can be handed
/// between threads, but events themselves always fire on the timeline
/// thread. Listeners are infallible: they observe, they cannot halt the
/// engine.
pub trait PlaybackListener: Send + Sync {
    /// Called for every lifecycle event, in emission order.
    fn on_event(&self, event: &PlaybackEvent);
}

/// Default listener that discards all events.
pub(crate) struct NoOpListener;

impl PlaybackListener for NoOpListener {
    fn on_event(&self, _event: &PlaybackEvent) {}
}
