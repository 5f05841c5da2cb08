//! The decode coordinator: worker pool, generation tokens, and the
//! playback timeline.
//!
//! [`PlaybackEngine`] glues the loader, extractor, and decoder to the
//! frame window and scheduler. Loading and decoding run on a small pool of
//! worker threads; the timeline (whichever host thread calls
//! [`tick`](PlaybackEngine::tick)) is the single writer of all window and
//! scheduler state and never blocks. Workers compute results and hand them
//! back through a channel; the timeline drains that channel at tick time,
//! which keeps buffer mutation race-free without locks.
//!
//! Every submitted job carries the generation token current at submission.
//! Assigning a new source bumps the generation, so results from a
//! superseded source are discarded on arrival instead of being written
//! into the new source's buffer. No job is force-killed mid-flight;
//! stale-result discard is the whole cancellation mechanism.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use flipbook::{EngineOptions, PlaybackEngine, PlaybackState, SourceLocator};
//!
//! let mut engine = PlaybackEngine::new(EngineOptions::new().with_loop_count(1));
//! engine.set_source(SourceLocator::parse("animation.gif"));
//!
//! // Host render loop: tick with the elapsed wall time.
//! while engine.state() != PlaybackState::Stopped {
//!     if engine.tick(Duration::from_millis(16)) {
//!         let frame = engine.current_frame().unwrap();
//!         // upload frame.data to the display surface
//!     }
//!     std::thread::sleep(Duration::from_millis(16));
//! }
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::decode::{DecodedFrame, FrameDecoder};
use crate::error::PlaybackError;
use crate::events::{PlaybackEvent, PlaybackListener};
use crate::loader::{SourceLoader, SourceLocator};
use crate::metadata::{self, AnimationMetadata};
use crate::options::EngineOptions;
use crate::scheduler::{PlaybackScheduler, PlaybackState};
use crate::window::FrameWindow;

/// Work submitted to the decode pool.
enum DecodeJob {
    /// Resolve a source end to end: bytes, metadata, and frame 0.
    Load {
        generation: u64,
        locator: SourceLocator,
        loader: Arc<SourceLoader>,
    },
    /// Decode one frame of the active source.
    Frame {
        generation: u64,
        index: usize,
        decoder: Arc<FrameDecoder>,
    },
}

/// Results handed back onto the playback timeline.
enum DecodeReply {
    Loaded {
        generation: u64,
        decoder: Arc<FrameDecoder>,
        first_frame: DecodedFrame,
    },
    LoadFailed {
        generation: u64,
        error: PlaybackError,
    },
    FrameDone {
        generation: u64,
        index: usize,
        result: Result<DecodedFrame, PlaybackError>,
    },
}

/// Decoder and window for the source currently assigned. Torn down as one
/// unit when the source changes.
struct ActiveSource {
    decoder: Arc<FrameDecoder>,
    window: FrameWindow,
}

/// Animated-image playback engine.
///
/// See the [module docs](self) for the threading model. The engine is
/// `Send` but not `Sync`: all of its methods belong to the single playback
/// timeline thread.
pub struct PlaybackEngine {
    loader: Arc<SourceLoader>,
    listener: Arc<dyn PlaybackListener>,
    buffer_window: usize,
    generation: u64,
    scheduler: PlaybackScheduler,
    active: Option<ActiveSource>,
    current_frame: Option<DecodedFrame>,
    job_tx: Option<Sender<DecodeJob>>,
    reply_rx: Receiver<DecodeReply>,
    workers: Vec<JoinHandle<()>>,
}

impl PlaybackEngine {
    /// Create an engine and spawn its decode worker pool.
    pub fn new(options: EngineOptions) -> Self {
        let mut loader = SourceLoader::new().with_search_paths(options.search_paths.clone());
        if let Some(fetcher) = options.fetcher.clone() {
            loader = loader.with_fetcher(fetcher);
        }

        let (job_tx, job_rx) = unbounded::<DecodeJob>();
        let (reply_tx, reply_rx) = unbounded::<DecodeReply>();

        let workers = (0..options.worker_threads)
            .map(|i| {
                let jobs = job_rx.clone();
                let replies = reply_tx.clone();
                thread::Builder::new()
                    .name(format!("flipbook-decode-{i}"))
                    .spawn(move || run_worker(&jobs, &replies))
                    .unwrap_or_else(|e| panic!("failed to spawn decode worker: {e}"))
            })
            .collect();

        Self {
            loader: Arc::new(loader),
            listener: options.listener,
            buffer_window: options.buffer_window,
            generation: 0,
            scheduler: PlaybackScheduler::new(options.loop_count),
            active: None,
            current_frame: None,
            job_tx: Some(job_tx),
            reply_rx,
            workers,
        }
    }

    /// Assign a new source, superseding any in-flight load.
    ///
    /// Bumps the generation token (stale results will be discarded on
    /// arrival), releases all buffered and pending state, emits
    /// [`PlaybackEvent::LoadStart`], and submits the load to the pool. The
    /// previously displayed frame persists until the new source's first
    /// frame is ready.
    pub fn set_source(&mut self, locator: SourceLocator) {
        self.generation += 1;
        self.active = None;
        self.scheduler.begin_loading();
        self.emit(PlaybackEvent::LoadStart);

        log::debug!("loading source {locator} (generation {})", self.generation);
        self.submit(DecodeJob::Load {
            generation: self.generation,
            locator,
            loader: Arc::clone(&self.loader),
        });
    }

    /// Change the loop bound; 0 means infinite. Applies to in-progress
    /// playback.
    pub fn set_loop_count(&mut self, loops: u32) {
        self.scheduler.set_loop_bound(loops);
    }

    /// Suspend the advance loop, keeping the displayed frame.
    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    /// Resume a paused animation.
    pub fn resume(&mut self) {
        self.scheduler.resume();
    }

    /// Drive the engine by `delta` of wall time.
    ///
    /// Drains worker results, advances the playhead, and tops the window
    /// back up. Returns `true` when the visible frame changed, so hosts
    /// know to re-upload it.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let mut changed = self.drain_replies();

        let Some(active) = self.active.as_mut() else {
            return changed;
        };

        let outcome = self.scheduler.tick(delta, &mut active.window);
        let decoder = Arc::clone(&active.decoder);

        for index in outcome.to_decode {
            self.submit(DecodeJob::Frame {
                generation: self.generation,
                index,
                decoder: Arc::clone(&decoder),
            });
        }

        if let Some(frame) = outcome.new_frame {
            self.current_frame = Some(frame);
            changed = true;
        }
        if outcome.finished {
            log::debug!(
                "playback finished after {} loops",
                self.scheduler.loops_completed()
            );
        }

        changed
    }

    /// The currently visible decoded frame, if any.
    #[inline]
    pub fn current_frame(&self) -> Option<&DecodedFrame> {
        self.current_frame.as_ref()
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// The playhead index.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.scheduler.current_index()
    }

    /// Completed loop count for the active source.
    #[inline]
    pub fn loops_completed(&self) -> u32 {
        self.scheduler.loops_completed()
    }

    /// Metadata of the active source, once loaded.
    pub fn current_metadata(&self) -> Option<&Arc<AnimationMetadata>> {
        self.active.as_ref().map(|a| a.decoder.metadata())
    }

    /// Tear the engine down: stale-mark all in-flight work and release
    /// every buffered, pending, and displayed frame.
    ///
    /// The worker pool stays alive for a later `set_source`; dropping the
    /// engine shuts it down.
    pub fn detach(&mut self) {
        self.generation += 1;
        self.active = None;
        self.current_frame = None;
        self.scheduler.reset();
    }

    /// Pull every completed worker result onto the timeline.
    fn drain_replies(&mut self) -> bool {
        let mut changed = false;
        let replies: Vec<DecodeReply> = self.reply_rx.try_iter().collect();

        for reply in replies {
            match reply {
                DecodeReply::Loaded {
                    generation,
                    decoder,
                    first_frame,
                } => {
                    if generation != self.generation {
                        log::debug!("discarding stale load (generation {generation})");
                        continue;
                    }

                    let meta = Arc::clone(decoder.metadata());
                    let mut window = FrameWindow::new(self.buffer_window, meta.frame_count());

                    self.current_frame = Some(first_frame);
                    self.scheduler.start(Arc::clone(&meta));
                    changed = true;

                    self.emit(PlaybackEvent::Loaded {
                        width: meta.width(),
                        height: meta.height(),
                        frame_count: meta.frame_count(),
                    });
                    self.emit(PlaybackEvent::LoadEnd);

                    // Prime the look-ahead window so playback does not
                    // spend its first frame duration waiting on decodes.
                    if meta.is_animated() {
                        for index in window.refill(1) {
                            self.submit(DecodeJob::Frame {
                                generation,
                                index,
                                decoder: Arc::clone(&decoder),
                            });
                        }
                    }

                    self.active = Some(ActiveSource { decoder, window });
                }
                DecodeReply::LoadFailed { generation, error } => {
                    if generation != self.generation {
                        log::debug!("discarding stale load failure (generation {generation})");
                        continue;
                    }

                    log::warn!("source load failed: {error}");
                    self.scheduler.fail();
                    self.emit(PlaybackEvent::Error(error.to_string()));
                    self.emit(PlaybackEvent::LoadEnd);
                }
                DecodeReply::FrameDone {
                    generation,
                    index,
                    result,
                } => {
                    if generation != self.generation {
                        log::debug!("discarding stale frame {index} (generation {generation})");
                        continue;
                    }
                    if let Some(active) = self.active.as_mut() {
                        active.window.on_decoded(index, result);
                    }
                }
            }
        }

        changed
    }

    fn submit(&self, job: DecodeJob) {
        if let Some(tx) = &self.job_tx {
            if tx.send(job).is_err() {
                log::error!("decode pool is gone; dropping job");
            }
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        self.listener.on_event(&event);
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        // Closing the job channel lets every worker run off the end of its
        // receive loop.
        self.job_tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Worker loop: pull jobs until the engine closes the channel.
fn run_worker(jobs: &Receiver<DecodeJob>, replies: &Sender<DecodeReply>) {
    for job in jobs.iter() {
        let reply = match job {
            DecodeJob::Load {
                generation,
                locator,
                loader,
            } => match load_source(&loader, &locator) {
                Ok((decoder, first_frame)) => DecodeReply::Loaded {
                    generation,
                    decoder,
                    first_frame,
                },
                Err(error) => DecodeReply::LoadFailed { generation, error },
            },
            DecodeJob::Frame {
                generation,
                index,
                decoder,
            } => DecodeReply::FrameDone {
                generation,
                index,
                result: decoder.decode(index),
            },
        };

        if replies.send(reply).is_err() {
            // Engine dropped while we were working; nothing left to do.
            break;
        }
    }
}

/// Resolve a source end to end: fetch bytes, extract metadata, and decode
/// frame 0 directly, bypassing the windowed path so the first paint is
/// never blank. Runs entirely on a worker.
fn load_source(
    loader: &SourceLoader,
    locator: &SourceLocator,
) -> Result<(Arc<FrameDecoder>, DecodedFrame), PlaybackError> {
    let bytes: Arc<[u8]> = loader.load(locator)?.into();
    let meta = Arc::new(metadata::extract(&bytes)?);
    let decoder = Arc::new(FrameDecoder::new(bytes, meta));
    let first_frame = decoder.decode(0)?;
    Ok((decoder, first_frame))
}
