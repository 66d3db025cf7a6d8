//! Source-scoped speech request queue
//!
//! A `RequestQueue` serializes speech requests onto a single player. Callers
//! on any thread enqueue and cancel; one background worker drains the queue
//! in arrival order and plays exactly one item at a time. Pending items can
//! be dropped wholesale or per origin without waiting for the worker.

pub mod item;
pub mod playback;

use crate::{LexivoxError, Result};
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub use item::{AbortFlag, Origin, QueueItem};
pub use playback::{
    CompletionSignal, FailureSink, LogSink, Playback, Player, SynthesisFailure,
};

/// Default idle wait of the worker when the queue is empty
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(100);

/// Worker tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Longest the worker sleeps on an empty queue before re-checking
    pub idle_poll: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            idle_poll: DEFAULT_IDLE_POLL,
        }
    }
}

/// The item the worker is playing right now
struct InFlight {
    origin: Origin,
    abort: AbortFlag,
}

struct QueueState<P> {
    pending: VecDeque<QueueItem<P>>,
    current: Option<InFlight>,
    running: bool,
}

struct Shared<P> {
    state: Mutex<QueueState<P>>,
    wakeup: Condvar,
    player: Arc<dyn Player<P>>,
    sink: Arc<dyn FailureSink>,
    config: QueueConfig,
}

/// Ordered speech request queue with a dedicated playback worker
pub struct RequestQueue<P: Send + 'static> {
    shared: Arc<Shared<P>>,
    worker: Option<JoinHandle<()>>,
}

impl<P: Send + 'static> RequestQueue<P> {
    /// Start a queue whose failures are only logged
    pub fn new(player: Arc<dyn Player<P>>) -> Result<Self> {
        Self::with_config(player, Arc::new(LogSink), QueueConfig::default())
    }

    /// Start a queue with an explicit failure sink and worker tuning
    pub fn with_config(
        player: Arc<dyn Player<P>>,
        sink: Arc<dyn FailureSink>,
        config: QueueConfig,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                current: None,
                running: true,
            }),
            wakeup: Condvar::new(),
            player,
            sink,
            config,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("lexivox-queue".to_string())
            .spawn(move || worker_loop(worker_shared))?;

        debug!("Speech queue started (idle poll {:?})", config.idle_poll);

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Append a request
    ///
    /// Never blocks on playback. Fails only after `shutdown` has begun.
    pub fn enqueue(&self, origin: impl Into<Origin>, payload: P) -> Result<()> {
        let item = QueueItem::new(origin, payload);
        let mut state = self.shared.state.lock();
        if !state.running {
            debug!("Rejecting request from {}: queue is shut down", item.origin());
            return Err(LexivoxError::QueueClosed);
        }

        debug!("Enqueued request from {}", item.origin());
        state.pending.push_back(item);
        drop(state);

        // The condvar is shared with `wait_idle` callers
        self.shared.wakeup.notify_all();
        Ok(())
    }

    /// Drop every pending request and stop the one being played
    pub fn cancel_all(&self) {
        let (removed, in_flight): (Vec<QueueItem<P>>, Option<AbortFlag>) = {
            let mut state = self.shared.state.lock();
            let removed = state.pending.drain(..).collect();
            let in_flight = state.current.as_ref().map(|current| {
                current.abort.abort();
                current.abort.clone()
            });
            (removed, in_flight)
        };
        self.shared.wakeup.notify_all();

        // Engines may block in stop, so it runs without the queue lock
        if let Some(flag) = in_flight {
            self.stop_if_playing(&flag);
        }

        debug!("Cancelled all speech ({} pending removed)", removed.len());
    }

    /// Stop the player if the item flagged by `flag` is still in flight
    fn stop_if_playing(&self, flag: &AbortFlag) {
        let still_playing = self
            .shared
            .state
            .lock()
            .current
            .as_ref()
            .map_or(false, |current| current.abort.same_flag(flag));
        if still_playing {
            self.shared.player.stop();
        }
    }

    /// Drop the pending requests from `origin` and abort its in-flight one
    ///
    /// Other requests keep their relative order. The in-flight item is only
    /// flagged; the player notices at its next abort check.
    pub fn cancel_from(&self, origin: &Origin) {
        let removed: Vec<QueueItem<P>> = {
            let mut state = self.shared.state.lock();
            let (removed, kept): (VecDeque<_>, VecDeque<_>) = state
                .pending
                .drain(..)
                .partition(|item| item.origin() == origin);
            state.pending = kept;

            if let Some(current) = state.current.as_ref().filter(|c| &c.origin == origin) {
                current.abort.abort();
            }
            removed.into_iter().collect()
        };
        self.shared.wakeup.notify_all();

        debug!(
            "Cancelled speech from {} ({} pending removed)",
            origin,
            removed.len()
        );
    }

    /// Origin of the item being played, if any
    pub fn currently_speaking(&self) -> Option<Origin> {
        self.shared
            .state
            .lock()
            .current
            .as_ref()
            .map(|c| c.origin.clone())
    }

    /// Origins of the pending requests, front first
    pub fn pending_origins(&self) -> Vec<Origin> {
        self.shared
            .state
            .lock()
            .pending
            .iter()
            .map(|item| item.origin().clone())
            .collect()
    }

    /// Number of pending requests, excluding the one in flight
    pub fn len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nothing pending and nothing playing
    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock();
        state.pending.is_empty() && state.current.is_none()
    }

    /// Block until the queue is idle or `timeout` elapses
    ///
    /// Returns whether the queue went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if state.pending.is_empty() && state.current.is_none() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let step = (deadline - now).min(self.shared.config.idle_poll);
            self.shared.wakeup.wait_for(&mut state, step);
        }
    }

    /// Stop the worker and release every pending request
    ///
    /// Safe to call more than once; enqueues after the first call fail.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let in_flight = {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.current.as_ref().map(|current| {
                current.abort.abort();
                current.abort.clone()
            })
        };
        self.shared.wakeup.notify_all();

        if let Some(flag) = in_flight {
            self.stop_if_playing(&flag);
        }

        if worker.join().is_err() {
            warn!("Speech queue worker panicked");
        }

        let leftover: Vec<QueueItem<P>> = self.shared.state.lock().pending.drain(..).collect();
        info!(
            "Speech queue shut down ({} pending released)",
            leftover.len()
        );
    }
}

impl<P: Send + 'static> Drop for RequestQueue<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Pop the next item, marking it in flight, or `None` once stopped
fn next_item<P>(shared: &Shared<P>) -> Option<QueueItem<P>> {
    let mut state = shared.state.lock();
    loop {
        if !state.running {
            return None;
        }

        if let Some(item) = state.pending.pop_front() {
            state.current = Some(InFlight {
                origin: item.origin().clone(),
                abort: item.abort_flag().clone(),
            });
            return Some(item);
        }

        shared.wakeup.wait_for(&mut state, shared.config.idle_poll);
    }
}

fn worker_loop<P>(shared: Arc<Shared<P>>) {
    debug!("Speech queue worker running");

    while let Some(item) = next_item(&shared) {
        let origin = item.origin().clone();
        debug!("Playing request from {}", origin);

        let result = panic::catch_unwind(AssertUnwindSafe(|| shared.player.play(&item)));
        match result {
            Ok(Ok(Playback::Completed)) => debug!("Finished request from {}", origin),
            Ok(Ok(Playback::Aborted)) => debug!("Request from {} aborted", origin),
            Ok(Err(e)) => shared.sink.report(SynthesisFailure::new(origin, e)),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                shared.sink.report(SynthesisFailure::new(
                    origin,
                    LexivoxError::Speech(format!("player panicked: {}", message)),
                ));
            }
        }

        // Releases the payload before the next item starts
        drop(item);
        shared.state.lock().current = None;
        shared.wakeup.notify_all();
    }

    debug!("Speech queue worker stopped");
}
