//! Contract between the queue worker and the audio side
//!
//! The worker hands each drained item to a `Player` and blocks until the
//! player returns. Players built on callback-driven audio APIs can use a
//! `CompletionSignal` to turn "playback finished" callbacks into that
//! blocking call.

use super::item::{AbortFlag, Origin, QueueItem};
use crate::LexivoxError;
use log::error;
use parking_lot::{Condvar, Mutex};
use std::time::Duration;
use thiserror::Error;

/// How a single playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// The audio played to the end
    Completed,
    /// The abort flag was observed before the end
    Aborted,
}

/// The synthesis/playback hook driven by a queue worker
///
/// `play` is only ever called from the worker thread, one item at a time,
/// and must not return until the audio has finished or the item's abort
/// flag has been honoured. `stop` may be called from any thread while
/// `play` is blocked and should end the current audio immediately.
pub trait Player<P>: Send + Sync {
    fn play(&self, item: &QueueItem<P>) -> crate::Result<Playback>;

    fn stop(&self);
}

/// A playback that failed for one item
#[derive(Error, Debug)]
#[error("synthesis failed for {origin}: {source}")]
pub struct SynthesisFailure {
    pub origin: Origin,
    #[source]
    pub source: LexivoxError,
}

impl SynthesisFailure {
    pub fn new(origin: Origin, source: LexivoxError) -> Self {
        Self { origin, source }
    }
}

/// Receives per-item failures from a worker
pub trait FailureSink: Send + Sync {
    fn report(&self, failure: SynthesisFailure);
}

impl<F> FailureSink for F
where
    F: Fn(SynthesisFailure) + Send + Sync,
{
    fn report(&self, failure: SynthesisFailure) {
        self(failure)
    }
}

/// Failure sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FailureSink for LogSink {
    fn report(&self, failure: SynthesisFailure) {
        error!("{}", failure);
    }
}

/// One-shot "playback finished" latch
///
/// The audio callback calls `complete`; the worker blocks in `wait`, which
/// also returns once the item's abort flag is set.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    done: Mutex<bool>,
    cond: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the latch before starting a new playback
    pub fn reset(&self) {
        *self.done.lock() = false;
    }

    /// Mark the current playback finished
    pub fn complete(&self) {
        *self.done.lock() = true;
        self.cond.notify_all();
    }

    pub fn is_complete(&self) -> bool {
        *self.done.lock()
    }

    /// Block until `complete` is called or `abort` is set
    ///
    /// The abort flag is re-checked every `poll` interval.
    pub fn wait(&self, abort: &AbortFlag, poll: Duration) -> Playback {
        let mut done = self.done.lock();
        loop {
            if *done {
                return Playback::Completed;
            }
            if abort.is_aborted() {
                return Playback::Aborted;
            }
            self.cond.wait_for(&mut done, poll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_signal_completes_from_other_thread() {
        let signal = Arc::new(CompletionSignal::new());
        let remote = Arc::clone(&signal);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.complete();
        });

        let outcome = signal.wait(&AbortFlag::new(), Duration::from_millis(5));
        assert_eq!(outcome, Playback::Completed);
        handle.join().unwrap();
    }

    #[test]
    fn test_signal_observes_abort() {
        let signal = CompletionSignal::new();
        let abort = AbortFlag::new();
        abort.abort();
        assert_eq!(signal.wait(&abort, Duration::from_millis(5)), Playback::Aborted);
    }

    #[test]
    fn test_reset_rearms() {
        let signal = CompletionSignal::new();
        signal.complete();
        assert!(signal.is_complete());
        signal.reset();
        assert!(!signal.is_complete());
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |failure: SynthesisFailure| seen.lock().push(failure.origin);
        sink.report(SynthesisFailure::new(
            Origin::chat(),
            LexivoxError::Speech("boom".into()),
        ));
        assert_eq!(seen.lock().as_slice(), &[Origin::chat()]);
    }
}
