//! Queue entries and their origin tags

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Logical source of a speech request
///
/// Origins are opaque to the queue; they are only compared for equality
/// when cancelling. A few common ones have constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin(String);

impl Origin {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Chat messages
    pub fn chat() -> Self {
        Self::new("chat")
    }

    /// Dialogue boxes
    pub fn dialogue() -> Self {
        Self::new("dialogue")
    }

    /// Battle dialogue popups
    pub fn battle_dialogue() -> Self {
        Self::new("battle-dialogue")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Origin {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Origin {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Origin {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Cooperative cancellation flag shared between a queue and its worker
///
/// Set at most once; playback hooks poll it at safe points.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Whether both handles belong to the same item
    pub fn same_flag(&self, other: &AbortFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A speech request waiting in, or drained from, a queue
///
/// Dropping the item releases whatever the payload owns, so removing an
/// item from the queue is also what frees its resources.
#[derive(Debug)]
pub struct QueueItem<P> {
    origin: Origin,
    payload: P,
    abort: AbortFlag,
}

impl<P> QueueItem<P> {
    pub fn new(origin: impl Into<Origin>, payload: P) -> Self {
        Self {
            origin: origin.into(),
            payload,
            abort: AbortFlag::new(),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn abort_flag(&self) -> &AbortFlag {
        &self.abort
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_equality() {
        assert_eq!(Origin::chat(), "chat");
        assert_eq!(Origin::from("battle-dialogue"), Origin::battle_dialogue());
        assert_ne!(Origin::chat(), Origin::dialogue());
    }

    #[test]
    fn test_abort_flag_is_shared() {
        let item = QueueItem::new("chat", ());
        let flag = item.abort_flag().clone();
        assert!(!item.is_aborted());
        flag.abort();
        assert!(item.is_aborted());
        assert!(flag.same_flag(item.abort_flag()));
        assert!(!flag.same_flag(&AbortFlag::new()));
    }
}
