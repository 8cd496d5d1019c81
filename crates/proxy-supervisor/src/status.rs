//! Latest-status publication to observers

use std::sync::Mutex;

use async_channel::{Receiver, Sender, TrySendError};

/// Per-observer channel depth; a slower observer loses transitions rather
/// than building a backlog
const OBSERVER_DEPTH: usize = 16;

/// Single-slot "latest status" cell with change notifications
///
/// Observers read [`StatusCell::latest`] when they attach and follow
/// transitions on a subscribed channel. Delivery is fire-and-forget: a full
/// observer channel drops the event, a closed one drops the observer, and
/// nothing is ever queued for observers that have not attached yet.
pub struct StatusCell {
    inner: Mutex<Inner>,
}

struct Inner {
    latest: String,
    observers: Vec<Sender<String>>,
}

impl StatusCell {
    /// Create a cell seeded with the given status
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                latest: initial.into(),
                observers: Vec::new(),
            }),
        }
    }

    /// The most recently published status
    pub fn latest(&self) -> String {
        self.inner.lock().unwrap().latest.clone()
    }

    /// Subscribe to status transitions published after this call
    pub fn subscribe(&self) -> Receiver<String> {
        let (tx, rx) = async_channel::bounded(OBSERVER_DEPTH);
        self.inner.lock().unwrap().observers.push(tx);
        rx
    }

    /// Publish a new status to the slot and all live observers
    pub fn publish(&self, status: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.latest = status.to_string();
        inner.observers.retain(|tx| {
            match tx.try_send(status.to_string()) {
                Ok(()) => true,
                // Slow observer: drop the event, keep the observer.
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }
}
