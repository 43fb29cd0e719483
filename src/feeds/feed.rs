//! # Feed: named multi-subscriber broadcast channel.
//!
//! Each subscriber owns a bounded inbox; [`Feed::send`] pushes the event into
//! every inbox concurrently and completes once all of them accepted it.
//!
//! ## Architecture
//! ```text
//! dispatch("blocks", ev)
//!        │                 Arc<E> per subscriber
//!        ├──────────────► [inbox 1] ──► listener 1
//!        ├──────────────► [inbox 2] ──► listener 2
//!        └──────────────► [inbox N] ──► listener N
//! ```
//!
//! ## Rules
//! - **Blocking publish**: `send()` waits for inbox space, never for handler work.
//! - **No persistence**: events sent while there are no subscribers are dropped.
//! - **Pruning**: inboxes whose receiver is gone are removed on the next send.
//! - **Close**: dropping all senders ends every subscription (`recv()` → `None`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Broadcast channel for one category of events.
pub(crate) struct Feed<E> {
    name: String,
    capacity: usize,
    closed: AtomicBool,
    subscribers: Mutex<Vec<mpsc::Sender<Arc<E>>>>,
}

impl<E: Send + Sync + 'static> Feed<E> {
    /// Creates an empty feed. Capacity is the per-subscriber inbox size (min 1).
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new subscription that observes subsequent events.
    ///
    /// Subscribing to a closed feed yields a subscription that is already closed.
    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.lock();
        if !self.closed.load(Ordering::Acquire) {
            subs.push(tx);
        }
        Subscription { rx }
    }

    /// Delivers `event` to every current subscriber.
    ///
    /// Returns the number of subscribers whose inbox accepted the event.
    pub async fn send(&self, event: E) -> usize {
        if self.is_closed() {
            return 0;
        }
        let senders: Vec<mpsc::Sender<Arc<E>>> = self.subscribers.lock().clone();
        if senders.is_empty() {
            return 0;
        }

        let event = Arc::new(event);
        let results = join_all(senders.iter().map(|tx| tx.send(Arc::clone(&event)))).await;
        let sent = results.iter().filter(|r| r.is_ok()).count();

        if sent < senders.len() {
            self.subscribers.lock().retain(|tx| !tx.is_closed());
        }
        sent
    }

    /// Closes the feed: all subscriptions end and later sends deliver to nobody.
    pub fn close(&self) {
        let mut subs = self.subscribers.lock();
        self.closed.store(true, Ordering::Release);
        subs.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| !tx.is_closed());
        subs.len()
    }
}

/// Receiving side of a feed subscription.
///
/// Dropping it unsubscribes; the feed prunes the inbox on its next send.
pub(crate) struct Subscription<E> {
    rx: mpsc::Receiver<Arc<E>>,
}

impl<E> Subscription<E> {
    /// Waits for the next event. `None` means the feed was closed.
    pub async fn recv(&mut self) -> Option<Arc<E>> {
        self.rx.recv().await
    }
}
