//! # Handler binding: which handler, fed by which feed, runs on which queue.

use std::fmt;
use std::sync::Arc;

use crate::handlers::EventHandler;

/// Wiring of one [`EventHandler`] to a feed name and a dispatch queue key.
///
/// Immutable once created. Cloning is cheap (the handler is shared).
pub(crate) struct HandlerBinding<E> {
    handler: Arc<dyn EventHandler<E>>,
    feed: String,
    queue: String,
}

impl<E: Send + Sync + 'static> HandlerBinding<E> {
    /// Binds `handler` to `feed`, running on the queue keyed `queue`.
    pub fn new(
        feed: impl Into<String>,
        queue: impl Into<String>,
        handler: Arc<dyn EventHandler<E>>,
    ) -> Self {
        Self {
            handler,
            feed: feed.into(),
            queue: queue.into(),
        }
    }

    /// The bound handler instance.
    pub fn handler(&self) -> &Arc<dyn EventHandler<E>> {
        &self.handler
    }

    /// Feed name the handler listens on.
    pub fn feed(&self) -> &str {
        &self.feed
    }

    /// Key of the queue the handler's work is submitted to.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Same handler instance, feed and queue.
    pub fn same_wiring(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
            && self.feed == other.feed
            && self.queue == other.queue
    }

    /// `feed/handler@queue`, used to name listeners in logs and shutdown reports.
    pub fn label(&self) -> String {
        format!("{}/{}@{}", self.feed, self.handler.name(), self.queue)
    }
}

impl<E> Clone for HandlerBinding<E> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            feed: self.feed.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<E> fmt::Debug for HandlerBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("feed", &self.feed)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
