//! # Listener: forwards one feed subscription to one dispatch queue.
//!
//! One listener exists per [`HandlerBinding`]. It never runs the handler itself;
//! every event becomes a unit of work on the binding's queue.
//!
//! ## Loop
//! ```text
//! loop {
//!   select (biased) {
//!     shutdown token cancelled  ─► exit Shutdown
//!     subscription.recv():
//!       None                    ─► exit FeedClosed
//!       Some(ev)                ─► queue.submit(handler(ev))   (no wait)
//!                                    └─ Err (queue closed) ─► warn, drop
//!   }
//! }
//! ```
//!
//! ## Rules
//! - Cancellation is checked first, so nothing is submitted once shutdown fired
//! - Submission is fire-and-forget; work already queued is not retracted
//! - Dropping the subscription on exit unsubscribes from the feed

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::{DispatchQueue, Work};
use crate::feeds::Subscription;
use crate::handlers::HandlerBinding;

/// Why a listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerExit {
    /// Shutdown signal observed.
    Shutdown,
    /// The feed was closed.
    FeedClosed,
}

pub(crate) struct Listener<E> {
    binding: HandlerBinding<E>,
    subscription: Subscription<E>,
    queue: Arc<dyn DispatchQueue>,
}

impl<E: Send + Sync + 'static> Listener<E> {
    pub fn new(
        binding: HandlerBinding<E>,
        subscription: Subscription<E>,
        queue: Arc<dyn DispatchQueue>,
    ) -> Self {
        Self {
            binding,
            subscription,
            queue,
        }
    }

    pub fn name(&self) -> String {
        self.binding.label()
    }

    /// Runs until shutdown or feed closure.
    pub async fn run(mut self, token: CancellationToken) -> ListenerExit {
        let exit = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break ListenerExit::Shutdown,
                msg = self.subscription.recv() => match msg {
                    Some(ev) => self.forward(ev),
                    None => break ListenerExit::FeedClosed,
                }
            }
        };
        debug!(listener = %self.binding.label(), ?exit, "listener exited");
        exit
    }

    fn forward(&self, event: Arc<E>) {
        let handler = Arc::clone(self.binding.handler());
        let work: Work = Box::pin(async move {
            handler.handle_notification(&event).await;
        });

        if let Err(e) = self.queue.submit(work) {
            warn!(
                listener = %self.binding.label(),
                reason = e.as_label(),
                "event dropped: {e}"
            );
        }
    }
}
