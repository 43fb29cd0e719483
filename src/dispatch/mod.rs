//! # Dispatch queues: where handler work actually runs.
//!
//! The notification service never runs handlers itself. Each listener wraps an
//! event into a unit of [`Work`] and submits it to the queue named by its
//! binding. How the queue schedules that work is the queue's business.
//!
//! ## Contract
//! - [`DispatchQueue::submit`] must not wait for the work to execute.
//! - [`QueueProvider::get_queue`] maps an opaque key to a queue.
//!
//! The crate ships [`Dispatcher`], a tokio-backed provider with serial (FIFO)
//! and bounded-concurrency queues. Any other executor can be plugged in by
//! implementing the two traits.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use feedvisor::{DispatchError, DispatchQueue, QueueProvider, Work};
//!
//! struct Inline;
//!
//! impl DispatchQueue for Inline {
//!     fn key(&self) -> &str { "inline" }
//!     fn submit(&self, work: Work) -> Result<(), DispatchError> {
//!         tokio::spawn(work);
//!         Ok(())
//!     }
//! }
//!
//! struct InlineProvider;
//!
//! impl QueueProvider for InlineProvider {
//!     fn get_queue(&self, _key: &str) -> Arc<dyn DispatchQueue> { Arc::new(Inline) }
//! }
//! ```

mod dispatcher;
mod worker;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::DispatchError;

pub use dispatcher::{Dispatcher, QueueKind};

/// A unit of work submitted to a dispatch queue.
pub type Work = BoxFuture<'static, ()>;

/// A queue-key-addressed asynchronous executor.
pub trait DispatchQueue: Send + Sync + 'static {
    /// Key this queue is registered under.
    fn key(&self) -> &str;

    /// Schedules `work` for eventual execution. Must return without waiting for it.
    fn submit(&self, work: Work) -> Result<(), DispatchError>;
}

/// Resolves queue keys to queues.
pub trait QueueProvider: Send + Sync + 'static {
    /// Returns the queue for `key`.
    fn get_queue(&self, key: &str) -> Arc<dyn DispatchQueue>;
}
