//! # Core handler trait
//!
//! `EventHandler` is the extension point for consuming events from a feed. A
//! handler never runs on the publisher's task: each delivery is wrapped into a
//! unit of work and executed by the dispatch queue its binding names.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries); they block neither the
//!   publisher nor handlers on other queues.
//! - A panic is caught by the queue worker and logged; later events still arrive.
//! - The payload type `E` is shared by every feed of one service. Use an enum to
//!   carry several event categories.

use async_trait::async_trait;

/// Contract for event handlers.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use feedvisor::EventHandler;
///
/// struct Indexer;
///
/// #[async_trait]
/// impl EventHandler<u64> for Indexer {
///     async fn handle_notification(&self, height: &u64) {
///         // index block at `height`...
///         let _ = height;
///     }
///
///     fn name(&self) -> &str { "indexer" }
/// }
/// ```
#[async_trait]
pub trait EventHandler<E>: Send + Sync + 'static {
    /// Process one event.
    async fn handle_notification(&self, event: &E);

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
