//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(&E) -> Fut`. The closure runs
//! synchronously on the queue worker, so it can copy what it needs out of the
//! borrowed event before returning its `'static` future.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use feedvisor::{EventHandler, HandlerFn};
//!
//! let last = Arc::new(AtomicU64::new(0));
//! let seen = Arc::clone(&last);
//! let h = HandlerFn::arc("tracker", move |height: &u64| {
//!     let height = *height;
//!     let seen = Arc::clone(&seen);
//!     async move { seen.store(height, Ordering::SeqCst) }
//! });
//!
//! assert_eq!(EventHandler::<u64>::name(h.as_ref()), "tracker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::handlers::EventHandler;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when registering it right away.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<E, F, Fut> EventHandler<E> for HandlerFn<F>
where
    E: Send + Sync + 'static,
    F: Fn(&E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle_notification(&self, event: &E) {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
