//! # Event handlers and their bindings.
//!
//! ## Architecture
//! ```text
//! Feed ──► listener ──► queue.submit(work) ──► [dispatch queue] ──► handler.handle_notification(&E)
//!  (one listener per HandlerBinding{feed, queue, handler})
//! ```
//!
//! ## Contents
//! - [`EventHandler`] the handler contract
//! - [`HandlerFn`] closure-backed handler
//! - `HandlerBinding` wiring of a handler to a feed and a queue (internal)
//! - `LogHandler` tracing-backed handler (feature `logging`)

mod binding;
mod handler;
mod handler_fn;
#[cfg(feature = "logging")]
mod log;

pub(crate) use binding::HandlerBinding;
pub use handler::EventHandler;
pub use handler_fn::HandlerFn;
#[cfg(feature = "logging")]
pub use log::LogHandler;
