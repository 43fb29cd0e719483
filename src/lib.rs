//! # feedvisor
//!
//! **Feedvisor** is a small in-process notification service for Rust.
//!
//! It bridges named event sources (*feeds*) to registered handlers. Each handler
//! runs on an application-chosen dispatch queue instead of inline with the
//! publisher, so producers never wait on handler latency and each class of
//! handler gets its own ordering and concurrency guarantees.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   register_feed("blocks")   register_handler("blocks", "q1", H1)
//!                             register_handler("blocks", "q2", H2)
//!            │                          │
//!            ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  NotificationService<E>                                       │
//! │  - FeedRegistry (feeds + handler bindings)                    │
//! │  - lifecycle: Stopped ─► Running ─► Halted                    │
//! │  - shutdown CancellationToken                                 │
//! └──────┬────────────────────────────────────────────────────────┘
//!        │ dispatch("blocks", ev)
//!        ▼
//!   ┌──────────┐   inbox   ┌────────────┐  submit   ┌───────────┐
//!   │   Feed   ├──────────►│ listener 1 ├──────────►│ queue q1  ├──► H1(ev)
//!   │ "blocks" │           └────────────┘           └───────────┘
//!   │          │   inbox   ┌────────────┐  submit   ┌───────────┐
//!   │          ├──────────►│ listener 2 ├──────────►│ queue q2  ├──► H2(ev)
//!   └──────────┘           └────────────┘           └───────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Stopped:  register_feed / register_handler
//! start():  one listener per binding, subscribed before start() returns
//! Running:  dispatch() fans out; registration → InvalidLifecycle
//! stop():   Halted, shutdown token cancelled, listeners exit
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                          |
//! |-------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Service**       | Registration, lifecycle and dispatch.                      | [`NotificationService`], [`ServiceState`]   |
//! | **Handlers**      | Consume events on a dispatch queue.                        | [`EventHandler`], [`HandlerFn`]             |
//! | **Queues**        | Pluggable executors; built-in serial/concurrent queues.    | [`QueueProvider`], [`Dispatcher`]           |
//! | **Errors**        | Typed registration, dispatch and shutdown errors.          | [`NotifyError`], [`DispatchError`], [`RuntimeError`] |
//! | **Configuration** | Centralize feed inbox capacity and shutdown grace.         | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogHandler`] that writes events via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use feedvisor::{Config, Dispatcher, HandlerFn, NotificationService, QueueKind};
//!
//! #[derive(Debug)]
//! enum Chain {
//!     Block { height: u64 },
//!     Reorg { depth: u32 },
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let dispatcher = Dispatcher::new();
//!     dispatcher.register_queue("io", QueueKind::Concurrent { limit: 4 });
//!
//!     let svc: NotificationService<Chain> = NotificationService::new(cfg, dispatcher.clone());
//!     svc.register_feed("chain")?;
//!     svc.register_handler(
//!         "chain",
//!         "io",
//!         HandlerFn::arc("printer", |ev: &Chain| {
//!             let line = format!("{ev:?}");
//!             async move { println!("{line}") }
//!         }),
//!     )?;
//!
//!     svc.start()?;
//!     svc.dispatch("chain", Chain::Block { height: 1 }).await;
//!     svc.dispatch("chain", Chain::Reorg { depth: 2 }).await;
//!
//!     svc.shutdown().await?;
//!     dispatcher.shutdown(Duration::from_secs(1)).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod dispatch;
mod error;
mod feeds;
mod handlers;

// ---- Public re-exports ----

pub use core::{Config, NotificationService, ServiceState};
pub use dispatch::{DispatchQueue, Dispatcher, QueueKind, QueueProvider, Work};
pub use error::{DispatchError, NotifyError, RuntimeError};
pub use handlers::{EventHandler, HandlerFn};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use handlers::LogHandler;
