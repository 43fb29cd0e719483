//! # Queue workers backing the built-in dispatcher.
//!
//! ## Architecture
//! ```text
//! submit(work)
//!     │ send (never waits)
//!     ▼
//! [inbox] (unbounded) ──► worker task
//!                         ├─ Serial:     run work, then next  (FIFO)
//!                         └─ Concurrent: spawn work under a semaphore permit
//!                                        (at most `limit` in flight)
//! ```
//!
//! ## Rules
//! - **Lossless submit**: work is only rejected once the queue is closed (`QueueClosed`);
//!   load shows up as inbox depth, never as dropped units.
//! - **Panic isolation**: a panicking unit is caught, logged, and the worker continues.
//! - **Drain on close**: closing the inbox lets the worker finish everything
//!   already queued before it exits.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a handler panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, trace};

use super::{DispatchQueue, QueueKind, Work};
use crate::error::DispatchError;

/// One dispatch queue: unbounded inbox plus the task draining it.
pub(super) struct QueueWorker {
    key: String,
    kind: QueueKind,
    sender: Mutex<Option<mpsc::UnboundedSender<Work>>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl QueueWorker {
    /// Creates the queue and spawns its worker on the current tokio runtime.
    pub fn spawn(key: String, kind: QueueKind) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<Work>();
        let worker_key = key.clone();

        let join = match kind {
            QueueKind::Serial => tokio::spawn(run_serial(worker_key, rx)),
            QueueKind::Concurrent { limit } => {
                tokio::spawn(run_concurrent(worker_key, rx, limit.max(1)))
            }
        };

        Arc::new(Self {
            key,
            kind,
            sender: Mutex::new(Some(tx)),
            join: Mutex::new(Some(join)),
        })
    }

    /// Creates a queue that rejects every submission.
    pub fn closed(key: String, kind: QueueKind) -> Arc<Self> {
        Arc::new(Self {
            key,
            kind,
            sender: Mutex::new(None),
            join: Mutex::new(None),
        })
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Stops accepting work. Already queued units still run.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    /// Takes the worker's join handle (once).
    pub fn take_join(&self) -> Option<JoinHandle<()>> {
        self.join.lock().take()
    }
}

impl DispatchQueue for QueueWorker {
    fn key(&self) -> &str {
        &self.key
    }

    fn submit(&self, work: Work) -> Result<(), DispatchError> {
        let guard = self.sender.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(DispatchError::QueueClosed {
                queue: self.key.clone(),
            });
        };

        tx.send(work).map_err(|_| DispatchError::QueueClosed {
            queue: self.key.clone(),
        })
    }
}

async fn run_serial(key: String, mut rx: mpsc::UnboundedReceiver<Work>) {
    while let Some(work) = rx.recv().await {
        run_isolated(&key, work).await;
    }
    trace!(queue = %key, "serial queue drained");
}

async fn run_concurrent(key: String, mut rx: mpsc::UnboundedReceiver<Work>, limit: usize) {
    let permits = Arc::new(Semaphore::new(limit));
    let mut running = JoinSet::new();

    while let Some(work) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let unit_key = key.clone();
        running.spawn(async move {
            run_isolated(&unit_key, work).await;
            drop(permit);
        });
        while running.try_join_next().is_some() {}
    }

    while running.join_next().await.is_some() {}
    trace!(queue = %key, "concurrent queue drained");
}

/// Runs one unit of work, converting a panic into an error log.
async fn run_isolated(key: &str, work: Work) {
    if let Err(panic_err) = std::panic::AssertUnwindSafe(work).catch_unwind().await {
        let info = {
            let any = &*panic_err;
            if let Some(msg) = any.downcast_ref::<&'static str>() {
                (*msg).to_string()
            } else if let Some(msg) = any.downcast_ref::<String>() {
                msg.clone()
            } else {
                "unknown panic".to_string()
            }
        };
        error!(queue = %key, panic = %info, "unit of work panicked");
    }
}
