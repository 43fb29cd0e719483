//! # Dispatcher: tokio-backed registry of dispatch queues.
//!
//! [`Dispatcher`] maps queue keys to workers. Queues are registered up front with
//! an explicit [`QueueKind`], or created lazily as serial queues the first time a
//! key is looked up.
//!
//! ## Shutdown
//! ```text
//! shutdown(grace)
//!   ├─► close every inbox (submit → QueueClosed)
//!   ├─► wait up to `grace` for workers to drain queued work
//!   │     ├─ Ok (all joined) → Ok(())
//!   │     └─ timeout        → abort stragglers, GraceExceeded{stuck}
//!   └─► later lookups return closed queues
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::worker::QueueWorker;
use super::{DispatchQueue, QueueProvider};
use crate::error::RuntimeError;

/// Scheduling discipline of a dispatch queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueKind {
    /// One unit at a time, in submission order.
    #[default]
    Serial,
    /// Up to `limit` units in flight; no ordering between them.
    Concurrent {
        /// Maximum number of units running at once (min 1).
        limit: usize,
    },
}

/// Built-in [`QueueProvider`] running each queue on its own tokio task.
///
/// Queues must be created from within a tokio runtime.
pub struct Dispatcher {
    closed: AtomicBool,
    queues: Mutex<HashMap<String, Arc<QueueWorker>>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            queues: Mutex::new(HashMap::new()),
        })
    }

    /// Registers a queue under `key`.
    ///
    /// Idempotent: if the key already exists the existing queue is returned
    /// unchanged (a differing `kind` is logged and ignored).
    pub fn register_queue(&self, key: impl Into<String>, kind: QueueKind) -> Arc<dyn DispatchQueue> {
        let key = key.into();
        let mut queues = self.queues.lock();
        if let Some(existing) = queues.get(&key) {
            if existing.kind() != kind {
                warn!(queue = %key, existing = ?existing.kind(), requested = ?kind, "queue already registered with another kind");
            }
            return Arc::clone(existing) as Arc<dyn DispatchQueue>;
        }
        let worker = self.make_queue(key.clone(), kind);
        queues.insert(key, Arc::clone(&worker));
        worker
    }

    /// Returns sorted list of registered queue keys.
    pub fn queue_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.queues.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Closes every queue and waits up to `grace` for queued work to finish.
    ///
    /// `Duration::ZERO` closes the queues without waiting.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.closed.store(true, Ordering::Release);
        let workers: Vec<(String, Arc<QueueWorker>)> = self.queues.lock().drain().collect();

        let mut joins: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(workers.len());
        for (key, worker) in &workers {
            worker.close();
            if let Some(join) = worker.take_join() {
                joins.push((key.clone(), join));
            }
        }
        if grace == Duration::ZERO {
            return Ok(());
        }

        let done = async {
            for (_, join) in joins.iter_mut() {
                let _ = join.await;
            }
        };
        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                debug!(queues = joins.len(), "dispatcher drained");
                Ok(())
            }
            Err(_) => {
                let mut stuck = Vec::new();
                for (key, join) in &joins {
                    if !join.is_finished() {
                        join.abort();
                        stuck.push(key.clone());
                    }
                }
                stuck.sort_unstable();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    fn make_queue(&self, key: String, kind: QueueKind) -> Arc<QueueWorker> {
        if self.closed.load(Ordering::Acquire) {
            return QueueWorker::closed(key, kind);
        }
        debug!(queue = %key, ?kind, "queue created");
        QueueWorker::spawn(key, kind)
    }
}

impl QueueProvider for Dispatcher {
    /// Returns the queue for `key`, creating a serial queue if it is unknown.
    fn get_queue(&self, key: &str) -> Arc<dyn DispatchQueue> {
        let mut queues = self.queues.lock();
        if let Some(existing) = queues.get(key) {
            return Arc::clone(existing) as Arc<dyn DispatchQueue>;
        }
        let worker = self.make_queue(key.to_string(), QueueKind::Serial);
        queues.insert(key.to_string(), Arc::clone(&worker));
        worker
    }
}
