#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedvisor::{DispatchError, DispatchQueue, EventHandler, QueueProvider, Work};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

pub const WAIT: Duration = Duration::from_secs(2);

/// State-transition failures, carried as opaque notification payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("block slot too low: {slot}")]
    BlockSlotTooLow { slot: u64 },

    #[error("slot mismatch: expected {expected}, got {got}")]
    SlotMismatch { expected: u64, got: u64 },

    #[error("parent root mismatch")]
    ParentRootMismatch,

    #[error("block exceeds deposit limit: {count} > {limit}")]
    ExceedsBlockDepositLimit { count: u64, limit: u64 },
}

/// Queue provider that records every submission by queue key, then runs the
/// work on a fresh tokio task.
#[derive(Clone, Default)]
pub struct RecordingQueues {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingQueues {
    pub fn submissions(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.log.lock().iter().filter(|k| k.as_str() == key).count()
    }
}

struct RecordingQueue {
    key: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl DispatchQueue for RecordingQueue {
    fn key(&self) -> &str {
        &self.key
    }

    fn submit(&self, work: Work) -> Result<(), DispatchError> {
        self.log.lock().push(self.key.clone());
        tokio::spawn(work);
        Ok(())
    }
}

impl QueueProvider for RecordingQueues {
    fn get_queue(&self, key: &str) -> Arc<dyn DispatchQueue> {
        Arc::new(RecordingQueue {
            key: key.to_string(),
            log: Arc::clone(&self.log),
        })
    }
}

/// Handler forwarding `(handler name, event)` to a channel.
pub struct Collector<E> {
    name: &'static str,
    tx: mpsc::UnboundedSender<(&'static str, E)>,
}

impl<E> Collector<E> {
    pub fn arc(name: &'static str, tx: mpsc::UnboundedSender<(&'static str, E)>) -> Arc<Self> {
        Arc::new(Self { name, tx })
    }
}

#[async_trait]
impl<E> EventHandler<E> for Collector<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn handle_notification(&self, event: &E) {
        let _ = self.tx.send((self.name, event.clone()));
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Receives the next item or panics after [`WAIT`].
pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for handler")
        .expect("channel closed")
}

/// Gives spawned listeners and queue work a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
