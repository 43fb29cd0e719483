//! # Example: block_feed
//!
//! Wires two feeds of a block-processing pipeline to handlers on separate queues.
//!
//! Shows how to:
//! - Carry a typed event enum across several feeds.
//! - Put a slow handler on its own serial queue and a tap on a concurrent one.
//! - Attach the built-in [`LogHandler`].
//! - Shut the service and the dispatcher down in order.
//!
//! ## Flow
//! ```text
//! dispatch("blocks", Block)     ──► listener ──► queue "store"  (serial)      ──► Store
//!                               └─► listener ──► queue "taps"   (concurrent)  ──► LogHandler
//! dispatch("rejections", Error) ──► listener ──► queue "taps"                  ──► LogHandler
//! dispatch("unknown", ..)       ──► nobody
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example block_feed --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use feedvisor::{
    Config, Dispatcher, EventHandler, LogHandler, NotificationService, QueueKind,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Reasons a block is rejected by the state transition.
#[derive(Error, Debug, Clone)]
enum TransitionError {
    #[error("slot mismatch: expected {expected}, got {got}")]
    SlotMismatch { expected: u64, got: u64 },

    #[error("randao mix mismatch")]
    RandaoMixMismatch,
}

#[derive(Debug, Clone)]
enum Chain {
    Block { slot: u64 },
    Rejected(TransitionError),
}

/// Pretends to persist blocks; slow on purpose.
struct Store {
    head: AtomicU64,
}

#[async_trait]
impl EventHandler<Chain> for Store {
    async fn handle_notification(&self, event: &Chain) {
        if let Chain::Block { slot } = event {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.head.store(*slot, Ordering::SeqCst);
        }
    }

    fn name(&self) -> &str {
        "store"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::default();
    let dispatcher = Dispatcher::new();
    dispatcher.register_queue("store", QueueKind::Serial);
    dispatcher.register_queue("taps", QueueKind::Concurrent { limit: 8 });

    let svc: NotificationService<Chain> = NotificationService::new(cfg, dispatcher.clone());
    let store = Arc::new(Store {
        head: AtomicU64::new(0),
    });
    let tap = Arc::new(LogHandler::new("tap"));

    svc.register_feed("blocks")?;
    svc.register_feed("rejections")?;
    svc.register_handler("blocks", "store", store.clone())?;
    svc.register_handler("blocks", "taps", tap.clone())?;
    svc.register_handler("rejections", "taps", tap)?;
    svc.start()?;

    for slot in 1..=5 {
        svc.dispatch("blocks", Chain::Block { slot }).await;
    }
    svc.dispatch(
        "rejections",
        Chain::Rejected(TransitionError::SlotMismatch {
            expected: 6,
            got: 8,
        }),
    )
    .await;
    svc.dispatch("rejections", Chain::Rejected(TransitionError::RandaoMixMismatch))
        .await;
    // Nobody listens here; the event is silently dropped.
    svc.dispatch("unknown", Chain::Block { slot: 0 }).await;

    svc.shutdown().await?;
    dispatcher.shutdown(Duration::from_secs(2)).await?;

    println!("store head = {}", store.head.load(Ordering::SeqCst));
    Ok(())
}
