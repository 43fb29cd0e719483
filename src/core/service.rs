//! # NotificationService: feeds, handler bindings, listeners and lifecycle.
//!
//! The [`NotificationService`] owns the [`FeedRegistry`], the shutdown token and
//! the listener tasks that connect feeds to dispatch queues.
//!
//! ## Key responsibilities
//! - accept feed and handler registrations while **stopped**
//! - on `start()`, spawn one listener per binding from the registry snapshot
//! - publish events into feeds (`dispatch`)
//! - signal shutdown (`stop`), optionally waiting for listeners (`shutdown`)
//! - tie shutdown to an external trigger (`run_until`) or OS signals (`run_until_signal`)
//!
//! ## High-level architecture
//! ```text
//! Registration (Stopped):
//!   register_feed("blocks")                   ──► FeedRegistry.feeds
//!   register_handler("blocks", "q1", H)       ──► FeedRegistry.bindings
//!
//! start():
//!   for (feed, binding) in registry.wiring():
//!       feed.subscribe() ─► Listener{binding, subscription, queues.get_queue(key)}
//!                         └► tokio::spawn(listener.run(shutdown.child_token()))
//!
//! dispatch("blocks", ev):
//!   Feed ─► [inbox L1] ─► listener 1 ─► queue "q1".submit(H1(ev))
//!        └► [inbox L2] ─► listener 2 ─► queue "q2".submit(H2(ev))
//!
//! stop():     state = Halted, shutdown.cancel()   (no wait)
//! shutdown(): stop() + wait up to Config::grace for listeners
//! ```
//!
//! ## Rules
//! - Registration and `start` take the same write lock: a registration can
//!   never race past the wiring snapshot
//! - Registering after `start` is rejected with [`NotifyError::InvalidLifecycle`]
//!   (`is_fatal()`), and nothing is mutated
//! - Dispatch to an unknown feed, or after `stop`, delivers to nobody
//! - No lock is held across an `.await`
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use feedvisor::{Config, Dispatcher, HandlerFn, NotificationService};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let dispatcher = Dispatcher::new();
//!     let svc: NotificationService<u64> = NotificationService::new(cfg, dispatcher.clone());
//!
//!     svc.register_feed("blocks")?;
//!     svc.register_handler(
//!         "blocks",
//!         "indexer",
//!         HandlerFn::arc("print", |height: &u64| {
//!             let height = *height;
//!             async move { println!("block {height}") }
//!         }),
//!     )?;
//!
//!     svc.start()?;
//!     svc.dispatch("blocks", 1).await;
//!     svc.shutdown().await?;
//!     dispatcher.shutdown(std::time::Duration::from_secs(1)).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::core::{
    config::Config,
    listener::{Listener, ListenerExit},
    registry::FeedRegistry,
    state::ServiceState,
};
use crate::dispatch::QueueProvider;
use crate::error::{NotifyError, RuntimeError};
use crate::handlers::{EventHandler, HandlerBinding};

/// Handle to a running listener.
struct ListenerHandle {
    name: String,
    join: JoinHandle<ListenerExit>,
}

/// Held by a listener task; decrements the live count when the task ends or is aborted.
struct LiveGuard(Arc<watch::Sender<usize>>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Lifecycle state and registry, guarded together.
struct Inner<E> {
    state: ServiceState,
    registry: FeedRegistry<E>,
}

impl<E> Inner<E> {
    /// Rejects `op` unless the service is still stopped.
    fn ensure_stopped(&self, op: &'static str) -> Result<(), NotifyError> {
        if self.state == ServiceState::Stopped {
            return Ok(());
        }
        error!(op, state = %self.state, "lifecycle violation: operation rejected");
        Err(NotifyError::InvalidLifecycle {
            op,
            state: self.state,
        })
    }
}

/// Bridges named feeds to handlers running on dispatch queues.
pub struct NotificationService<E> {
    cfg: Config,
    queues: Arc<dyn QueueProvider>,
    inner: RwLock<Inner<E>>,
    shutdown: CancellationToken,
    listeners: Mutex<Vec<ListenerHandle>>,
    live: Arc<watch::Sender<usize>>,
}

impl<E: Send + Sync + 'static> NotificationService<E> {
    /// Creates a stopped service resolving queue keys through `queues`.
    pub fn new(cfg: Config, queues: Arc<dyn QueueProvider>) -> Self {
        Self {
            cfg,
            queues,
            inner: RwLock::new(Inner {
                state: ServiceState::Stopped,
                registry: FeedRegistry::new(),
            }),
            shutdown: CancellationToken::new(),
            listeners: Mutex::new(Vec::new()),
            live: Arc::new(watch::channel(0).0),
        }
    }

    /// Registers a feed under `name`. Registering an existing name is a no-op.
    ///
    /// # Errors
    /// [`NotifyError::InvalidLifecycle`] once the service has started.
    pub fn register_feed(&self, name: impl Into<String>) -> Result<(), NotifyError> {
        let name = name.into();
        let mut inner = self.inner.write();
        inner.ensure_stopped("register feed")?;

        if inner
            .registry
            .register_feed(&name, self.cfg.feed_capacity_clamped())
        {
            debug!(feed = %name, "feed registered");
        }
        Ok(())
    }

    /// Binds `handler` to `feed`; its work runs on the queue named `queue`.
    ///
    /// # Errors
    /// - [`NotifyError::FeedNotFound`] if `feed` is not registered
    /// - [`NotifyError::DuplicateBinding`] if this handler instance is already
    ///   bound to `feed` on `queue`
    /// - [`NotifyError::InvalidLifecycle`] once the service has started
    pub fn register_handler(
        &self,
        feed: &str,
        queue: impl Into<String>,
        handler: Arc<dyn EventHandler<E>>,
    ) -> Result<(), NotifyError> {
        let mut inner = self.inner.write();
        inner.ensure_stopped("register handler")?;

        let binding = HandlerBinding::new(feed, queue, handler);
        let label = binding.label();
        inner.registry.register_handler(binding)?;
        debug!(binding = %label, "handler registered");
        Ok(())
    }

    /// Starts one listener per handler binding.
    ///
    /// Every listener is subscribed before this returns, so a `dispatch` issued
    /// right after `start` reaches all of them. Must be called from within a
    /// tokio runtime.
    ///
    /// # Errors
    /// [`NotifyError::InvalidLifecycle`] unless the service is stopped.
    pub fn start(&self) -> Result<(), NotifyError> {
        let wiring = {
            let mut inner = self.inner.write();
            inner.ensure_stopped("start")?;
            inner.state = ServiceState::Running;
            inner.registry.wiring()
        };

        let mut listeners = self.listeners.lock();
        for (feed, binding) in wiring {
            let queue = self.queues.get_queue(binding.queue());
            let listener = Listener::new(binding, feed.subscribe(), queue);
            let name = listener.name();
            let token = self.shutdown.child_token();

            self.live.send_modify(|n| *n += 1);
            let guard = LiveGuard(Arc::clone(&self.live));

            trace!(listener = %name, feed = feed.name(), "listener spawned");
            listeners.push(ListenerHandle {
                name,
                join: tokio::spawn(async move {
                    let _guard = guard;
                    listener.run(token).await
                }),
            });
        }
        info!(listeners = listeners.len(), "notification service started");
        Ok(())
    }

    /// Signals every listener to exit and moves the service to halted.
    ///
    /// Does not wait for listeners; see [`shutdown`](Self::shutdown). Safe to call
    /// more than once, before `start`, or after listeners already exited.
    pub fn stop(&self) -> Result<(), NotifyError> {
        let prev = {
            let mut inner = self.inner.write();
            std::mem::replace(&mut inner.state, ServiceState::Halted)
        };
        self.shutdown.cancel();

        if prev != ServiceState::Halted {
            info!(from = %prev, "notification service stopped");
        }
        Ok(())
    }

    /// Stops the service and waits up to [`Config::grace`] for listeners to exit.
    ///
    /// Listeners still alive after the grace period are aborted and reported in
    /// [`RuntimeError::GraceExceeded`]. With `grace = 0s` this only signals.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let _ = self.stop();
        let Some(grace) = self.cfg.shutdown_grace() else {
            return Ok(());
        };

        let mut live = self.live.subscribe();
        let drained = tokio::time::timeout(grace, live.wait_for(|n| *n == 0))
            .await
            .is_ok();
        if drained {
            debug!("all listeners stopped within grace");
            return Ok(());
        }

        let mut stuck: Vec<String> = self
            .listeners
            .lock()
            .iter()
            .filter(|h| !h.join.is_finished())
            .map(|h| {
                h.join.abort();
                h.name.clone()
            })
            .collect();
        stuck.sort_unstable();
        warn!(stuck = stuck.len(), ?grace, "listeners aborted after grace");
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }

    /// Runs until `trigger` resolves, then performs [`shutdown`](Self::shutdown).
    ///
    /// Returns at once if the service was already halted by someone else.
    pub async fn run_until<F>(&self, trigger: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let halted = self.shutdown.clone();
        tokio::select! {
            _ = trigger => info!("shutdown requested"),
            _ = halted.cancelled() => debug!("service halted before trigger"),
        }
        self.shutdown().await
    }

    /// [`run_until`](Self::run_until) the first termination signal.
    ///
    /// Unix: `SIGINT` or `SIGTERM`. Elsewhere: Ctrl-C. If signal handlers cannot
    /// be installed the service shuts down immediately.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.run_until(async {
            let signal = termination_signal().await;
            info!(signal, "termination signal received");
        })
        .await
    }

    /// Health probe. No degraded state is tracked, so this is always `Ok`.
    pub fn status(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.inner.read().state
    }

    /// Publishes `event` on `feed`.
    ///
    /// Waits until every listener of the feed has taken the event into its
    /// inbox (not until handlers ran). Returns the number of listeners reached.
    /// An unknown feed, or a halted service, delivers to nobody and returns `0`.
    pub async fn dispatch(&self, feed: &str, event: E) -> usize {
        let target = {
            let inner = self.inner.read();
            if inner.state == ServiceState::Halted {
                trace!(feed, "dispatch after stop dropped");
                return 0;
            }
            inner.registry.feed(feed)
        };

        match target {
            Some(f) => f.send(event).await,
            None => {
                trace!(feed, "dispatch to unknown feed dropped");
                0
            }
        }
    }

    /// Closes `feed`: its listeners exit and later dispatches deliver to nobody.
    ///
    /// Returns `false` if the feed is not registered.
    pub fn close_feed(&self, feed: &str) -> bool {
        let Some(f) = self.inner.read().registry.feed(feed) else {
            return false;
        };
        let listeners = f.subscriber_count();
        f.close();
        debug!(feed, listeners, "feed closed");
        true
    }

    /// True if `feed` is registered.
    pub fn has_feed(&self, feed: &str) -> bool {
        self.inner.read().registry.feed(feed).is_some()
    }

    /// Returns sorted list of registered feed names.
    pub fn feed_names(&self) -> Vec<String> {
        self.inner.read().registry.feed_names()
    }

    /// Number of handler bindings on `feed`.
    pub fn handler_count(&self, feed: &str) -> usize {
        self.inner.read().registry.handler_count(feed)
    }

    /// Number of listener tasks that have not exited yet.
    pub fn listener_count(&self) -> usize {
        *self.live.borrow()
    }
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut int, mut term) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(int), Ok(term)) => (int, term),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "cannot install signal handlers");
            return "unavailable";
        }
    };
    tokio::select! {
        _ = int.recv() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "ctrl-c",
        Err(e) => {
            warn!(error = %e, "cannot install ctrl-c handler");
            "unavailable"
        }
    }
}
