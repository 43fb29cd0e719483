//! # LogHandler: simple event logger
//!
//! A minimal handler that writes every event it receives through `tracing`.
//! Use it for tests, demos, or as a tap on an instrumentation feed.
//!
//! ## Example output
//! ```text
//! INFO feedvisor::handlers::log: notification handler="blocks-log" event=Block { height: 7 }
//! ```

use std::borrow::Cow;
use std::fmt::Debug;

use async_trait::async_trait;
use tracing::info;

use crate::handlers::EventHandler;

/// Event logging handler.
#[derive(Debug, Clone)]
pub struct LogHandler {
    name: Cow<'static, str>,
}

impl LogHandler {
    /// Construct a new [`LogHandler`] reported under `name`.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogHandler {
    fn default() -> Self {
        Self::new("LogHandler")
    }
}

#[async_trait]
impl<E> EventHandler<E> for LogHandler
where
    E: Debug + Send + Sync + 'static,
{
    async fn handle_notification(&self, event: &E) {
        info!(handler = %self.name, event = ?event, "notification");
    }

    fn name(&self) -> &str {
        &self.name
    }
}
