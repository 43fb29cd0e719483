//! # Feed registry - feeds and the handler bindings attached to them.
//!
//! Owns both maps the service is wired from:
//! ```text
//! feeds:    name → Arc<Feed<E>>
//! bindings: name → [HandlerBinding<E>, ...]   (registration order)
//! ```
//!
//! ## Rules
//! - A binding may only reference a feed that already exists (`FeedNotFound`)
//! - The same handler instance is bound at most once per (feed, queue) (`DuplicateBinding`)
//! - A failed registration leaves both maps untouched
//! - `wiring()` is the snapshot `start()` spawns listeners from

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::NotifyError;
use crate::feeds::Feed;
use crate::handlers::HandlerBinding;

/// Registry of feeds and handler bindings.
pub(crate) struct FeedRegistry<E> {
    feeds: HashMap<String, Arc<Feed<E>>>,
    bindings: HashMap<String, Vec<HandlerBinding<E>>>,
}

impl<E: Send + Sync + 'static> FeedRegistry<E> {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            bindings: HashMap::new(),
        }
    }

    /// Creates the feed if absent. Returns `true` if it was created.
    pub fn register_feed(&mut self, name: &str, capacity: usize) -> bool {
        if self.feeds.contains_key(name) {
            return false;
        }
        self.feeds
            .insert(name.to_string(), Arc::new(Feed::new(name, capacity)));
        true
    }

    /// Appends a binding to its feed's list.
    pub fn register_handler(&mut self, binding: HandlerBinding<E>) -> Result<(), NotifyError> {
        if !self.feeds.contains_key(binding.feed()) {
            return Err(NotifyError::FeedNotFound {
                feed: binding.feed().to_string(),
            });
        }

        let list = self.bindings.entry(binding.feed().to_string()).or_default();
        if list.iter().any(|b| b.same_wiring(&binding)) {
            return Err(NotifyError::DuplicateBinding {
                feed: binding.feed().to_string(),
                queue: binding.queue().to_string(),
                handler: binding.handler().name().to_string(),
            });
        }
        list.push(binding);
        Ok(())
    }

    pub fn feed(&self, name: &str) -> Option<Arc<Feed<E>>> {
        self.feeds.get(name).cloned()
    }

    /// Returns sorted list of feed names.
    pub fn feed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.feeds.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn handler_count(&self, feed: &str) -> usize {
        self.bindings.get(feed).map_or(0, Vec::len)
    }

    /// Every binding paired with its feed; feeds in name order, bindings in
    /// registration order.
    pub fn wiring(&self) -> Vec<(Arc<Feed<E>>, HandlerBinding<E>)> {
        let mut names: Vec<&String> = self.bindings.keys().collect();
        names.sort_unstable();

        let mut out = Vec::new();
        for name in names {
            let Some(feed) = self.feeds.get(name) else {
                continue;
            };
            for binding in &self.bindings[name] {
                out.push((Arc::clone(feed), binding.clone()));
            }
        }
        out
    }
}
