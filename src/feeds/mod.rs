//! Feeds: named broadcast channels.
//!
//! ## Contents
//! - `Feed` bounded per-subscriber fan-out with blocking publish
//! - `Subscription` the receiving side owned by one listener

mod feed;

pub(crate) use feed::{Feed, Subscription};
