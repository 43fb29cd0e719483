//! Runtime core: registration, lifecycle and listeners.
//!
//! The public API from this module is [`NotificationService`], its
//! [`Config`] and the [`ServiceState`] it reports.
//!
//! Internal modules:
//! - [`service`]: lifecycle state machine, registration, dispatch, signal-driven shutdown;
//! - [`registry`]: feeds and handler bindings and their registration checks;
//! - [`listener`]: forwards one subscription to one dispatch queue;
//! - [`state`]: lifecycle states.

mod config;
mod listener;
mod registry;
mod service;
mod state;

pub use config::Config;
pub use service::NotificationService;
pub use state::ServiceState;
