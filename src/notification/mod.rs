//! Sync lifecycle notifications.
//!
//! - `events`: the listener-facing [`SyncEvent`] and the backend-facing [`BackendEvent`].
//! - `listener`: callback traits for sync and transaction observers.
//! - `fanout`: the listener registry that delivers each event to every observer.

/// Event types and conversions
pub mod events;
/// Registry delivering events to all listeners
pub mod fanout;
/// Listener traits
pub mod listener;

pub use events::*;
pub use fanout::{ListenerId, NotificationFanout};
pub use listener::{LoggingListener, SyncListener, TransactionListener};
