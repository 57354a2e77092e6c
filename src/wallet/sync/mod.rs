//! Wallet Synchronization Module
//!
//! This module owns the lifecycle of synchronization against a network backend:
//!
//! - `session`: The session manager. Starts at most one peer-protocol or RPC session at a time, runs it
//!   as a spawned task under a cancellable scope and reports how it ended.
//! - `notifier`: The backend observer of a running session. Converts backend callbacks into listener
//!   events and tracks the session status they imply.
//! - `rescan`: Single-flight replay of chain history through the wallet store, with streamed progress.
//!
//! Sessions and rescans each run on their own child token of the process shutdown signal, so a
//! shutdown stops everything while a cancel only stops its own scope.

/// Backend callback observer for a running session
pub mod notifier;
/// Single-flight rescan controller
pub mod rescan;
/// Sync session state machine
pub mod session;

pub use notifier::SessionNotifier;
pub use rescan::RescanController;
pub use session::{SessionStatus, SyncSessionManager};
