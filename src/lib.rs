//! Wallet synchronization and transaction classification.
//!
//! The crate sits between a wallet's persistent store and a network backend. It runs sync
//! sessions and rescans, fans their progress out to listeners, classifies the store's raw
//! transaction records and publishes signed transactions. The store and the backends are
//! traits supplied by the embedding application.

pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod notification;
pub mod rpc;
pub mod shutdown;
pub mod transaction;
pub mod utils;
pub mod wallet;

pub use config::{Network, NetworkParams, WalletConfig};
pub use error::{ErrorKind, StoreError, WalletError, translate_error};
pub use shutdown::ShutdownSignal;
pub use wallet::{SessionStatus, WalletService, WalletStore};
