//! Error taxonomy for the wallet sync layer.
//!
//! Collaborators (the wallet store, network backends) report failures with their own
//! error types. Everything that reaches a caller or a listener is first translated into
//! a [`WalletError`], which is a closed set of kinds so UI layers can branch on it
//! without string matching.

use crate::notification::SyncErrorCode;

/// Category of a failure reported by the wallet store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	InsufficientBalance,
	NotExist,
	Passphrase,
	NoPeers,
	Encoding,
	Invalid,
	Io,
	Other,
}

/// Error returned by a [`WalletStore`](crate::wallet::WalletStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct StoreError {
	pub kind: ErrorKind,
	pub message: String,
}

impl StoreError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		self.kind
	}
}

/// User-facing error kinds.
///
/// The display strings are stable identifiers, not prose.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
	#[error("insufficient_balance")]
	InsufficientBalance,

	#[error("not_exists")]
	NotExist,

	#[error("invalid_passphrase")]
	InvalidPassphrase,

	#[error("no_peers")]
	NoPeers,

	#[error("not_connected")]
	NotConnected,

	#[error("already_syncing")]
	AlreadySyncing,

	#[error("already_rescanning")]
	AlreadyRescanning,

	#[error("invalid_address")]
	InvalidAddress,

	#[error("invalid_credentials")]
	InvalidCredentials,

	#[error("context_canceled")]
	ContextCanceled,

	#[error("unavailable")]
	Unavailable,

	/// A session failure delivered through `on_sync_error`, for embedders that surface the
	/// listener-side code as an error. The wallet's own calls never return it.
	#[error("sync_error ({code}): {message}")]
	SyncError {
		code: SyncErrorCode,
		message: String,
	},

	#[error("Wallet store error: {0}")]
	Store(StoreError),
}

/// Maps a store failure onto the user-facing taxonomy.
///
/// Passphrase failures always become [`WalletError::InvalidPassphrase`], whatever the
/// store's own message says. Kinds without a dedicated variant pass through unchanged.
pub fn translate_error(err: StoreError) -> WalletError {
	match err.kind {
		ErrorKind::InsufficientBalance => WalletError::InsufficientBalance,
		ErrorKind::NotExist => WalletError::NotExist,
		ErrorKind::Passphrase => WalletError::InvalidPassphrase,
		ErrorKind::NoPeers => WalletError::NoPeers,
		_ => WalletError::Store(err),
	}
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON parse error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Unsupported network type: {0}")]
	InvalidNetwork(String),
}

/// Logging setup errors.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("Subscriber initialization failed: {0}")]
	SubscriberInit(String),

	#[error("Log filter reload failed: {0}")]
	Reload(String),
}
