//! Network backend integration.
//!
//! A backend is either a peer-to-peer filter syncer or a full-node RPC client. The sync
//! layer never talks to the network itself: it asks a factory (peers) or a connector
//! (RPC) for a backend, runs it, and reacts to the [`BackendEvent`]s it reports through
//! a [`BackendObserver`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use zeroize::Zeroize;

use crate::notification::BackendEvent;

/// Which kind of backend a session runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMode {
	PeerProtocol,
	Rpc,
}

/// Failure reported by a running backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
	#[error("context canceled")]
	Canceled,

	#[error("context deadline exceeded")]
	DeadlineExceeded,

	#[error("no peers")]
	NoPeers,

	#[error("{0}")]
	Other(String),
}

/// Failure to establish an RPC connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
	#[error("authentication failure")]
	InvalidAuth,

	#[error("context canceled")]
	Canceled,

	#[error("connection failed: {0}")]
	Unavailable(String),
}

/// Receives backend callbacks, in the order the backend raises them.
pub trait BackendObserver: Send + Sync {
	fn notify(&self, event: BackendEvent);
}

#[async_trait::async_trait]
pub trait NetworkBackend: Send + Sync {
	fn mode(&self) -> SyncMode;

	/// Synchronize the wallet until `cancel` fires or the backend fails.
	async fn run(
		&self,
		cancel: CancellationToken,
		observer: Arc<dyn BackendObserver>,
	) -> Result<(), BackendError>;

	/// Relay a signed transaction to the network.
	async fn publish_transaction(&self, raw_tx: &[u8]) -> Result<(), BackendError>;

	/// Release the underlying connection. Called once on wallet shutdown.
	fn stop(&self) {}
}

/// Builds peer-protocol backends.
pub trait PeerBackendFactory: Send + Sync {
	/// Create a syncer. An empty list means peers are discovered by the backend.
	fn create(&self, persistent_peers: Vec<String>) -> Arc<dyn NetworkBackend>;
}

/// Dials full-node RPC backends.
#[async_trait::async_trait]
pub trait RpcConnector: Send + Sync {
	async fn connect(
		&self,
		address: &str,
		credentials: &RpcCredentials,
		certificate: &[u8],
		cancel: CancellationToken,
	) -> Result<Arc<dyn NetworkBackend>, ConnectError>;
}

/// Username and password for an RPC endpoint. The password is wiped on drop.
#[derive(Clone)]
pub struct RpcCredentials {
	pub username: String,
	pub password: String,
}

impl RpcCredentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for RpcCredentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RpcCredentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

impl Drop for RpcCredentials {
	fn drop(&mut self) {
		self.password.zeroize();
	}
}

/// Shared slot holding the backend the wallet is currently bound to.
///
/// Cloning shares the slot. It is cleared whenever a session ends so nothing keeps
/// working against a stale backend.
#[derive(Clone, Default)]
pub struct BackendRef {
	inner: Arc<Mutex<Option<Arc<dyn NetworkBackend>>>>,
}

impl BackendRef {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self) -> Option<Arc<dyn NetworkBackend>> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn set(&self, backend: Arc<dyn NetworkBackend>) {
		*self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(backend);
	}

	pub fn clear(&self) -> Option<Arc<dyn NetworkBackend>> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner).take()
	}

	pub fn is_bound(&self) -> bool {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner).is_some()
	}
}

impl fmt::Debug for BackendRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BackendRef")
			.field("bound", &self.is_bound())
			.finish()
	}
}
