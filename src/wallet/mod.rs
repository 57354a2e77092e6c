pub mod store;
pub mod sync;
pub mod types;

pub use store::WalletStore;
pub use sync::{RescanController, SessionStatus, SyncSessionManager};
pub use types::*;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::WalletConfig;
use crate::error::{WalletError, translate_error};
use crate::network::{BackendRef, PeerBackendFactory, RpcConnector, RpcCredentials, SyncMode};
use crate::notification::{ListenerId, NotificationFanout, SyncListener, TransactionListener};
use crate::shutdown::ShutdownSignal;
use crate::transaction::{ClassifiedTransaction, TransactionNotifier, TransactionPublisher, history};
use crate::utils::ScrubOnDrop;

/// Entry point for UI layers: one loaded wallet plus everything that keeps it in sync.
pub struct WalletService {
	config: WalletConfig,
	store: Arc<dyn WalletStore>,
	shutdown: ShutdownSignal,
	fanout: Arc<NotificationFanout>,
	backend: BackendRef,
	sessions: SyncSessionManager,
	rescan: Arc<RescanController>,
	publisher: TransactionPublisher,
}

impl WalletService {
	pub fn new(
		config: WalletConfig,
		store: Arc<dyn WalletStore>,
		peer_factory: Arc<dyn PeerBackendFactory>,
		rpc_connector: Arc<dyn RpcConnector>,
		shutdown: ShutdownSignal,
	) -> Self {
		let fanout = Arc::new(NotificationFanout::new());
		let backend = BackendRef::new();
		let rescan = Arc::new(RescanController::new(
			store.clone(),
			fanout.clone(),
			backend.clone(),
			shutdown.clone(),
			config.rescan_progress_buffer,
		));
		let sessions = SyncSessionManager::new(
			config.params(),
			store.clone(),
			fanout.clone(),
			backend.clone(),
			shutdown.clone(),
			rescan.clone(),
			peer_factory,
			rpc_connector,
		)
		.with_deadline(config.session_deadline());
		let publisher = TransactionPublisher::new(store.clone(), backend.clone());

		info!("Wallet service created for {}", config.params().name);

		Self {
			config,
			store,
			shutdown,
			fanout,
			backend,
			sessions,
			rescan,
			publisher,
		}
	}

	pub fn config(&self) -> &WalletConfig {
		&self.config
	}

	pub fn shutdown_signal(&self) -> &ShutdownSignal {
		&self.shutdown
	}

	pub fn add_sync_listener(&self, listener: Arc<dyn SyncListener>) -> ListenerId {
		info!("Registering sync listener {}", listener.name());
		self.fanout.register(listener)
	}

	pub fn remove_sync_listener(&self, id: ListenerId) -> bool {
		self.fanout.unregister(id)
	}

	pub fn start_peer_sync(&self, peers: Option<Vec<String>>) -> Result<(), WalletError> {
		self.sessions.start_peer_sync(peers)
	}

	pub async fn start_rpc_sync(
		&self,
		address: &str,
		credentials: RpcCredentials,
		certificate: &[u8],
	) -> Result<(), WalletError> {
		self.sessions
			.start_rpc_sync(address, credentials, certificate)
			.await
	}

	/// Drop the current sync connection. Idempotent.
	pub fn cancel_sync(&self) {
		self.sessions.cancel();
	}

	pub fn sync_status(&self) -> SessionStatus {
		self.sessions.status()
	}

	pub fn sync_mode(&self) -> Option<SyncMode> {
		self.sessions.mode()
	}

	pub fn is_syncing(&self) -> bool {
		self.sessions.is_active()
	}

	/// Rescan the whole chain for wallet transactions.
	pub fn rescan_blocks(&self) -> Result<(), WalletError> {
		self.rescan.start_rescan(0)
	}

	pub fn rescan_from_height(&self, from_height: i32) -> Result<(), WalletError> {
		self.rescan.start_rescan(from_height)
	}

	pub fn is_rescanning(&self) -> bool {
		self.rescan.is_rescanning()
	}

	pub fn cancel_rescan(&self) -> bool {
		self.rescan.cancel_rescan()
	}

	pub async fn publish_transaction(
		&self,
		raw_tx: &[u8],
		passphrase: &mut [u8],
	) -> Result<String, WalletError> {
		let hash = self.publisher.publish(raw_tx, passphrase).await?;
		Ok(hash.to_string())
	}

	/// Re-broadcast every unmined wallet transaction.
	pub async fn publish_unmined_transactions(&self) -> Result<(), WalletError> {
		let backend = self.backend.get().ok_or(WalletError::NotConnected)?;
		self.store
			.publish_unmined_transactions(self.shutdown.child_token(), backend)
			.await
			.map_err(translate_error)
	}

	pub async fn transactions(&self) -> Result<Vec<ClassifiedTransaction>, WalletError> {
		history::transactions(self.store.as_ref(), &self.shutdown.child_token()).await
	}

	/// Look up one transaction by its hex hash.
	pub async fn transaction(&self, hash: &str) -> Result<ClassifiedTransaction, WalletError> {
		let hash: TransactionHash = hash.parse().map_err(translate_error)?;
		history::transaction(self.store.as_ref(), &hash).await
	}

	/// Deliver transaction activity to `listener` until shutdown.
	pub fn listen_for_transactions(&self, listener: Arc<dyn TransactionListener>) -> JoinHandle<()> {
		TransactionNotifier::spawn(self.store.clone(), listener, self.shutdown.child_token())
	}

	/// Unlock the wallet until [`WalletService::lock_wallet`]. The passphrase is zeroed.
	pub async fn unlock_wallet(&self, passphrase: &mut [u8]) -> Result<(), WalletError> {
		let passphrase = ScrubOnDrop::new(passphrase);
		self.store
			.unlock(&passphrase, None)
			.await
			.map_err(translate_error)
	}

	pub fn lock_wallet(&self) {
		if !self.store.is_locked() {
			self.store.lock();
		}
	}

	pub fn is_locked(&self) -> bool {
		self.store.is_locked()
	}

	/// Both passphrase buffers are zeroed before this returns.
	pub async fn change_private_passphrase(
		&self,
		old: &mut [u8],
		new: &mut [u8],
	) -> Result<(), WalletError> {
		let old = ScrubOnDrop::new(old);
		let new = ScrubOnDrop::new(new);
		self.store
			.change_private_passphrase(&old, &new)
			.await
			.map_err(translate_error)
	}

	pub fn best_block_height(&self) -> i32 {
		self.store.best_block_height()
	}

	/// Stop syncing, close the shutdown signal and close the store.
	pub async fn shutdown(&self) {
		info!("Shutting down wallet");
		self.sessions.shutdown();
		self.shutdown.signal();

		match self.store.close().await {
			Ok(()) => info!("Closed wallet"),
			Err(e) => error!("Failed to close wallet: {}", e),
		}
	}
}
