use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::network::NetworkBackend;
use crate::wallet::types::{
	RescanProgress, SignedTransaction, TransactionBlock, TransactionDetails, TransactionHash,
	TransactionNotification,
};

/// Persistent account, key and transaction store.
///
/// Implementations own their locking discipline; the sync layer only issues scoped
/// unlock requests and reads lock state.
#[async_trait::async_trait]
pub trait WalletStore: Send + Sync {
	/// Bind or unbind the backend used for chain queries and relaying.
	fn set_network_backend(&self, backend: Option<Arc<dyn NetworkBackend>>);

	fn is_locked(&self) -> bool;

	fn lock(&self);

	/// Unlock private keys.
	///
	/// With a `relock` receiver the store locks again as soon as a value is sent on it.
	/// Without one the wallet stays unlocked until [`WalletStore::lock`].
	async fn unlock(
		&self,
		passphrase: &[u8],
		relock: Option<oneshot::Receiver<()>>,
	) -> Result<(), StoreError>;

	async fn change_private_passphrase(&self, old: &[u8], new: &[u8]) -> Result<(), StoreError>;

	fn account_name(&self, account: u32) -> Result<String, StoreError>;

	/// Height of the main chain tip known to the wallet.
	fn best_block_height(&self) -> i32;

	/// Replay chain history from `from_height`, sending progress deltas on `progress`.
	///
	/// The sender is dropped when the rescan completes or `cancel` fires.
	async fn rescan_from_height(
		&self,
		cancel: CancellationToken,
		backend: Arc<dyn NetworkBackend>,
		from_height: i32,
		progress: mpsc::Sender<RescanProgress>,
	);

	/// Decode and sign a serialized transaction.
	async fn sign_transaction(&self, raw_tx: &[u8]) -> Result<SignedTransaction, StoreError>;

	/// Record and relay a signed transaction through `backend`.
	async fn publish_transaction(
		&self,
		signed_tx: &[u8],
		backend: Arc<dyn NetworkBackend>,
	) -> Result<TransactionHash, StoreError>;

	async fn publish_unmined_transactions(
		&self,
		cancel: CancellationToken,
		backend: Arc<dyn NetworkBackend>,
	) -> Result<(), StoreError>;

	async fn transaction_details(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionDetails, StoreError>;

	/// All wallet transactions, mined blocks in height order followed by the unmined set.
	async fn transactions(&self) -> Result<Vec<TransactionBlock>, StoreError>;

	/// Stream of transaction activity. Ends when the store closes.
	fn transaction_notifications(&self) -> mpsc::Receiver<TransactionNotification>;

	async fn close(&self) -> Result<(), StoreError>;
}

/// Account name for display, falling back to a placeholder when the lookup fails.
pub fn display_account_name(store: &dyn WalletStore, account: u32) -> String {
	match store.account_name(account) {
		Ok(name) => name,
		Err(e) => {
			tracing::error!("Failed to look up name of account {}: {}", account, e);
			"Account not found".to_string()
		}
	}
}
