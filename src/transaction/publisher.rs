//! Unlock, sign and broadcast a raw transaction.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{WalletError, translate_error};
use crate::network::BackendRef;
use crate::utils::ScrubOnDrop;
use crate::wallet::WalletStore;
use crate::wallet::types::TransactionHash;

/// Re-locks the wallet when dropped by sending on the store's relock channel.
struct RelockOnDrop(Option<oneshot::Sender<()>>);

impl Drop for RelockOnDrop {
	fn drop(&mut self) {
		if let Some(relock) = self.0.take() {
			// the store may already have dropped the receiver after a failed unlock
			let _ = relock.send(());
		}
	}
}

pub struct TransactionPublisher {
	store: Arc<dyn WalletStore>,
	backend: BackendRef,
}

impl TransactionPublisher {
	pub fn new(store: Arc<dyn WalletStore>, backend: BackendRef) -> Self {
		Self { store, backend }
	}

	/// Sign `raw_tx` with keys unlocked by `passphrase` and relay it.
	///
	/// The passphrase buffer is zeroed before this returns, whatever the outcome, and
	/// the wallet is locked again once the call is done with the keys.
	pub async fn publish(
		&self,
		raw_tx: &[u8],
		passphrase: &mut [u8],
	) -> Result<TransactionHash, WalletError> {
		let passphrase = ScrubOnDrop::new(passphrase);

		let backend = self.backend.get().ok_or(WalletError::NotConnected)?;

		let (relock_tx, relock_rx) = oneshot::channel();
		let _relock = RelockOnDrop(Some(relock_tx));

		self.store
			.unlock(&passphrase, Some(relock_rx))
			.await
			.map_err(|e| {
				debug!("Unlock for signing failed: {}", e);
				WalletError::InvalidPassphrase
			})?;

		let signed = self
			.store
			.sign_transaction(raw_tx)
			.await
			.map_err(translate_error)?;

		if !signed.invalid_input_indexes.is_empty() {
			warn!(
				"Transaction signed with invalid inputs at indexes {:?}",
				signed.invalid_input_indexes
			);
		}

		let hash = self
			.store
			.publish_transaction(&signed.raw, backend)
			.await
			.map_err(translate_error)?;

		info!("Published transaction {}", hash);
		Ok(hash)
	}
}
