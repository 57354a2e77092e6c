//! Classified views over the store's transaction history.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ErrorKind, StoreError, WalletError, translate_error};
use crate::wallet::store::display_account_name;
use crate::wallet::types::TransactionHash;
use crate::wallet::WalletStore;

use super::classifier::{UNMINED_HEIGHT, classify};
use super::types::ClassifiedTransaction;

/// Every wallet transaction, mined ones first in block order, then the unmined set.
///
/// Stops with [`WalletError::ContextCanceled`] if `cancel` fires between blocks. A record
/// that cannot be classified is logged and left out.
pub async fn transactions(
	store: &dyn WalletStore,
	cancel: &CancellationToken,
) -> Result<Vec<ClassifiedTransaction>, WalletError> {
	let blocks = store.transactions().await.map_err(translate_error)?;

	let mut records = Vec::new();
	for block in blocks {
		if cancel.is_cancelled() {
			debug!("Transaction listing interrupted after {} records", records.len());
			return Err(WalletError::ContextCanceled);
		}
		let height = block.height.unwrap_or(UNMINED_HEIGHT);
		for summary in &block.transactions {
			match classify(summary, height, |n| display_account_name(store, n)) {
				Ok(record) => records.push(record),
				Err(e) => warn!("Skipping transaction {}: {}", summary.hash, e),
			}
		}
	}
	Ok(records)
}

/// A single classified transaction with its confirmation count.
pub async fn transaction(
	store: &dyn WalletStore,
	hash: &TransactionHash,
) -> Result<ClassifiedTransaction, WalletError> {
	let details = store.transaction_details(hash).await.map_err(translate_error)?;
	let height = details.block_height.unwrap_or(UNMINED_HEIGHT);

	let mut record = classify(&details.summary, height, |n| display_account_name(store, n))
		.map_err(|e| WalletError::Store(StoreError::new(ErrorKind::Invalid, e.to_string())))?;
	record.confirmations = Some(details.confirmations);
	Ok(record)
}
