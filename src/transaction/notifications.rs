//! Background delivery of store transaction activity to a transaction listener.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::notification::TransactionListener;
use crate::utils::{ATOMS_DECIMALS, format_amount};
use crate::wallet::store::display_account_name;
use crate::wallet::types::TransactionNotification;
use crate::wallet::WalletStore;

use super::classifier::{UNMINED_HEIGHT, classify};

/// Relays store notifications until shutdown or until the store closes its stream.
pub struct TransactionNotifier;

impl TransactionNotifier {
	pub fn spawn(
		store: Arc<dyn WalletStore>,
		listener: Arc<dyn TransactionListener>,
		shutdown: CancellationToken,
	) -> JoinHandle<()> {
		let mut notifications = store.transaction_notifications();
		tokio::spawn(async move {
			info!("Listening for wallet transactions");
			loop {
				tokio::select! {
					biased;
					_ = shutdown.cancelled() => {
						debug!("Transaction listener stopped by shutdown");
						break;
					}
					next = notifications.recv() => match next {
						Some(notification) => {
							deliver(store.as_ref(), listener.as_ref(), notification)
						}
						None => {
							debug!("Transaction notification stream closed");
							break;
						}
					}
				}
			}
		})
	}
}

fn deliver(
	store: &dyn WalletStore,
	listener: &dyn TransactionListener,
	notification: TransactionNotification,
) {
	for summary in &notification.unmined_transactions {
		let record = match classify(summary, UNMINED_HEIGHT, |n| display_account_name(store, n)) {
			Ok(record) => record,
			Err(e) => {
				error!("Skipping transaction {}: {}", summary.hash, e);
				continue;
			}
		};
		debug!(
			"New transaction {}: {:?} {}",
			record.hash,
			record.direction,
			format_amount(record.amount, ATOMS_DECIMALS)
		);
		match record.to_json() {
			Ok(json) => listener.on_transaction(&json),
			Err(e) => error!("Failed to encode transaction {}: {}", summary.hash, e),
		}
	}

	for block in &notification.attached_blocks {
		let timestamp = block.timestamp.timestamp_nanos_opt().unwrap_or_default();
		listener.on_block_attached(block.height, timestamp);
		for hash in &block.transactions {
			listener.on_transaction_confirmed(&hash.to_string(), block.height);
		}
	}
}
