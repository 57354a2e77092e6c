mod common;

use std::sync::atomic::Ordering;

use common::{Harness, MockBackend, PASSPHRASE, eventually};
use wallet_sync::error::{ErrorKind, StoreError, WalletError};
use wallet_sync::network::SyncMode;

fn zeroed(buf: &[u8]) -> bool {
	buf.iter().all(|b| *b == 0)
}

#[tokio::test]
async fn publish_requires_connection() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));
	let mut pass = PASSPHRASE.to_vec();

	let result = h.service.publish_transaction(&[1, 2, 3], &mut pass).await;

	assert_eq!(result, Err(WalletError::NotConnected));
	assert!(zeroed(&pass));
	assert!(h.store.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn publish_signs_broadcasts_and_relocks() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));
	h.connect().await;
	let mut pass = PASSPHRASE.to_vec();

	let hash = h
		.service
		.publish_transaction(&[1, 2, 3], &mut pass)
		.await
		.unwrap();

	assert_eq!(hash, "ab".repeat(32));
	assert!(zeroed(&pass));
	assert_eq!(*h.store.published.lock().unwrap(), vec![vec![1, 2, 3, 0x5a]]);
	assert_eq!(*h.backend.published.lock().unwrap(), vec![vec![1, 2, 3, 0x5a]]);

	eventually("relock", || h.store.relocks.load(Ordering::SeqCst) == 1).await;
	assert!(h.service.is_locked());
}

#[tokio::test]
async fn wrong_passphrase_is_invalid_passphrase() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));
	h.connect().await;
	let mut pass = b"wrong".to_vec();

	let result = h.service.publish_transaction(&[1, 2, 3], &mut pass).await;

	assert_eq!(result, Err(WalletError::InvalidPassphrase));
	assert!(zeroed(&pass));
	assert!(h.service.is_locked());
	assert!(h.store.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn partially_signed_transaction_is_still_published() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));
	h.connect().await;
	*h.store.invalid_inputs.lock().unwrap() = vec![1];
	let mut pass = PASSPHRASE.to_vec();

	assert!(
		h.service
			.publish_transaction(&[9], &mut pass)
			.await
			.is_ok()
	);
	assert_eq!(h.store.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn store_failures_are_translated() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));
	h.connect().await;

	*h.store.publish_error.lock().unwrap() = Some(StoreError::new(
		ErrorKind::InsufficientBalance,
		"need 1.5 coins",
	));
	let mut pass = PASSPHRASE.to_vec();
	assert_eq!(
		h.service.publish_transaction(&[1], &mut pass).await,
		Err(WalletError::InsufficientBalance)
	);
	assert!(zeroed(&pass));
	eventually("relock", || h.store.relocks.load(Ordering::SeqCst) == 1).await;

	*h.store.publish_error.lock().unwrap() = None;
	*h.store.sign_error.lock().unwrap() =
		Some(StoreError::new(ErrorKind::Encoding, "truncated transaction"));
	let mut pass = PASSPHRASE.to_vec();
	match h.service.publish_transaction(&[1], &mut pass).await {
		Err(WalletError::Store(err)) => assert_eq!(err.kind(), ErrorKind::Encoding),
		other => panic!("expected store error, got {:?}", other),
	}
}

#[tokio::test]
async fn unlock_and_lock_wallet() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));

	let mut wrong = b"nope".to_vec();
	assert_eq!(
		h.service.unlock_wallet(&mut wrong).await,
		Err(WalletError::InvalidPassphrase)
	);
	assert!(zeroed(&wrong));
	assert!(h.service.is_locked());

	let mut pass = PASSPHRASE.to_vec();
	h.service.unlock_wallet(&mut pass).await.unwrap();
	assert!(zeroed(&pass));
	assert!(!h.service.is_locked());

	h.service.lock_wallet();
	h.service.lock_wallet();
	assert!(h.service.is_locked());
	assert_eq!(h.store.lock_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn change_passphrase_zeroes_both_buffers() {
	let h = Harness::new(MockBackend::idle(SyncMode::PeerProtocol));

	let mut old = PASSPHRASE.to_vec();
	let mut new = b"battery staple".to_vec();
	h.service
		.change_private_passphrase(&mut old, &mut new)
		.await
		.unwrap();

	assert!(zeroed(&old));
	assert!(zeroed(&new));
	assert_eq!(h.store.current_passphrase(), b"battery staple".to_vec());

	let mut old = b"stale".to_vec();
	let mut new = b"whatever".to_vec();
	assert_eq!(
		h.service.change_private_passphrase(&mut old, &mut new).await,
		Err(WalletError::InvalidPassphrase)
	);
	assert!(zeroed(&old));
	assert!(zeroed(&new));
}
