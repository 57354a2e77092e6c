#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use wallet_sync::config::WalletConfig;
use wallet_sync::error::{ErrorKind, StoreError};
use wallet_sync::network::{
	BackendError, BackendObserver, ConnectError, NetworkBackend, PeerBackendFactory, RpcConnector,
	RpcCredentials, SyncMode,
};
use wallet_sync::notification::{BackendEvent, SyncEvent, SyncListener, TransactionListener};
use wallet_sync::shutdown::ShutdownSignal;
use wallet_sync::wallet::types::{
	RawCredit, RawDebit, RescanProgress, SignedTransaction, TransactionBlock, TransactionDetails,
	TransactionHash, TransactionKind, TransactionNotification, TransactionSummary,
};
use wallet_sync::wallet::{WalletService, WalletStore};

pub const PASSPHRASE: &[u8] = b"correct horse";

/// Poll `condition` until it holds, failing the test after a few seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
	let waited = tokio::time::timeout(Duration::from_secs(5), async {
		while !condition() {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await;
	assert!(waited.is_ok(), "timed out waiting for {}", what);
}

/// Let spawned tasks run for a moment.
pub async fn settle() {
	tokio::time::sleep(Duration::from_millis(50)).await;
}

pub async fn with_timeout<T>(fut: impl Future<Output = T>) -> T {
	tokio::time::timeout(Duration::from_secs(5), fut)
		.await
		.expect("future timed out")
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingListener {
	pub events: Mutex<Vec<SyncEvent>>,
}

impl RecordingListener {
	pub fn events(&self) -> Vec<SyncEvent> {
		self.events.lock().unwrap().clone()
	}

	pub fn count(&self) -> usize {
		self.events.lock().unwrap().len()
	}

	pub fn sync_errors(&self) -> Vec<SyncEvent> {
		self.events()
			.into_iter()
			.filter(|e| matches!(e, SyncEvent::SyncError { .. }))
			.collect()
	}

	pub fn contains(&self, event: &SyncEvent) -> bool {
		self.events.lock().unwrap().contains(event)
	}
}

impl SyncListener for RecordingListener {
	fn on_event(&self, event: &SyncEvent) {
		self.events.lock().unwrap().push(event.clone());
	}
}

#[derive(Default)]
pub struct RecordingTransactionListener {
	pub transactions: Mutex<Vec<String>>,
	pub confirmed: Mutex<Vec<(String, i32)>>,
	pub blocks: Mutex<Vec<(i32, i64)>>,
}

impl TransactionListener for RecordingTransactionListener {
	fn on_transaction(&self, record_json: &str) {
		self.transactions.lock().unwrap().push(record_json.to_string());
	}

	fn on_transaction_confirmed(&self, hash: &str, height: i32) {
		self.confirmed.lock().unwrap().push((hash.to_string(), height));
	}

	fn on_block_attached(&self, height: i32, timestamp_nanos: i64) {
		self.blocks.lock().unwrap().push((height, timestamp_nanos));
	}
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// What a mock backend does once it has raised its scripted events.
#[derive(Clone, Debug)]
pub enum RunOutcome {
	/// Run until the session token is cancelled, then report cancellation.
	WaitForCancel,
	/// Ignore the token and never return.
	Hang,
	Fail(BackendError),
	Finish,
}

pub struct MockBackend {
	mode: SyncMode,
	script: Vec<BackendEvent>,
	outcome: RunOutcome,
	pub runs: AtomicUsize,
	pub published: Mutex<Vec<Vec<u8>>>,
	pub stopped: AtomicBool,
}

impl MockBackend {
	pub fn new(mode: SyncMode, script: Vec<BackendEvent>, outcome: RunOutcome) -> Arc<Self> {
		Arc::new(Self {
			mode,
			script,
			outcome,
			runs: AtomicUsize::new(0),
			published: Mutex::new(Vec::new()),
			stopped: AtomicBool::new(false),
		})
	}

	pub fn idle(mode: SyncMode) -> Arc<Self> {
		Self::new(mode, Vec::new(), RunOutcome::WaitForCancel)
	}
}

#[async_trait::async_trait]
impl NetworkBackend for MockBackend {
	fn mode(&self) -> SyncMode {
		self.mode
	}

	async fn run(
		&self,
		cancel: CancellationToken,
		observer: Arc<dyn BackendObserver>,
	) -> Result<(), BackendError> {
		self.runs.fetch_add(1, Ordering::SeqCst);
		for event in &self.script {
			observer.notify(event.clone());
		}
		match &self.outcome {
			RunOutcome::WaitForCancel => {
				cancel.cancelled().await;
				Err(BackendError::Canceled)
			}
			RunOutcome::Hang => std::future::pending().await,
			RunOutcome::Fail(e) => Err(e.clone()),
			RunOutcome::Finish => Ok(()),
		}
	}

	async fn publish_transaction(&self, raw_tx: &[u8]) -> Result<(), BackendError> {
		self.published.lock().unwrap().push(raw_tx.to_vec());
		Ok(())
	}

	fn stop(&self) {
		self.stopped.store(true, Ordering::SeqCst);
	}
}

pub struct MockPeerFactory {
	backend: Arc<MockBackend>,
	pub requested: Mutex<Vec<Vec<String>>>,
}

impl MockPeerFactory {
	pub fn new(backend: Arc<MockBackend>) -> Arc<Self> {
		Arc::new(Self {
			backend,
			requested: Mutex::new(Vec::new()),
		})
	}

	pub fn created(&self) -> usize {
		self.requested.lock().unwrap().len()
	}
}

impl PeerBackendFactory for MockPeerFactory {
	fn create(&self, persistent_peers: Vec<String>) -> Arc<dyn NetworkBackend> {
		self.requested.lock().unwrap().push(persistent_peers);
		self.backend.clone()
	}
}

pub struct MockRpcConnector {
	backend: Arc<MockBackend>,
	pub failure: Mutex<Option<ConnectError>>,
	pub dialed: Mutex<Vec<String>>,
}

impl MockRpcConnector {
	pub fn new(backend: Arc<MockBackend>) -> Arc<Self> {
		Arc::new(Self {
			backend,
			failure: Mutex::new(None),
			dialed: Mutex::new(Vec::new()),
		})
	}

	pub fn fail_with(&self, err: ConnectError) {
		*self.failure.lock().unwrap() = Some(err);
	}

	pub fn dialed(&self) -> Vec<String> {
		self.dialed.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl RpcConnector for MockRpcConnector {
	async fn connect(
		&self,
		address: &str,
		_credentials: &RpcCredentials,
		_certificate: &[u8],
		_cancel: CancellationToken,
	) -> Result<Arc<dyn NetworkBackend>, ConnectError> {
		self.dialed.lock().unwrap().push(address.to_string());
		if let Some(err) = self.failure.lock().unwrap().clone() {
			return Err(err);
		}
		Ok(self.backend.clone())
	}
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// How the mock store behaves when asked to rescan.
#[derive(Clone, Debug, Default)]
pub struct RescanScript {
	pub progress: Vec<RescanProgress>,
	/// Keep the progress channel open until cancelled.
	pub hold_open: bool,
}

pub struct MockStore {
	locked: Arc<AtomicBool>,
	passphrase: Mutex<Vec<u8>>,
	pub lock_calls: AtomicUsize,
	pub relocks: Arc<AtomicUsize>,
	backend: Mutex<Option<Arc<dyn NetworkBackend>>>,
	pub rescan: Mutex<RescanScript>,
	pub invalid_inputs: Mutex<Vec<u32>>,
	pub sign_error: Mutex<Option<StoreError>>,
	pub publish_error: Mutex<Option<StoreError>>,
	pub published: Mutex<Vec<Vec<u8>>>,
	pub unmined_publishes: AtomicUsize,
	pub blocks: Mutex<Vec<TransactionBlock>>,
	pub details: Mutex<HashMap<TransactionHash, TransactionDetails>>,
	notifications_tx: Mutex<Option<mpsc::Sender<TransactionNotification>>>,
	notifications_rx: Mutex<Option<mpsc::Receiver<TransactionNotification>>>,
	pub closed: AtomicBool,
}

impl MockStore {
	pub fn new() -> Arc<Self> {
		let (tx, rx) = mpsc::channel(16);
		Arc::new(Self {
			locked: Arc::new(AtomicBool::new(true)),
			passphrase: Mutex::new(PASSPHRASE.to_vec()),
			lock_calls: AtomicUsize::new(0),
			relocks: Arc::new(AtomicUsize::new(0)),
			backend: Mutex::new(None),
			rescan: Mutex::new(RescanScript::default()),
			invalid_inputs: Mutex::new(Vec::new()),
			sign_error: Mutex::new(None),
			publish_error: Mutex::new(None),
			published: Mutex::new(Vec::new()),
			unmined_publishes: AtomicUsize::new(0),
			blocks: Mutex::new(Vec::new()),
			details: Mutex::new(HashMap::new()),
			notifications_tx: Mutex::new(Some(tx)),
			notifications_rx: Mutex::new(Some(rx)),
			closed: AtomicBool::new(false),
		})
	}

	pub fn has_backend(&self) -> bool {
		self.backend.lock().unwrap().is_some()
	}

	pub fn force_unlocked(&self) {
		self.locked.store(false, Ordering::SeqCst);
	}

	pub fn set_rescan(&self, progress: Vec<RescanProgress>, hold_open: bool) {
		*self.rescan.lock().unwrap() = RescanScript {
			progress,
			hold_open,
		};
	}

	pub async fn notify(&self, notification: TransactionNotification) {
		let tx = self.notifications_tx.lock().unwrap().clone();
		if let Some(tx) = tx {
			tx.send(notification).await.unwrap();
		}
	}

	/// Drop the notification sender without closing the store.
	pub fn close_notifications(&self) {
		self.notifications_tx.lock().unwrap().take();
	}

	pub fn current_passphrase(&self) -> Vec<u8> {
		self.passphrase.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl WalletStore for MockStore {
	fn set_network_backend(&self, backend: Option<Arc<dyn NetworkBackend>>) {
		*self.backend.lock().unwrap() = backend;
	}

	fn is_locked(&self) -> bool {
		self.locked.load(Ordering::SeqCst)
	}

	fn lock(&self) {
		self.lock_calls.fetch_add(1, Ordering::SeqCst);
		self.locked.store(true, Ordering::SeqCst);
	}

	async fn unlock(
		&self,
		passphrase: &[u8],
		relock: Option<oneshot::Receiver<()>>,
	) -> Result<(), StoreError> {
		if passphrase != self.passphrase.lock().unwrap().as_slice() {
			return Err(StoreError::new(ErrorKind::Passphrase, "mac mismatch"));
		}
		self.locked.store(false, Ordering::SeqCst);
		if let Some(relock) = relock {
			let locked = self.locked.clone();
			let relocks = self.relocks.clone();
			tokio::spawn(async move {
				if relock.await.is_ok() {
					locked.store(true, Ordering::SeqCst);
					relocks.fetch_add(1, Ordering::SeqCst);
				}
			});
		}
		Ok(())
	}

	async fn change_private_passphrase(&self, old: &[u8], new: &[u8]) -> Result<(), StoreError> {
		let mut current = self.passphrase.lock().unwrap();
		if old != current.as_slice() {
			return Err(StoreError::new(ErrorKind::Passphrase, "mac mismatch"));
		}
		*current = new.to_vec();
		Ok(())
	}

	fn account_name(&self, account: u32) -> Result<String, StoreError> {
		match account {
			0 => Ok("default".to_string()),
			n => Err(StoreError::new(ErrorKind::NotExist, format!("account {}", n))),
		}
	}

	fn best_block_height(&self) -> i32 {
		1_000
	}

	async fn rescan_from_height(
		&self,
		cancel: CancellationToken,
		_backend: Arc<dyn NetworkBackend>,
		_from_height: i32,
		progress: mpsc::Sender<RescanProgress>,
	) {
		let script = self.rescan.lock().unwrap().clone();
		for step in script.progress {
			if progress.send(step).await.is_err() {
				return;
			}
		}
		if script.hold_open {
			cancel.cancelled().await;
		}
	}

	async fn sign_transaction(&self, raw_tx: &[u8]) -> Result<SignedTransaction, StoreError> {
		if self.is_locked() {
			return Err(StoreError::new(ErrorKind::Passphrase, "wallet locked"));
		}
		if let Some(err) = self.sign_error.lock().unwrap().clone() {
			return Err(err);
		}
		let mut raw = raw_tx.to_vec();
		raw.push(0x5a);
		Ok(SignedTransaction {
			raw,
			invalid_input_indexes: self.invalid_inputs.lock().unwrap().clone(),
		})
	}

	async fn publish_transaction(
		&self,
		signed_tx: &[u8],
		backend: Arc<dyn NetworkBackend>,
	) -> Result<TransactionHash, StoreError> {
		if let Some(err) = self.publish_error.lock().unwrap().clone() {
			return Err(err);
		}
		backend
			.publish_transaction(signed_tx)
			.await
			.map_err(|e| StoreError::new(ErrorKind::Other, e.to_string()))?;
		self.published.lock().unwrap().push(signed_tx.to_vec());
		Ok(TransactionHash([0xab; 32]))
	}

	async fn publish_unmined_transactions(
		&self,
		_cancel: CancellationToken,
		_backend: Arc<dyn NetworkBackend>,
	) -> Result<(), StoreError> {
		self.unmined_publishes.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	async fn transaction_details(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionDetails, StoreError> {
		self.details
			.lock()
			.unwrap()
			.get(hash)
			.cloned()
			.ok_or_else(|| StoreError::new(ErrorKind::NotExist, "no such transaction"))
	}

	async fn transactions(&self) -> Result<Vec<TransactionBlock>, StoreError> {
		Ok(self.blocks.lock().unwrap().clone())
	}

	fn transaction_notifications(&self) -> mpsc::Receiver<TransactionNotification> {
		match self.notifications_rx.lock().unwrap().take() {
			Some(rx) => rx,
			None => mpsc::channel(1).1,
		}
	}

	async fn close(&self) -> Result<(), StoreError> {
		self.closed.store(true, Ordering::SeqCst);
		self.notifications_tx.lock().unwrap().take();
		Ok(())
	}
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn summary(
	tag: u8,
	credits: Vec<RawCredit>,
	debits: Vec<RawDebit>,
	fee: i64,
) -> TransactionSummary {
	TransactionSummary {
		hash: TransactionHash([tag; 32]),
		transaction: vec![tag, tag],
		fee,
		kind: TransactionKind::Regular,
		timestamp: 1_546_300_800,
		credits,
		debits,
	}
}

pub fn credit(account: u32, amount: i64) -> RawCredit {
	RawCredit {
		index: 0,
		account,
		internal: false,
		amount,
		address: "TsWalletAddress".to_string(),
	}
}

pub fn debit(account: u32, amount: i64) -> RawDebit {
	RawDebit {
		index: 0,
		previous_account: account,
		previous_amount: amount,
	}
}

pub struct Harness {
	pub service: Arc<WalletService>,
	pub store: Arc<MockStore>,
	pub backend: Arc<MockBackend>,
	pub factory: Arc<MockPeerFactory>,
	pub connector: Arc<MockRpcConnector>,
	pub listener: Arc<RecordingListener>,
	pub shutdown: ShutdownSignal,
}

impl Harness {
	pub fn new(backend: Arc<MockBackend>) -> Self {
		Self::with_config(backend, WalletConfig::default())
	}

	pub fn with_config(backend: Arc<MockBackend>, config: WalletConfig) -> Self {
		let store = MockStore::new();
		let factory = MockPeerFactory::new(backend.clone());
		let connector = MockRpcConnector::new(backend.clone());
		let shutdown = ShutdownSignal::new();
		let service = Arc::new(WalletService::new(
			config,
			store.clone(),
			factory.clone(),
			connector.clone(),
			shutdown.clone(),
		));
		let listener = Arc::new(RecordingListener::default());
		service.add_sync_listener(listener.clone());

		Self {
			service,
			store,
			backend,
			factory,
			connector,
			listener,
			shutdown,
		}
	}

	/// Start a peer session and wait until its backend is bound.
	pub async fn connect(&self) {
		self.service.start_peer_sync(None).unwrap();
		let store = self.store.clone();
		eventually("backend bound", move || store.has_backend()).await;
	}
}
