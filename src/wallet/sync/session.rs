//! Sync session state machine.
//!
//! `SyncSessionManager` owns the single session slot of a wallet. Starting a session claims
//! the slot atomically, derives a child token from the shutdown signal and spawns the run;
//! the spawned task releases the slot again when the backend returns. Each claim bumps a
//! generation counter so late callbacks from a finished session can never move the status
//! of a newer one.
//!
//! When the backend returns, the run unbinds it, stops any rescan that was using it and
//! reports the outcome. Only then is the slot released, so every event of one session is
//! delivered before the first event of the next.
//!
//! Status transitions:
//!
//! ```text
//! Idle/Error/Cancelled -> Connecting -> Syncing <-> Synced
//!                                          |  <-> Rescanning
//!                                          v
//!                               Idle | Error | Cancelled
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::NetworkParams;
use crate::error::WalletError;
use crate::network::{
    BackendError, BackendObserver, BackendRef, ConnectError, NetworkBackend, PeerBackendFactory,
    RpcConnector, RpcCredentials, SyncMode,
};
use crate::notification::{NotificationFanout, SyncErrorCode, SyncEvent};
use crate::shutdown::ShutdownSignal;
use crate::utils::normalize_address;
use crate::wallet::WalletStore;

use super::notifier::SessionNotifier;
use super::rescan::RescanController;

/// Lifecycle status of the wallet's sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Connecting,
    Syncing,
    Synced,
    Rescanning,
    /// The last session failed. Does not block a new one.
    Error,
    /// The last session was cancelled. Does not block a new one.
    Cancelled,
}

impl SessionStatus {
    /// Whether a session holding this status occupies the wallet's session slot.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionStatus::Connecting
                | SessionStatus::Syncing
                | SessionStatus::Synced
                | SessionStatus::Rescanning
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) status: SessionStatus,
    pub(crate) mode: Option<SyncMode>,
    pub(crate) cancel: Option<CancellationToken>,
    pub(crate) generation: u64,
}

/// How a session run ended, when it did not end cleanly.
struct SessionFailure {
    code: SyncErrorCode,
    message: String,
    status: SessionStatus,
}

/// Manages the wallet's single sync session.
pub struct SyncSessionManager {
    params: NetworkParams,
    store: Arc<dyn WalletStore>,
    fanout: Arc<NotificationFanout>,
    backend: BackendRef,
    shutdown: ShutdownSignal,
    rescan: Arc<RescanController>,
    peer_factory: Arc<dyn PeerBackendFactory>,
    rpc_connector: Arc<dyn RpcConnector>,
    rpc_client: Mutex<Option<Arc<dyn NetworkBackend>>>,
    state: Arc<Mutex<SessionState>>,
    deadline: Option<Duration>,
}

impl SyncSessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: NetworkParams,
        store: Arc<dyn WalletStore>,
        fanout: Arc<NotificationFanout>,
        backend: BackendRef,
        shutdown: ShutdownSignal,
        rescan: Arc<RescanController>,
        peer_factory: Arc<dyn PeerBackendFactory>,
        rpc_connector: Arc<dyn RpcConnector>,
    ) -> Self {
        Self {
            params,
            store,
            fanout,
            backend,
            shutdown,
            rescan,
            peer_factory,
            rpc_connector,
            rpc_client: Mutex::new(None),
            state: Arc::new(Mutex::new(SessionState::default())),
            deadline: None,
        }
    }

    /// Bound every session run by `deadline`. Expiry ends the session with
    /// [`SyncErrorCode::DeadlineExceeded`].
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.lock_state().status
    }

    /// Mode of the current or most recent session.
    pub fn mode(&self) -> Option<SyncMode> {
        self.lock_state().mode
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Start synchronizing over the peer-to-peer protocol.
    ///
    /// Returns as soon as the session slot is claimed. Peer addresses are validated inside
    /// the session task; a malformed one ends the attempt with an
    /// [`SyncErrorCode::InvalidPeerAddress`] event rather than an error here.
    pub fn start_peer_sync(&self, peers: Option<Vec<String>>) -> Result<(), WalletError> {
        let (token, generation) = self.begin(SyncMode::PeerProtocol)?;
        let run = self.session_run(generation, token);
        let factory = self.peer_factory.clone();
        let default_port = self.params.default_peer_port.to_string();

        tokio::spawn(async move {
            let mut persistent_peers = Vec::new();
            for addr in peers.unwrap_or_default() {
                match normalize_address(&addr, &default_port) {
                    Ok(normalized) => persistent_peers.push(normalized),
                    Err(e) => {
                        warn!("Rejected peer address {}: {}", addr, e);
                        run.finish(Some(SessionFailure {
                            code: SyncErrorCode::InvalidPeerAddress,
                            message: format!("SPV Connect address invalid: {}", e),
                            status: SessionStatus::Error,
                        }));
                        return;
                    }
                }
            }

            info!(
                "Starting peer sync with {} persistent peers",
                persistent_peers.len()
            );
            let backend = factory.create(persistent_peers);
            run.run(backend).await;
        });

        Ok(())
    }

    /// Start synchronizing against a full node over RPC.
    ///
    /// Connecting happens before this returns, so address and connection failures are
    /// reported to the caller. A previously established connection is reused as is.
    pub async fn start_rpc_sync(
        &self,
        address: &str,
        credentials: RpcCredentials,
        certificate: &[u8],
    ) -> Result<(), WalletError> {
        let (token, generation) = self.begin(SyncMode::Rpc)?;

        let client = match self
            .connect_rpc(address, &credentials, certificate, &token)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                self.abandon(generation);
                return Err(e);
            }
        };

        let run = self.session_run(generation, token);
        tokio::spawn(async move { run.run(client).await });
        Ok(())
    }

    /// Cancel the active session, if any.
    ///
    /// Listeners first receive `Synced(false)`; the session then ends with
    /// [`SyncErrorCode::Canceled`]. Calling this again, or with no session, does nothing.
    pub fn cancel(&self) {
        let token = {
            let state = self.lock_state();
            if !state.status.is_active() {
                return;
            }
            match &state.cancel {
                Some(token) if !token.is_cancelled() => token.clone(),
                _ => return,
            }
        };

        info!("Cancelling sync session");
        self.fanout.emit(&SyncEvent::Synced(false));
        token.cancel();
    }

    /// Cancel the active session and release the cached RPC connection.
    pub fn shutdown(&self) {
        self.cancel();
        let client = self
            .rpc_client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(client) = client {
            debug!("Stopping RPC client");
            client.stop();
        }
    }

    /// Claim the session slot.
    fn begin(&self, mode: SyncMode) -> Result<(CancellationToken, u64), WalletError> {
        let mut state = self.lock_state();
        if state.status.is_active() {
            return Err(WalletError::AlreadySyncing);
        }
        if self.rescan.is_rescanning() {
            return Err(WalletError::AlreadyRescanning);
        }

        let token = self.shutdown.child_token();
        state.generation += 1;
        state.status = SessionStatus::Connecting;
        state.mode = Some(mode);
        state.cancel = Some(token.clone());
        Ok((token, state.generation))
    }

    /// Release a slot claimed by `begin` whose session never started running.
    fn abandon(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation == generation {
            state.status = SessionStatus::Idle;
            state.cancel = None;
        }
    }

    async fn connect_rpc(
        &self,
        address: &str,
        credentials: &RpcCredentials,
        certificate: &[u8],
        token: &CancellationToken,
    ) -> Result<Arc<dyn NetworkBackend>, WalletError> {
        let cached = self
            .rpc_client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(client) = cached {
            debug!("Reusing existing RPC connection");
            return Ok(client);
        }

        let port = self.params.json_rpc_client_port.to_string();
        let address = normalize_address(address, &port).map_err(|e| {
            warn!("Invalid RPC address: {}", e);
            WalletError::InvalidAddress
        })?;

        info!("Connecting to RPC server at {}", address);
        let client = self
            .rpc_connector
            .connect(&address, credentials, certificate, token.clone())
            .await
            .map_err(|e| {
                error!("RPC connection to {} failed: {}", address, e);
                match e {
                    ConnectError::InvalidAuth => WalletError::InvalidCredentials,
                    ConnectError::Canceled => WalletError::ContextCanceled,
                    ConnectError::Unavailable(_) => WalletError::Unavailable,
                }
            })?;

        *self.rpc_client.lock().unwrap_or_else(PoisonError::into_inner) = Some(client.clone());
        Ok(client)
    }

    fn session_run(&self, generation: u64, token: CancellationToken) -> SessionRun {
        SessionRun {
            generation,
            token,
            deadline: self.deadline,
            state: self.state.clone(),
            store: self.store.clone(),
            fanout: self.fanout.clone(),
            backend: self.backend.clone(),
            rescan: self.rescan.clone(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything the spawned task of one session needs.
struct SessionRun {
    generation: u64,
    token: CancellationToken,
    deadline: Option<Duration>,
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn WalletStore>,
    fanout: Arc<NotificationFanout>,
    backend: BackendRef,
    rescan: Arc<RescanController>,
}

impl SessionRun {
    async fn run(self, backend: Arc<dyn NetworkBackend>) {
        let label = match backend.mode() {
            SyncMode::PeerProtocol => "SPV",
            SyncMode::Rpc => "RPC",
        };

        self.store.set_network_backend(Some(backend.clone()));
        self.backend.set(backend.clone());
        self.set_running();

        let observer: Arc<dyn BackendObserver> = Arc::new(SessionNotifier::new(
            self.state.clone(),
            self.generation,
            self.fanout.clone(),
            self.store.clone(),
        ));
        let result = self.drive(backend.as_ref(), observer).await;

        self.store.set_network_backend(None);
        self.backend.clear();
        self.rescan.stop().await;

        let failure = match result {
            Err(BackendError::DeadlineExceeded) => Some(SessionFailure {
                code: SyncErrorCode::DeadlineExceeded,
                message: format!(
                    "{} synchronization deadline exceeded: {}",
                    label,
                    BackendError::DeadlineExceeded
                ),
                status: SessionStatus::Error,
            }),
            Err(BackendError::Canceled) => Some(canceled(label)),
            _ if self.token.is_cancelled() => Some(canceled(label)),
            Ok(()) => None,
            Err(BackendError::NoPeers) => Some(SessionFailure {
                code: SyncErrorCode::Unspecified,
                message: format!("{} synchronization failed: {}", label, WalletError::NoPeers),
                status: SessionStatus::Error,
            }),
            Err(e) => Some(SessionFailure {
                code: SyncErrorCode::Unspecified,
                message: e.to_string(),
                status: SessionStatus::Error,
            }),
        };

        self.finish(failure);
    }

    async fn drive(
        &self,
        backend: &dyn NetworkBackend,
        observer: Arc<dyn BackendObserver>,
    ) -> Result<(), BackendError> {
        let guarded = async {
            tokio::select! {
                result = backend.run(self.token.clone(), observer) => result,
                _ = self.token.cancelled() => Err(BackendError::Canceled),
            }
        };

        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    self.token.cancel();
                    Err(BackendError::DeadlineExceeded)
                }
            },
            None => guarded.await,
        }
    }

    fn set_running(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation && state.status == SessionStatus::Connecting {
            state.status = SessionStatus::Syncing;
        }
    }

    /// Report a failure, if there was one, then release the session slot.
    ///
    /// Listeners see the error while the slot is still held, so a restart issued from
    /// `on_sync_error` itself is rejected with `AlreadySyncing`.
    fn finish(&self, failure: Option<SessionFailure>) {
        // keeps a late `cancel()` from emitting `Synced(false)` after the outcome
        self.token.cancel();
        let status = match failure {
            Some(failure) => {
                warn!("Sync session ended: {}", failure.message);
                self.fanout.emit(&SyncEvent::SyncError {
                    code: failure.code,
                    message: failure.message,
                });
                failure.status
            }
            None => {
                info!("Sync session ended");
                SessionStatus::Idle
            }
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation {
            state.status = status;
            state.cancel = None;
        }
    }
}

fn canceled(label: &str) -> SessionFailure {
    SessionFailure {
        code: SyncErrorCode::Canceled,
        message: format!(
            "{} synchronization canceled: {}",
            label,
            BackendError::Canceled
        ),
        status: SessionStatus::Cancelled,
    }
}
