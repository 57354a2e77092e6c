//! Backend observer for a running sync session.
//!
//! Every callback a backend raises is converted into a [`SyncEvent`] and emitted to all
//! listeners, in the order the backend raised them. Callbacks that change what the session
//! is doing (synced, rescanning) also move the session status, but only while the session
//! that created this notifier is still the current one.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::network::BackendObserver;
use crate::notification::{BackendEvent, NotificationFanout, SyncEvent};
use crate::wallet::WalletStore;

use super::session::{SessionState, SessionStatus};

pub struct SessionNotifier {
    state: Arc<Mutex<SessionState>>,
    generation: u64,
    fanout: Arc<NotificationFanout>,
    store: Arc<dyn WalletStore>,
}

impl SessionNotifier {
    pub(crate) fn new(
        state: Arc<Mutex<SessionState>>,
        generation: u64,
        fanout: Arc<NotificationFanout>,
        store: Arc<dyn WalletStore>,
    ) -> Self {
        Self {
            state,
            generation,
            fanout,
            store,
        }
    }

    fn transition(&self, status: SessionStatus) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation && state.status.is_active() {
            state.status = status;
        }
    }
}

impl BackendObserver for SessionNotifier {
    fn notify(&self, event: BackendEvent) {
        match &event {
            BackendEvent::Synced(true) => self.transition(SessionStatus::Synced),
            BackendEvent::Synced(false) | BackendEvent::RescanFinished => {
                self.transition(SessionStatus::Syncing)
            }
            BackendEvent::RescanStarted => self.transition(SessionStatus::Rescanning),
            BackendEvent::PeerConnected { peer_count, addr } => {
                debug!("Connected to peer {} ({} peers)", addr, peer_count);
            }
            BackendEvent::PeerDisconnected { peer_count, addr } => {
                debug!("Disconnected from peer {} ({} peers)", addr, peer_count);
            }
            _ => {}
        }

        let relock = matches!(event, BackendEvent::DiscoverAddressesFinished);

        self.fanout.emit(&SyncEvent::from(event));

        // address discovery may have needed the private keys
        if relock && !self.store.is_locked() {
            debug!("Address discovery finished, locking wallet");
            self.store.lock();
        }
    }
}
