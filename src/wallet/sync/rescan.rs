//! Single-flight rescan of wallet-relevant chain history.
//!
//! The store does the scanning and streams how many blocks it got through since its last
//! report. The controller relays every delta to listeners and keeps a running total, which
//! is reported once more when the rescan ends: as `Finish` when the store closed the stream,
//! as `Progress` when the rescan was cancelled. A progress error is logged and ends the
//! rescan without a final event.
//!
//! A rescan runs against the backend of the session that was active when it started. The
//! session stops it with [`RescanController::stop`] before releasing the backend.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::WalletError;
use crate::network::BackendRef;
use crate::notification::{NotificationFanout, Phase, SyncEvent};
use crate::shutdown::ShutdownSignal;
use crate::wallet::WalletStore;
use crate::wallet::types::RescanProgress;

/// One rescan in flight.
#[derive(Debug)]
struct RescanJob {
    start_height: i32,
    /// Blocks scanned so far.
    through_height: i32,
    cancel: CancellationToken,
}

/// Clears the single-flight slot on every exit path of the rescan task.
struct ActiveRescan {
    slot: Arc<Mutex<Option<CancellationToken>>>,
    idle: Arc<watch::Sender<bool>>,
    token: CancellationToken,
}

impl Drop for ActiveRescan {
    fn drop(&mut self) {
        self.token.cancel();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        self.idle.send_replace(true);
    }
}

pub struct RescanController {
    store: Arc<dyn WalletStore>,
    fanout: Arc<NotificationFanout>,
    backend: BackendRef,
    shutdown: ShutdownSignal,
    active: Arc<Mutex<Option<CancellationToken>>>,
    /// `true` while no rescan task is alive. Flipped under the `active` lock.
    idle: Arc<watch::Sender<bool>>,
    progress_buffer: usize,
}

impl RescanController {
    pub fn new(
        store: Arc<dyn WalletStore>,
        fanout: Arc<NotificationFanout>,
        backend: BackendRef,
        shutdown: ShutdownSignal,
        progress_buffer: usize,
    ) -> Self {
        Self {
            store,
            fanout,
            backend,
            shutdown,
            active: Arc::new(Mutex::new(None)),
            idle: Arc::new(watch::Sender::new(true)),
            progress_buffer: progress_buffer.max(1),
        }
    }

    pub fn is_rescanning(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Cancel the rescan in flight. Returns false if there was none.
    pub fn cancel_rescan(&self) -> bool {
        match self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel the rescan in flight and wait until its task has reported the final event.
    pub async fn stop(&self) {
        let mut idle = self.idle.subscribe();
        if !self.cancel_rescan() {
            return;
        }
        debug!("Waiting for rescan to stop");
        // the sender lives as long as `self`
        let _ = idle.wait_for(|idle| *idle).await;
    }

    /// Rescan from `from_height` through the chain tip using the bound backend.
    pub fn start_rescan(&self, from_height: i32) -> Result<(), WalletError> {
        let (backend, token) = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            let backend = self.backend.get().ok_or(WalletError::NotConnected)?;
            if active.is_some() {
                return Err(WalletError::AlreadyRescanning);
            }
            let token = self.shutdown.child_token();
            *active = Some(token.clone());
            self.idle.send_replace(false);
            (backend, token)
        };

        let guard = ActiveRescan {
            slot: self.active.clone(),
            idle: self.idle.clone(),
            token: token.clone(),
        };
        let (progress_tx, progress_rx) = mpsc::channel(self.progress_buffer);

        let store = self.store.clone();
        let scan_token = token.clone();
        let scan = tokio::spawn(async move {
            store
                .rescan_from_height(scan_token, backend, from_height, progress_tx)
                .await;
        });

        let job = RescanJob {
            start_height: from_height,
            through_height: 0,
            cancel: token.clone(),
        };
        let fanout = self.fanout.clone();
        tokio::spawn(async move {
            let _guard = guard;
            relay_progress(job, progress_rx, &fanout).await;
            // the store must be done with the backend before the slot is released
            token.cancel();
            if let Err(e) = scan.await {
                error!("Rescan task failed: {}", e);
            }
        });

        Ok(())
    }
}

async fn relay_progress(
    mut job: RescanJob,
    mut progress: mpsc::Receiver<RescanProgress>,
    fanout: &NotificationFanout,
) {
    info!("Rescanning from block {}", job.start_height);
    let cancel = job.cancel.clone();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = progress.recv() => match next {
                Some(Ok(scanned)) => {
                    job.through_height += scanned;
                    fanout.emit(&SyncEvent::Rescan {
                        through_height: scanned,
                        phase: Phase::Progress,
                    });
                }
                Some(Err(e)) => {
                    error!("Rescan failed: {}", e);
                    return;
                }
                None => break,
            }
        }
    }

    let phase = if job.cancel.is_cancelled() {
        debug!("Rescan cancelled after {} blocks", job.through_height);
        Phase::Progress
    } else {
        info!("Rescan finished after {} blocks", job.through_height);
        Phase::Finish
    };
    fanout.emit(&SyncEvent::Rescan {
        through_height: job.through_height,
        phase,
    });
}
