//! Listener interfaces for sync and transaction notifications.
//!
//! Every callback on [`SyncListener`] has an empty default, so a listener only
//! overrides what it cares about. [`SyncListener::on_event`] routes a [`SyncEvent`] to
//! the matching callback and is what the fanout invokes.

use chrono::DateTime;
use tracing::{debug, info, warn};

use super::events::{Phase, SyncErrorCode, SyncEvent};

/// Observer of sync lifecycle events.
pub trait SyncListener: Send + Sync {
	fn on_synced(&self, _synced: bool) {}

	fn on_peer_connected(&self, _peer_count: i32) {}

	fn on_peer_disconnected(&self, _peer_count: i32) {}

	fn on_fetched_headers(&self, _fetched_headers: i32, _last_header_time: i64, _phase: Phase) {}

	fn on_fetch_missing_cfilters(&self, _start: i32, _end: i32, _phase: Phase) {}

	fn on_discovered_addresses(&self, _phase: Phase) {}

	fn on_rescan(&self, _through_height: i32, _phase: Phase) {}

	fn on_sync_error(&self, _code: SyncErrorCode, _error: &str) {}

	/// Dispatches one event to the matching callback.
	fn on_event(&self, event: &SyncEvent) {
		match event {
			SyncEvent::Synced(synced) => self.on_synced(*synced),
			SyncEvent::PeerConnected { peer_count } => self.on_peer_connected(*peer_count),
			SyncEvent::PeerDisconnected { peer_count } => self.on_peer_disconnected(*peer_count),
			SyncEvent::FetchedHeaders {
				count,
				last_header_time,
				phase,
			} => self.on_fetched_headers(*count, *last_header_time, *phase),
			SyncEvent::FetchMissingCFilters { start, end, phase } => {
				self.on_fetch_missing_cfilters(*start, *end, *phase)
			}
			SyncEvent::DiscoveredAddresses { phase } => self.on_discovered_addresses(*phase),
			SyncEvent::Rescan {
				through_height,
				phase,
			} => self.on_rescan(*through_height, *phase),
			SyncEvent::SyncError { code, message } => self.on_sync_error(*code, message),
		}
	}

	/// Name used in diagnostics.
	fn name(&self) -> &'static str {
		"SyncListener"
	}
}

/// Observer of wallet transaction activity.
pub trait TransactionListener: Send + Sync {
	/// A new unmined transaction, serialized as a JSON record.
	fn on_transaction(&self, record_json: &str);

	fn on_transaction_confirmed(&self, hash: &str, height: i32);

	fn on_block_attached(&self, height: i32, timestamp_nanos: i64);
}

/// Listener that writes every sync event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl SyncListener for LoggingListener {
	fn on_synced(&self, synced: bool) {
		if synced {
			info!("Wallet synced");
		} else {
			info!("Wallet not synced");
		}
	}

	fn on_peer_connected(&self, peer_count: i32) {
		info!("Peer connected, {} peers", peer_count);
	}

	fn on_peer_disconnected(&self, peer_count: i32) {
		info!("Peer disconnected, {} peers", peer_count);
	}

	fn on_fetched_headers(&self, fetched_headers: i32, last_header_time: i64, phase: Phase) {
		match phase {
			Phase::Start => info!("Fetching headers"),
			Phase::Progress => {
				let last_header = DateTime::from_timestamp(last_header_time, 0)
					.map(|t| t.to_rfc3339())
					.unwrap_or_else(|| last_header_time.to_string());
				debug!("Fetched {} headers, last header at {}", fetched_headers, last_header);
			}
			Phase::Finish => info!("Finished fetching headers"),
		}
	}

	fn on_fetch_missing_cfilters(&self, start: i32, end: i32, phase: Phase) {
		match phase {
			Phase::Progress => debug!("Fetched missing cfilters {}..{}", start, end),
			_ => info!("Missing cfilter fetch {:?}", phase),
		}
	}

	fn on_discovered_addresses(&self, phase: Phase) {
		info!("Address discovery {:?}", phase);
	}

	fn on_rescan(&self, through_height: i32, phase: Phase) {
		match phase {
			Phase::Progress => debug!("Rescanned through block {}", through_height),
			_ => info!("Rescan {:?} at {}", phase, through_height),
		}
	}

	fn on_sync_error(&self, code: SyncErrorCode, error: &str) {
		warn!("Sync error (code {}): {}", code, error);
	}

	fn name(&self) -> &'static str {
		"LoggingListener"
	}
}
