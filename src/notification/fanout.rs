//! Listener registry with fanout delivery.
//!
//! Listeners can be added and removed at any time. Each emit works on a snapshot of the
//! registry taken when it starts, so a listener registered or removed during delivery
//! only affects later events. Within one event listeners are called in registration
//! order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use super::events::SyncEvent;
use super::listener::SyncListener;

/// Handle returned on registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Delivers sync events to every registered listener.
pub struct NotificationFanout {
	listeners: RwLock<Vec<(ListenerId, Arc<dyn SyncListener>)>>,
	next_id: AtomicU64,
}

impl NotificationFanout {
	pub fn new() -> Self {
		Self {
			listeners: RwLock::new(Vec::new()),
			next_id: AtomicU64::new(0),
		}
	}

	/// Register a listener. It receives every event emitted after this call.
	pub fn register(&self, listener: Arc<dyn SyncListener>) -> ListenerId {
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.listeners
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.push((id, listener));
		id
	}

	/// Remove a listener. Returns false if the id was not registered.
	pub fn unregister(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
		let before = listeners.len();
		listeners.retain(|(existing, _)| *existing != id);
		listeners.len() != before
	}

	pub fn len(&self) -> usize {
		self.listeners
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Deliver an event to all listeners registered at the time of the call.
	pub fn emit(&self, event: &SyncEvent) {
		let snapshot = self.snapshot();
		trace!("Emitting {} to {} listeners", event.description(), snapshot.len());
		for listener in snapshot {
			listener.on_event(event);
		}
	}

	fn snapshot(&self) -> Vec<Arc<dyn SyncListener>> {
		self.listeners
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.map(|(_, listener)| listener.clone())
			.collect()
	}
}

impl Default for NotificationFanout {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for NotificationFanout {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NotificationFanout")
			.field("listeners", &self.len())
			.finish()
	}
}
