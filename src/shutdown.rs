//! Process-wide shutdown signal.
//!
//! One [`ShutdownSignal`] is created at startup and is the root of all cancellation.
//! Long-running operations take a child token from it, which is cancelled when the root
//! closes and can also be cancelled on its own without touching siblings. The root is
//! closed at most once; later requests are logged and ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
	token: CancellationToken,
	signaled: Arc<AtomicBool>,
}

impl ShutdownSignal {
	pub fn new() -> Self {
		Self {
			token: CancellationToken::new(),
			signaled: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Derive a cancellation scope for one operation.
	pub fn child_token(&self) -> CancellationToken {
		self.token.child_token()
	}

	/// Close the root signal, cancelling every derived scope.
	///
	/// Returns true for the call that actually closed it.
	pub fn signal(&self) -> bool {
		if self.signaled.swap(true, Ordering::SeqCst) {
			info!("Shutdown signaled. Already shutting down...");
			return false;
		}
		self.token.cancel();
		true
	}

	pub fn is_signaled(&self) -> bool {
		self.signaled.load(Ordering::SeqCst)
	}

	/// Wait until the root signal closes.
	pub async fn cancelled(&self) {
		self.token.cancelled().await
	}

	/// Close the root signal on Ctrl-C or SIGTERM.
	///
	/// The task keeps running after the first signal so repeats are reported instead of
	/// killing the process.
	pub fn listen_for_os_signals(&self) -> JoinHandle<()> {
		let signal = self.clone();
		tokio::spawn(async move {
			loop {
				match wait_for_os_signal().await {
					Ok(name) => {
						if signal.signal() {
							info!("Received signal ({}). Shutting down...", name);
						}
					}
					Err(e) => {
						warn!("Failed to listen for OS signals: {}", e);
						return;
					}
				}
			}
		})
	}
}

impl Default for ShutdownSignal {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(unix)]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
	use tokio::signal::unix::{SignalKind, signal};

	let mut terminate = signal(SignalKind::terminate())?;
	tokio::select! {
		result = tokio::signal::ctrl_c() => {
			result?;
			Ok("interrupt")
		}
		_ = terminate.recv() => Ok("terminate"),
	}
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
	tokio::signal::ctrl_c().await?;
	Ok("interrupt")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn closes_exactly_once() {
		let shutdown = ShutdownSignal::new();
		assert!(!shutdown.is_signaled());
		assert!(shutdown.signal());
		assert!(!shutdown.signal());
		assert!(shutdown.is_signaled());
	}

	#[test]
	fn root_cancels_children() {
		let shutdown = ShutdownSignal::new();
		let a = shutdown.child_token();
		let b = shutdown.child_token();
		shutdown.signal();
		assert!(a.is_cancelled());
		assert!(b.is_cancelled());
	}

	#[test]
	fn child_cancel_leaves_siblings_alone() {
		let shutdown = ShutdownSignal::new();
		let a = shutdown.child_token();
		let b = shutdown.child_token();
		a.cancel();
		assert!(a.is_cancelled());
		assert!(!b.is_cancelled());
		assert!(!shutdown.is_signaled());
	}

	#[tokio::test]
	async fn cancelled_resolves_after_signal() {
		let shutdown = ShutdownSignal::new();
		let waiter = shutdown.clone();
		let handle = tokio::spawn(async move { waiter.cancelled().await });
		shutdown.signal();
		handle.await.unwrap();
	}
}
