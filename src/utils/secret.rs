use std::ops::Deref;

use zeroize::Zeroize;

/// Borrow of a secret buffer that is zeroed when the borrow ends.
///
/// The buffer is wiped on every exit path of the scope holding the guard, including
/// early returns and unwinding.
pub struct ScrubOnDrop<'a>(&'a mut [u8]);

impl<'a> ScrubOnDrop<'a> {
	pub fn new(secret: &'a mut [u8]) -> Self {
		Self(secret)
	}
}

impl Deref for ScrubOnDrop<'_> {
	type Target = [u8];

	fn deref(&self) -> &[u8] {
		self.0
	}
}

impl Drop for ScrubOnDrop<'_> {
	fn drop(&mut self) {
		self.0.zeroize();
	}
}
