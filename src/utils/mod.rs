//!
//! Utility module for the wallet sync layer.
//!
//! Address normalization, amount formatting and secret-buffer handling shared by the
//! sync and publish paths.
/// Host/port parsing and normalization
pub mod address;
/// Amount formatting for display
pub mod amount;
/// Zero-on-drop guard for passphrase buffers
pub mod secret;

pub use address::{AddressError, normalize_address};
pub use amount::{ATOMS_DECIMALS, format_amount};
pub use secret::ScrubOnDrop;
