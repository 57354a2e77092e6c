use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::{ErrorKind, StoreError};

/// 32-byte transaction or block hash.
///
/// Displayed and parsed as byte-reversed hex, the way explorers and node RPCs print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransactionHash(pub [u8; 32]);

impl TransactionHash {
	pub fn from_slice(bytes: &[u8]) -> Result<Self, StoreError> {
		let array: [u8; 32] = bytes.try_into().map_err(|_| {
			StoreError::new(
				ErrorKind::Encoding,
				format!("invalid hash length of {}, want 32", bytes.len()),
			)
		})?;
		Ok(Self(array))
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut reversed = self.0;
		reversed.reverse();
		write!(f, "{}", hex::encode(reversed))
	}
}

impl FromStr for TransactionHash {
	type Err = StoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut bytes = hex::decode(s)
			.map_err(|e| StoreError::new(ErrorKind::Encoding, format!("invalid hash hex: {}", e)))?;
		bytes.reverse();
		Self::from_slice(&bytes)
	}
}

/// Kind of transaction as recorded by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TransactionKind {
	#[default]
	Regular = 0,
	Coinbase = 1,
	TicketPurchase = 2,
	Vote = 3,
	Revocation = 4,
}

/// A wallet-owned output paid by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCredit {
	pub index: u32,
	pub account: u32,
	pub internal: bool,
	pub amount: i64,
	pub address: String,
}

/// A wallet-owned previous output spent by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDebit {
	pub index: u32,
	pub previous_account: u32,
	pub previous_amount: i64,
}

/// Everything the store knows about one wallet transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
	pub hash: TransactionHash,
	pub transaction: Vec<u8>,
	pub fee: i64,
	pub kind: TransactionKind,
	/// Unix seconds at which the wallet first saw the transaction.
	pub timestamp: i64,
	pub credits: Vec<RawCredit>,
	pub debits: Vec<RawDebit>,
}

/// Result of a single transaction lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
	pub summary: TransactionSummary,
	pub confirmations: i32,
	/// Height of the mining block, `None` while unmined.
	pub block_height: Option<i32>,
}

/// Wallet transactions grouped by the block that mined them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBlock {
	/// `None` for the unmined set.
	pub height: Option<i32>,
	pub transactions: Vec<TransactionSummary>,
}

/// A block connected to the main chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedBlock {
	pub height: i32,
	pub timestamp: DateTime<Utc>,
	/// Wallet transactions mined in this block.
	pub transactions: Vec<TransactionHash>,
}

/// One batch of store-side transaction activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionNotification {
	pub unmined_transactions: Vec<TransactionSummary>,
	pub attached_blocks: Vec<AttachedBlock>,
}

/// Output of signing a raw transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub raw: Vec<u8>,
	/// Inputs the signer could not produce a valid signature for.
	pub invalid_input_indexes: Vec<u32>,
}

/// One rescan progress report: blocks scanned since the previous report.
pub type RescanProgress = Result<i32, StoreError>;
