use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::wallet::types::TransactionKind;

/// Net effect of a transaction on the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Direction {
	#[default]
	Sent = 0,
	Received = 1,
	/// Funds moved between wallet accounts; only the fee left the wallet.
	Transferred = 2,
}

/// A wallet output credited by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCredit {
	pub index: u32,
	pub account: u32,
	pub internal: bool,
	pub amount: i64,
	pub address: String,
}

/// A wallet output spent by a transaction, labelled with its account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDebit {
	pub index: u32,
	pub previous_account: u32,
	pub previous_amount: i64,
	pub account_name: String,
}

/// Classified transaction record as handed to UI layers.
///
/// Field order matches the serialized JSON record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
	pub fee: i64,
	pub hash: String,
	#[serde(with = "hex::serde")]
	pub raw: Vec<u8>,
	pub timestamp: i64,
	#[serde(rename = "type")]
	pub kind: TransactionKind,
	pub credits: Vec<TransactionCredit>,
	pub amount: i64,
	/// -1 while unmined.
	pub block_height: i32,
	pub direction: Direction,
	pub debits: Vec<TransactionDebit>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confirmations: Option<i32>,
}

impl ClassifiedTransaction {
	pub fn is_confirmed(&self) -> bool {
		self.block_height >= 0
	}

	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}
