//! Turns raw store summaries into directional transaction records.
//!
//! The store only knows which wallet outputs a transaction credited and which wallet
//! outputs it spent. From those two sums and the fee the classifier decides whether
//! money came in, went out, or only moved between the wallet's own accounts.

use crate::wallet::types::{RawCredit, RawDebit, TransactionKind, TransactionSummary};

use super::types::{ClassifiedTransaction, Direction, TransactionCredit, TransactionDebit};

/// Block height reported for unmined transactions.
pub const UNMINED_HEIGHT: i32 = -1;

/// A transaction whose amounts cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
	#[error("transaction amounts overflow")]
	AmountOverflow,
}

fn checked_total(mut amounts: impl Iterator<Item = i64>) -> Result<i64, ClassifyError> {
	amounts.try_fold(0i64, |total, amount| {
		total.checked_add(amount).ok_or(ClassifyError::AmountOverflow)
	})
}

/// Direction and amount of a transaction from the wallet's point of view.
///
/// Only regular transactions are classified; every other kind yields `(Sent, 0)`.
/// Amounts whose sums do not fit in an `i64` are rejected.
pub fn classify_amounts(
	kind: TransactionKind,
	credits: &[RawCredit],
	debits: &[RawDebit],
	fee: i64,
) -> Result<(Direction, i64), ClassifyError> {
	if kind != TransactionKind::Regular {
		return Ok((Direction::default(), 0));
	}

	let output_total = checked_total(credits.iter().map(|c| c.amount))?;
	let input_total = checked_total(debits.iter().map(|d| d.previous_amount))?;
	let delta = output_total
		.checked_sub(input_total)
		.ok_or(ClassifyError::AmountOverflow)?;

	if delta < 0 && delta.checked_neg() == Some(fee) {
		Ok((Direction::Transferred, fee))
	} else if delta > 0 {
		Ok((Direction::Received, output_total))
	} else {
		let sent = delta
			.checked_neg()
			.and_then(|spent| spent.checked_sub(fee))
			.ok_or(ClassifyError::AmountOverflow)?;
		Ok((Direction::Sent, sent))
	}
}

/// Build the full record for one transaction.
///
/// `account_name` labels debits; it is expected to return a placeholder rather than
/// fail when an account is unknown.
pub fn classify<F>(
	summary: &TransactionSummary,
	block_height: i32,
	account_name: F,
) -> Result<ClassifiedTransaction, ClassifyError>
where
	F: Fn(u32) -> String,
{
	let (direction, amount) =
		classify_amounts(summary.kind, &summary.credits, &summary.debits, summary.fee)?;

	let credits = summary
		.credits
		.iter()
		.map(|c| TransactionCredit {
			index: c.index,
			account: c.account,
			internal: c.internal,
			amount: c.amount,
			address: c.address.clone(),
		})
		.collect();

	let debits = summary
		.debits
		.iter()
		.map(|d| TransactionDebit {
			index: d.index,
			previous_account: d.previous_account,
			previous_amount: d.previous_amount,
			account_name: account_name(d.previous_account),
		})
		.collect();

	Ok(ClassifiedTransaction {
		fee: summary.fee,
		hash: summary.hash.to_string(),
		raw: summary.transaction.clone(),
		timestamp: summary.timestamp,
		kind: summary.kind,
		credits,
		amount,
		block_height,
		direction,
		debits,
		confirmations: None,
	})
}
