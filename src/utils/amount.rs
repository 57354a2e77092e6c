/// Number of decimal places in one coin (1 coin = 10^8 atoms).
pub const ATOMS_DECIMALS: u32 = 8;

/// Format an atom amount as a decimal coin string, e.g. `59000` -> `0.00059000`.
pub fn format_amount(atoms: i64, decimals: u32) -> String {
	let scale = 10i64.pow(decimals);
	let sign = if atoms < 0 { "-" } else { "" };
	let abs = atoms.unsigned_abs();
	let scale = scale.unsigned_abs();
	format!(
		"{}{}.{:0width$}",
		sign,
		abs / scale,
		abs % scale,
		width = decimals as usize
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_atoms() {
		assert_eq!(format_amount(59_000, ATOMS_DECIMALS), "0.00059000");
		assert_eq!(format_amount(250_000_000, ATOMS_DECIMALS), "2.50000000");
		assert_eq!(format_amount(-1_000, ATOMS_DECIMALS), "-0.00001000");
	}
}
