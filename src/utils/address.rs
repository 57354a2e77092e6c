//! Host/port parsing for peer and RPC addresses.
//!
//! Accepts `host`, `host:port` and `[ipv6]:port`. Hosts must be an IP address or a
//! plain hostname; ports must be numeric.

use std::net::{IpAddr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
	#[error("address {0}: missing port in address")]
	MissingPort(String),

	#[error("address {0}: missing ']' in address")]
	MissingBracket(String),

	#[error("address {0}: too many colons in address")]
	TooManyColons(String),

	#[error("address {0}: unexpected '{1}' in address")]
	UnexpectedBracket(String, char),

	#[error("address {0}: invalid host")]
	InvalidHost(String),

	#[error("address {0}: invalid port")]
	InvalidPort(String),
}

/// Split `host:port` or `[host]:port` into its parts.
pub fn split_host_port(hostport: &str) -> Result<(String, String), AddressError> {
	let addr = || hostport.to_string();

	let colon = hostport.rfind(':').ok_or_else(|| AddressError::MissingPort(addr()))?;

	let (host, bracketed, host_start, host_end) = if hostport.starts_with('[') {
		let close = hostport.find(']').ok_or_else(|| AddressError::MissingBracket(addr()))?;
		if close + 1 == hostport.len() {
			return Err(AddressError::MissingPort(addr()));
		}
		if close + 1 != colon {
			if hostport.as_bytes()[close + 1] == b':' {
				return Err(AddressError::TooManyColons(addr()));
			}
			return Err(AddressError::MissingPort(addr()));
		}
		(&hostport[1..close], true, 1, close + 1)
	} else {
		let host = &hostport[..colon];
		if host.contains(':') {
			return Err(AddressError::TooManyColons(addr()));
		}
		(host, false, 0, 0)
	};

	if hostport[host_start..].contains('[') {
		return Err(AddressError::UnexpectedBracket(addr(), '['));
	}
	if hostport[host_end..].contains(']') {
		return Err(AddressError::UnexpectedBracket(addr(), ']'));
	}

	let port = &hostport[colon + 1..];
	if !valid_host(host, bracketed) {
		return Err(AddressError::InvalidHost(addr()));
	}
	if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) || port.parse::<u16>().is_err()
	{
		return Err(AddressError::InvalidPort(addr()));
	}

	Ok((host.to_string(), port.to_string()))
}

/// Combine a host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: &str) -> String {
	if host.contains(':') {
		format!("[{}]:{}", host, port)
	} else {
		format!("{}:{}", host, port)
	}
}

/// Ensure an address carries a port, adding `default_port` only when it is missing.
///
/// If the address cannot be split for a reason other than a missing port, the error
/// from the first split attempt is returned unchanged.
pub fn normalize_address(addr: &str, default_port: &str) -> Result<String, AddressError> {
	let original = match split_host_port(addr) {
		Ok((host, port)) => return Ok(join_host_port(&host, &port)),
		Err(e) => e,
	};

	let with_port = join_host_port(addr, default_port);
	match split_host_port(&with_port) {
		Ok(_) => Ok(with_port),
		Err(_) => Err(original),
	}
}

fn valid_host(host: &str, bracketed: bool) -> bool {
	if bracketed {
		let without_zone = host.split('%').next().unwrap_or_default();
		return without_zone.parse::<Ipv6Addr>().is_ok();
	}
	if host.is_empty() {
		return false;
	}
	if host.parse::<IpAddr>().is_ok() {
		return true;
	}
	host.len() <= 253
		&& host
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_')
}
