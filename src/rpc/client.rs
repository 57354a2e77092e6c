//!
//! JSON-RPC passthrough client for a full node.
//!
//! Sends a single JSON-RPC 1.0 request with basic authentication and hands back the
//! result formatted for display. TLS is used when a CA certificate is supplied.

use std::time::Duration;

use reqwest::{Certificate, Client};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error};

/// Errors from a JSON-RPC call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("RPC error {code}: {message}")]
	Server { code: i64, message: String },

	#[error("HTTP status: {0}")]
	Status(reqwest::StatusCode),

	#[error("Invalid CA certificate: {0}")]
	InvalidCertificate(String),

	#[error("No RPC method given")]
	EmptyMethod,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	#[serde(default)]
	result: Value,
	#[serde(default)]
	error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

/// Client for one JSON-RPC endpoint.
#[derive(Clone)]
pub struct JsonRpcClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Full endpoint URL including scheme.
	url: String,
	username: String,
	password: String,
}

impl std::fmt::Debug for JsonRpcClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JsonRpcClient")
			.field("url", &self.url)
			.field("username", &self.username)
			.finish()
	}
}

impl JsonRpcClient {
	/// Create a client for `address`.
	///
	/// # Arguments
	/// * `address` - `host:port` or a full URL.
	/// * `ca_cert` - PEM encoded CA certificate. Empty for plain HTTP.
	pub fn new(address: &str, username: &str, password: &str, ca_cert: &[u8]) -> Result<Self, RpcError> {
		let mut builder = Client::builder().timeout(Duration::from_secs(30));
		let scheme = if ca_cert.is_empty() {
			"http"
		} else {
			let cert = Certificate::from_pem(ca_cert)
				.map_err(|e| RpcError::InvalidCertificate(e.to_string()))?;
			builder = builder.add_root_certificate(cert);
			"https"
		};

		let url = if address.contains("://") {
			address.to_string()
		} else {
			format!("{}://{}", scheme, address)
		};

		Ok(Self {
			http_client: builder.build()?,
			url,
			username: username.to_string(),
			password: password.to_string(),
		})
	}

	/// Execute one call and return the raw `result` value.
	pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
		if method.trim().is_empty() {
			return Err(RpcError::EmptyMethod);
		}

		let request_body = json!({
			"jsonrpc": "1.0",
			"id": 1,
			"method": method,
			"params": params,
		});
		debug!("Calling {} on {}", method, self.url);

		let response = self
			.http_client
			.post(&self.url)
			.basic_auth(&self.username, Some(&self.password))
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		let status = response.status();
		let body = response.bytes().await?;

		// nodes report RPC errors with a 500 and a JSON body
		let parsed: RpcResponse = match serde_json::from_slice(&body) {
			Ok(parsed) => parsed,
			Err(_) if !status.is_success() => return Err(RpcError::Status(status)),
			Err(e) => return Err(e.into()),
		};

		if let Some(err) = parsed.error {
			return Err(RpcError::Server {
				code: err.code,
				message: err.message,
			});
		}
		if !status.is_success() {
			return Err(RpcError::Status(status));
		}

		Ok(parsed.result)
	}
}

/// Split a comma separated argument list into JSON-RPC params.
///
/// Arguments are trimmed and empty ones dropped. Anything that parses as a JSON literal
/// (numbers, booleans, objects) is sent as such, everything else as a string.
pub fn parse_args(args: &str) -> Vec<Value> {
	args.split(',')
		.map(str::trim)
		.filter(|arg| !arg.is_empty())
		.map(|arg| serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string())))
		.collect()
}

/// Render a result for display: pretty JSON for objects and arrays, bare text for strings,
/// nothing for null.
pub fn format_result(result: &Value) -> Result<String, RpcError> {
	Ok(match result {
		Value::Object(_) | Value::Array(_) => serde_json::to_string_pretty(result)?,
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	})
}

/// Run one JSON-RPC method against a node and return its formatted result.
pub async fn call_json_rpc(
	method: &str,
	args: &str,
	address: &str,
	username: &str,
	password: &str,
	ca_cert: &[u8],
) -> Result<String, RpcError> {
	let client = JsonRpcClient::new(address, username, password, ca_cert)?;
	let result = client.call(method, parse_args(args)).await.map_err(|e| {
		error!("{} command: {}", method, e);
		e
	})?;
	format_result(&result)
}
