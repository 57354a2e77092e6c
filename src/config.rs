//! Wallet configuration.
//!
//! Settings come from a JSON file and can be overridden from the environment
//! (`WALLET_NETWORK`, `WALLET_DATA_DIR`, `WALLET_LOG_LEVEL`). Every field has a default,
//! so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::error::ConfigError;

/// Chain the wallet operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	#[default]
	Mainnet,
	Testnet,
	Simnet,
}

/// Per-network constants needed by the sync layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
	pub name: &'static str,
	/// Port assumed for peer addresses given without one.
	pub default_peer_port: u16,
	/// Port assumed for full-node RPC addresses given without one.
	pub json_rpc_client_port: u16,
}

impl Network {
	pub fn params(self) -> NetworkParams {
		match self {
			Network::Mainnet => NetworkParams {
				name: "mainnet",
				default_peer_port: 9108,
				json_rpc_client_port: 9109,
			},
			Network::Testnet => NetworkParams {
				name: "testnet3",
				default_peer_port: 19108,
				json_rpc_client_port: 19109,
			},
			Network::Simnet => NetworkParams {
				name: "simnet",
				default_peer_port: 18555,
				json_rpc_client_port: 19556,
			},
		}
	}
}

impl FromStr for Network {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"mainnet" => Ok(Network::Mainnet),
			"testnet" | "testnet3" => Ok(Network::Testnet),
			"simnet" => Ok(Network::Simnet),
			other => Err(ConfigError::InvalidNetwork(other.to_string())),
		}
	}
}

/// Connection settings for a full-node JSON-RPC endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
	pub address: String,
	pub username: String,
	pub password: String,
	/// PEM file with the node's CA certificate. Plain HTTP is used when absent.
	pub ca_cert_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
	pub network: Network,
	pub data_dir: PathBuf,
	pub log_level: String,
	/// Upper bound on one sync session's run time. Unbounded when absent.
	pub session_deadline_secs: Option<u64>,
	/// Capacity of the rescan progress channel.
	pub rescan_progress_buffer: usize,
	pub rpc: Option<RpcConfig>,
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			network: Network::default(),
			data_dir: PathBuf::from("."),
			log_level: "info".to_string(),
			session_deadline_secs: None,
			rescan_progress_buffer: 1,
			rpc: None,
		}
	}
}

impl WalletConfig {
	/// Read a JSON configuration file and apply environment overrides.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		let config: WalletConfig = serde_json::from_str(&content)?;
		config.with_env_overrides()
	}

	/// Apply `WALLET_*` environment variables on top of this configuration.
	pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
		if let Ok(network) = std::env::var("WALLET_NETWORK") {
			self.network = network.parse()?;
		}
		if let Ok(dir) = std::env::var("WALLET_DATA_DIR") {
			self.data_dir = PathBuf::from(dir);
		}
		if let Ok(level) = std::env::var("WALLET_LOG_LEVEL") {
			self.log_level = level;
		}
		Ok(self)
	}

	pub fn params(&self) -> NetworkParams {
		self.network.params()
	}

	/// Data directory for the configured network.
	pub fn network_data_dir(&self) -> PathBuf {
		self.data_dir.join(self.params().name)
	}

	pub fn session_deadline(&self) -> Option<Duration> {
		self.session_deadline_secs.map(Duration::from_secs)
	}
}
