use std::process::ExitCode;

use tracing::{error, info};
use wallet_sync::config::WalletConfig;
use wallet_sync::error::ConfigError;
use wallet_sync::logging::init_logging;
use wallet_sync::rpc::call_json_rpc;
use wallet_sync::shutdown::ShutdownSignal;
use wallet_sync::utils::normalize_address;

fn load_config() -> Result<WalletConfig, ConfigError> {
	match std::env::var("WALLET_CONFIG") {
		Ok(path) => WalletConfig::load(path),
		Err(_) => WalletConfig::default().with_env_overrides(),
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	let config = match load_config() {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Failed to load configuration: {}", e);
			return ExitCode::FAILURE;
		}
	};

	let _log = match init_logging(&config.log_level) {
		Ok(handle) => handle,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::FAILURE;
		}
	};

	let shutdown = ShutdownSignal::new();
	let _signals = shutdown.listen_for_os_signals();

	let mut args = std::env::args().skip(1);
	let Some(method) = args.next() else {
		error!("Usage: wallet-sync <method> [arg, ...]");
		return ExitCode::FAILURE;
	};
	let params = args.collect::<Vec<_>>().join(",");

	let Some(rpc) = config.rpc.clone() else {
		error!("No rpc section in configuration");
		return ExitCode::FAILURE;
	};

	let ca_cert = match &rpc.ca_cert_path {
		Some(path) => match std::fs::read(path) {
			Ok(cert) => cert,
			Err(e) => {
				error!("Failed to read CA certificate {}: {}", path.display(), e);
				return ExitCode::FAILURE;
			}
		},
		None => Vec::new(),
	};

	let port = config.params().json_rpc_client_port.to_string();
	let address = match normalize_address(&rpc.address, &port) {
		Ok(address) => address,
		Err(e) => {
			error!("Invalid RPC address: {}", e);
			return ExitCode::FAILURE;
		}
	};

	info!("Calling {} on {} ({})", method, address, config.params().name);

	tokio::select! {
		result = call_json_rpc(&method, &params, &address, &rpc.username, &rpc.password, &ca_cert) => {
			match result {
				Ok(output) => {
					if !output.is_empty() {
						println!("{}", output);
					}
					ExitCode::SUCCESS
				}
				Err(e) => {
					error!("{} failed: {}", method, e);
					ExitCode::FAILURE
				}
			}
		}
		_ = shutdown.cancelled() => {
			info!("Interrupted");
			ExitCode::FAILURE
		}
	}
}
