//! Tracing subscriber setup.
//!
//! The level filter sits behind a reload layer so verbosity can be changed while the
//! wallet is running. `RUST_LOG` takes precedence over the configured default at
//! startup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Handle to the installed subscriber's filter.
#[derive(Debug, Clone)]
pub struct LogHandle {
	filter: reload::Handle<EnvFilter, Registry>,
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(default_level: &str) -> Result<LogHandle, LoggingError> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	let (filter_layer, filter) = reload::Layer::new(filter);

	tracing_subscriber::registry()
		.with(filter_layer)
		.with(
			fmt::layer()
				.with_target(false)
				.with_thread_ids(false)
				.with_thread_names(false)
				.with_file(false)
				.with_line_number(false)
				.with_timer(fmt::time::time()),
		)
		.try_init()
		.map_err(|e| LoggingError::SubscriberInit(e.to_string()))?;

	Ok(LogHandle { filter })
}

impl LogHandle {
	/// Change the global level. Unknown level names are ignored and return `Ok(false)`.
	pub fn set_log_level(&self, level: &str) -> Result<bool, LoggingError> {
		let Some(level) = parse_level(level) else {
			return Ok(false);
		};
		self.filter
			.modify(|filter| *filter = EnvFilter::new(level.to_string()))
			.map_err(|e| LoggingError::Reload(e.to_string()))?;
		Ok(true)
	}
}

fn parse_level(level: &str) -> Option<LevelFilter> {
	level.trim().parse::<LevelFilter>().ok()
}
