//! Tracing subscriber setup.

use std::fs::OpenOptions;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::LogConfig;
use crate::error::{ConfigError, Result};

/// Environment variable holding `EnvFilter` directives.
pub const LOG_ENV: &str = "FORMEXT_LOG";

/// Builds the filter: `FORMEXT_LOG` if set and valid, else `config.filter`.
pub fn filter(config: &LogConfig) -> EnvFilter {
	EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed, for example when the host
/// loads the extension twice.
pub fn init(config: &LogConfig) -> Result<()> {
	let filter = filter(config);

	let file_layer = match &config.file {
		Some(path) => {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.map_err(|error| ConfigError::Io {
					path: path.clone(),
					error,
				})?;
			Some(
				tracing_subscriber::fmt::layer()
					.with_writer(file)
					.with_ansi(false)
					.with_target(true),
			)
		}
		None => None,
	};
	let stderr_layer = file_layer
		.is_none()
		.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

	tracing_subscriber::registry()
		.with(filter)
		.with(file_layer)
		.with(stderr_layer)
		.try_init()?;

	tracing::info!(file = ?config.file, "formext tracing initialized");
	Ok(())
}
