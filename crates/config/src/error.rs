//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A compatibility address that is neither an integer nor `0x` hex.
	#[error("invalid address {value:?} for compat base {base}")]
	InvalidAddress { base: String, value: String },

	/// A compat section for a base with no built-in entry must give both fields.
	#[error("compat base {base} has no built-in entry and needs both `vtable` and `unknown`")]
	IncompleteCompat { base: String },

	#[error("first_type_code must be non-zero")]
	InvalidTypeCode,

	#[error("failed to install tracing subscriber: {0}")]
	Logging(#[from] tracing_subscriber::util::TryInitError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
