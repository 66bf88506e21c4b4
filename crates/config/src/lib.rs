//! Configuration for the formext extension.
//!
//! Configuration is a single TOML file. Every key is optional:
//!
//! ```toml
//! host = "editor"           # or "game"
//! first_type_code = 0x46    # first code handed to extended record types
//! partial_records = "keep"  # or "discard"
//!
//! [log]
//! filter = "formext=debug,info"
//! file = "formext.log"
//!
//! # Override or add a compatibility entry for one host base class.
//! [compat.form]
//! vtable = "0x00A3BE3C"
//! unknown = [0x86048400, 0x001E1FC7]
//! ```
//!
//! `FORMEXT_LOG` takes precedence over `log.filter`.

pub mod compat;
pub mod error;
pub mod logging;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use formext_abi::{CompatTable, HostTarget};
use formext_primitives::TypeCode;
use serde::Deserialize;

pub use compat::{Address, CompatOverride};
pub use error::{ConfigError, Result};

/// What to do with a record whose chunk stream turned out to be malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialRecordPolicy {
	/// Drop the record; nothing reaches the store.
	#[default]
	Discard,
	/// Keep the fields decoded before the malformed chunk.
	Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `EnvFilter` directives used when `FORMEXT_LOG` is unset.
	pub filter: String,
	/// Appends to this file instead of writing to stderr.
	pub file: Option<PathBuf>,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: "info".to_owned(),
			file: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub host: HostTarget,
	pub first_type_code: u8,
	pub partial_records: PartialRecordPolicy,
	pub log: LogConfig,
	pub compat: BTreeMap<String, CompatOverride>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: HostTarget::default(),
			first_type_code: TypeCode::FIRST_EXTENDED.get(),
			partial_records: PartialRecordPolicy::default(),
			log: LogConfig::default(),
			compat: BTreeMap::new(),
		}
	}
}

impl Config {
	pub fn parse(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		if config.first_type_code == 0 {
			return Err(ConfigError::InvalidTypeCode);
		}
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&content)
	}

	/// Loads `path` if it exists, otherwise returns the defaults.
	pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		if path.exists() {
			Self::load(path)
		} else {
			tracing::debug!(path = %path.display(), "no config file, using defaults");
			Ok(Self::default())
		}
	}

	pub fn first_type_code(&self) -> TypeCode {
		TypeCode::new(self.first_type_code)
	}

	/// Built-in compatibility entries for [`Config::host`] with the
	/// `[compat.*]` overrides applied.
	pub fn compat_table(&self) -> Result<CompatTable> {
		let mut table = CompatTable::builtin(self.host);
		for (base, over) in &self.compat {
			let entry = over.apply(base, table.get(base))?;
			tracing::debug!(
				base,
				vtable = format_args!("{:#x}", entry.vtable),
				unknown = entry.unknown.count(),
				"compat override"
			);
			table.insert(base.clone(), entry);
		}
		Ok(table)
	}
}
