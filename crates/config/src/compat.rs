//! `[compat.<base>]` sections.

use formext_abi::{CompatEntry, SlotMask};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// A host address as written in TOML: an integer or a `0x` hex string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Address {
	Int(u64),
	Text(String),
}

impl Address {
	pub fn resolve(&self, base: &str) -> Result<usize> {
		let invalid = || ConfigError::InvalidAddress {
			base: base.to_owned(),
			value: match self {
				Self::Int(v) => v.to_string(),
				Self::Text(s) => s.clone(),
			},
		};
		let value = match self {
			Self::Int(v) => *v,
			Self::Text(s) => {
				let s = s.trim();
				let hex = s
					.strip_prefix("0x")
					.or_else(|| s.strip_prefix("0X"))
					.ok_or_else(invalid)?;
				u64::from_str_radix(&hex.replace('_', ""), 16).map_err(|_| invalid())?
			}
		};
		if value == 0 {
			return Err(invalid());
		}
		usize::try_from(value).map_err(|_| invalid())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompatOverride {
	pub vtable: Option<Address>,
	pub unknown: Option<SlotMask>,
}

impl CompatOverride {
	/// Merges this override onto the built-in entry for `base`, if any.
	pub fn apply(&self, base: &str, builtin: Option<&CompatEntry>) -> Result<CompatEntry> {
		let vtable = match (&self.vtable, builtin) {
			(Some(addr), _) => addr.resolve(base)?,
			(None, Some(entry)) => entry.vtable,
			(None, None) => return Err(incomplete(base)),
		};
		let unknown = match (&self.unknown, builtin) {
			(Some(mask), _) => mask.clone(),
			(None, Some(entry)) => entry.unknown.clone(),
			(None, None) => return Err(incomplete(base)),
		};
		Ok(CompatEntry { vtable, unknown })
	}
}

fn incomplete(base: &str) -> ConfigError {
	ConfigError::IncompleteCompat {
		base: base.to_owned(),
	}
}
