//! Integrator-supplied compatibility tables.
//!
//! For every host base class a record type derives from, the table names the
//! address of the host's own dispatch table for that class and the mask of slots
//! whose signatures are unknown. Both are fixed per (host build, base class) and
//! cannot be discovered at runtime; a wrong entry silently corrupts dispatch for
//! every record type using that base.

use std::collections::BTreeMap;

use crate::host::{HostTarget, PerHost};
use crate::mask::SlotMask;

/// Keys of the bases the built-in tables describe.
pub mod base {
	/// The form root class (identity, load/save, copy/compare).
	pub const FORM: &str = "form";
	pub const FULL_NAME: &str = "full_name";
	pub const DESCRIPTION: &str = "description";
	pub const ICON: &str = "icon";
	pub const VALUE: &str = "value";
	pub const WEIGHT: &str = "weight";
}

/// Reference table address and unknown slots for one base class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatEntry {
	/// Address of the host's table for this base.
	pub vtable: usize,
	pub unknown: SlotMask,
}

impl CompatEntry {
	/// Slot count of the generated table for this base.
	pub fn slots(&self) -> usize {
		self.unknown.slot_capacity()
	}
}

/// Compatibility entries for one host target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatTable {
	target: HostTarget,
	entries: BTreeMap<String, CompatEntry>,
}

const FORM_UNKNOWN: PerHost<&[u32]> = PerHost::new(
	&[0x8604_8400, 0x001E_1FC7],
	&[0x0908_00D0, 0xDF78_3F8F, 0x0000_0105],
);

const COMPONENT_UNKNOWN: PerHost<&[u32]> = PerHost::new(&[0x0000_0000], &[0x0000_00D0]);

const VTABLES: [(&str, PerHost<usize>); 6] = [
	(base::FORM, PerHost::new(0x00A3_BE3C, 0x0093_DA0C)),
	(base::FULL_NAME, PerHost::new(0x00A3_22A0, 0x0093_8118)),
	(base::DESCRIPTION, PerHost::new(0x00A3_B938, 0x0093_D00C)),
	(base::ICON, PerHost::new(0x00A3_20A4, 0x0093_C9DC)),
	(base::VALUE, PerHost::new(0x00A3_C680, 0x0093_F4F4)),
	(base::WEIGHT, PerHost::new(0x00A3_C6A0, 0x0093_F588)),
];

impl CompatTable {
	pub fn empty(target: HostTarget) -> Self {
		Self {
			target,
			entries: BTreeMap::new(),
		}
	}

	/// The entries shipped for the supported host builds.
	pub fn builtin(target: HostTarget) -> Self {
		let mut table = Self::empty(target);
		for (key, addrs) in VTABLES {
			let words = if key == base::FORM {
				FORM_UNKNOWN.get(target)
			} else {
				COMPONENT_UNKNOWN.get(target)
			};
			table.insert(
				key,
				CompatEntry {
					vtable: addrs.get(target),
					unknown: SlotMask::from_words(words),
				},
			);
		}
		table
	}

	pub fn target(&self) -> HostTarget {
		self.target
	}

	/// Adds or replaces the entry for `base`.
	pub fn insert(&mut self, base: impl Into<String>, entry: CompatEntry) -> Option<CompatEntry> {
		self.entries.insert(base.into(), entry)
	}

	pub fn get(&self, base: &str) -> Option<&CompatEntry> {
		self.entries.get(base)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &CompatEntry)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
