//! Dispatch-table reconciliation.
//!
//! A record instance built by the extension carries one table pointer per host
//! base it derives from. Slots whose signatures the extension does not know are
//! null in those tables; this module fills them from the host's reference
//! tables, leaving every other slot as the extension defined it.

use std::ptr::NonNull;

use crate::mask::SlotMask;
use crate::slot::Slot;

/// One sub-object to reconcile.
#[derive(Debug, Clone, Copy)]
pub struct PatchEntry<'a> {
	/// Base-class key, used for logging and errors.
	pub base: &'a str,
	/// Byte offset of the sub-object from the start of the instance.
	pub offset: usize,
	/// Address of the host's table for this base.
	pub reference: usize,
	pub unknown: &'a SlotMask,
	/// Length of the table the sub-object points at.
	pub slots: usize,
}

/// Failures detected before any slot is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
	#[error("no host reference table for base {base}")]
	MissingReference { base: String },

	#[error("sub-object {base} at offset {offset:#x} has no dispatch table")]
	NullTable { base: String, offset: usize },

	#[error("unknown slot {slot} of base {base} lies past its {len}-slot table")]
	MaskOutOfRange {
		base: String,
		slot: usize,
		len: usize,
	},
}

/// What one table received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedTable {
	pub base: String,
	pub table: usize,
	pub slots: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchReport {
	pub tables: Vec<PatchedTable>,
}

impl PatchReport {
	/// Total slots written across all tables.
	pub fn slots(&self) -> usize {
		self.tables.iter().map(|t| t.slots).sum()
	}
}

/// Copies every slot flagged in `mask` from `reference` into `table`.
///
/// Applying the same mask and reference twice leaves the table as a single
/// application would. Returns the number of slots written.
///
/// # Safety
///
/// `table` must be valid for writes and `reference` valid for reads at every
/// index set in `mask`.
pub unsafe fn patch_table(table: *mut Slot, reference: *const Slot, mask: &SlotMask) -> usize {
	let mut written = 0;
	for index in mask.iter() {
		// SAFETY: upheld by the caller for every masked index.
		unsafe {
			let value = reference.add(index).read();
			table.add(index).write(value);
		}
		tracing::trace!(
			offset = format_args!("0x{:04X}", index * size_of::<Slot>()),
			"patched slot"
		);
		written += 1;
	}
	written
}

/// Reconciles every sub-object table of `object`.
///
/// All entries are validated before the first write, so an error leaves every
/// table untouched.
///
/// # Safety
///
/// `object` must point to a live instance whose layout places a table pointer
/// at each entry's `offset`, and that table must hold at least `slots` writable
/// entries. Each `reference` must be the address of the host's table for that
/// base in the running host build. That last condition cannot be checked: a
/// wrong compatibility table produces a hybrid table that dispatches into
/// arbitrary code.
pub unsafe fn patch_instance(
	object: NonNull<u8>,
	entries: &[PatchEntry<'_>],
) -> Result<PatchReport, PatchError> {
	let mut tables = Vec::with_capacity(entries.len());
	for entry in entries {
		if entry.reference == 0 {
			return Err(PatchError::MissingReference {
				base: entry.base.to_owned(),
			});
		}
		if let Some(slot) = entry.unknown.highest()
			&& slot >= entry.slots
		{
			return Err(PatchError::MaskOutOfRange {
				base: entry.base.to_owned(),
				slot,
				len: entry.slots,
			});
		}
		// SAFETY: the caller guarantees a table pointer at this offset.
		let table = unsafe { object.as_ptr().add(entry.offset).cast::<*mut Slot>().read() };
		if table.is_null() {
			return Err(PatchError::NullTable {
				base: entry.base.to_owned(),
				offset: entry.offset,
			});
		}
		tables.push(table);
	}

	let mut report = PatchReport::default();
	for (entry, table) in entries.iter().zip(tables) {
		tracing::info!(
			base = entry.base,
			table = ?table,
			reference = format_args!("{:#x}", entry.reference),
			unknown = entry.unknown.count(),
			"patching dispatch table"
		);
		let reference = entry.reference as *const Slot;
		// SAFETY: validated above; reference validity is the caller's contract.
		let slots = unsafe { patch_table(table, reference, entry.unknown) };
		report.tables.push(PatchedTable {
			base: entry.base.to_owned(),
			table: table as usize,
			slots,
		});
	}
	Ok(report)
}
