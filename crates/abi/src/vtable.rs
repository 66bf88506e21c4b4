//! Extension-side dispatch tables.

use std::ptr::NonNull;

use crate::mask::SlotMask;
use crate::slot::{Slot, VPtr};

/// A dispatch table owned by the extension, one per (record type, base).
///
/// The allocation holds one slot more than the table: the slot just before
/// the first method carries the host's type-information locator, as the host
/// compiler lays its own tables out. [`OwnedVTable::as_ptr`] points past it.
///
/// Tables are leaked on creation: instances point at them for the rest of the
/// process, and the patcher writes into them through raw pointers. No Rust
/// reference to the slots is ever handed out.
pub struct OwnedVTable {
	head: NonNull<Slot>,
	len: usize,
}

// SAFETY: the table is only mutated by the patcher, which runs once per type
// behind the registry latch on the host's main thread.
unsafe impl Send for OwnedVTable {}
unsafe impl Sync for OwnedVTable {}

impl OwnedVTable {
	/// Allocates a table of `len` null slots behind a null locator.
	pub fn new(len: usize) -> Self {
		let leaked: &'static mut [Slot] = Box::leak(vec![Slot::NULL; len + 1].into_boxed_slice());
		Self {
			head: NonNull::from(leaked).cast::<Slot>(),
			len,
		}
	}

	pub fn builder(len: usize) -> VTableBuilder {
		VTableBuilder::new(len)
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Address of slot 0.
	pub fn as_ptr(&self) -> *mut Slot {
		// SAFETY: the allocation has `len + 1` slots.
		unsafe { self.head.as_ptr().add(1) }
	}

	/// Pointer to store at the head of a sub-object.
	pub fn vptr(&self) -> VPtr {
		VPtr::new(self.as_ptr())
	}

	/// The slot preceding slot 0.
	pub fn locator(&self) -> Slot {
		// SAFETY: the head slot lives as long as the table.
		unsafe { self.head.as_ptr().read() }
	}

	pub fn get(&self, index: usize) -> Option<Slot> {
		// SAFETY: bounds checked; the allocation lives forever.
		(index < self.len).then(|| unsafe { self.as_ptr().add(index).read() })
	}

	/// Copies the current contents, without the locator.
	pub fn snapshot(&self) -> Vec<Slot> {
		(0..self.len).filter_map(|i| self.get(i)).collect()
	}
}

impl std::fmt::Debug for OwnedVTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OwnedVTable")
			.field("ptr", &self.as_ptr())
			.field("len", &self.len)
			.finish()
	}
}

/// Builds the table a compiler would have generated for one sub-object.
///
/// A table [inherited](VTableBuilder::inherit) from the host starts as a copy
/// of the host's table for that base; overrides replace single slots and
/// unknown slots are left null for the patcher to fill.
pub struct VTableBuilder {
	locator: Slot,
	slots: Vec<Slot>,
}

impl VTableBuilder {
	/// A table with every slot pointing at [`pure_call`].
	pub fn new(len: usize) -> Self {
		Self {
			locator: Slot::NULL,
			slots: vec![pure_call_slot(); len],
		}
	}

	/// Starts from the host's table for the base, locator included.
	///
	/// Null host entries fall back to [`pure_call`].
	///
	/// # Safety
	///
	/// `reference` must be valid for reads from index `-1` through `len - 1`.
	pub unsafe fn inherit(reference: *const Slot, len: usize) -> Self {
		// SAFETY: upheld by the caller.
		let (locator, slots) = unsafe {
			let locator = reference.sub(1).read();
			let slots = (0..len)
				.map(|i| reference.add(i).read())
				.map(|s| if s.is_null() { pure_call_slot() } else { s })
				.collect();
			(locator, slots)
		};
		Self { locator, slots }
	}

	pub fn locator(mut self, slot: Slot) -> Self {
		self.locator = slot;
		self
	}

	/// Points `index` at an extension implementation. Out-of-range indices are ignored.
	pub fn set(mut self, index: usize, slot: Slot) -> Self {
		if let Some(s) = self.slots.get_mut(index) {
			*s = slot;
		}
		self
	}

	/// Nulls every slot the extension cannot define.
	pub fn unknown(mut self, mask: &SlotMask) -> Self {
		for index in mask.iter() {
			if let Some(s) = self.slots.get_mut(index) {
				*s = Slot::NULL;
			}
		}
		self
	}

	pub fn build(self) -> OwnedVTable {
		let table = OwnedVTable::new(self.slots.len());
		// SAFETY: `table` has exactly this many slots behind its locator.
		unsafe {
			table.head.as_ptr().write(self.locator);
			for (i, slot) in self.slots.into_iter().enumerate() {
				table.as_ptr().add(i).write(slot);
			}
		}
		table
	}
}

/// Handler for slots that have no implementation on either side.
///
/// Reaching it means the host called a method neither it nor the record type
/// provides.
pub extern "C" fn pure_call() {
	tracing::error!("pure virtual slot called on an extension record");
}

fn pure_call_slot() -> Slot {
	Slot::from_ptr(pure_call as *const std::ffi::c_void)
}
