use std::ffi::c_void;
use std::fmt;

/// One dispatch-table entry: a code address, or null.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Slot(*const c_void);

// SAFETY: a slot is an address value; it is never dereferenced as data.
unsafe impl Send for Slot {}
unsafe impl Sync for Slot {}

impl Slot {
	pub const NULL: Self = Self(std::ptr::null());

	pub const fn from_ptr(ptr: *const c_void) -> Self {
		Self(ptr)
	}

	/// Wraps a raw host address.
	pub fn from_addr(addr: usize) -> Self {
		Self(addr as *const c_void)
	}

	pub fn as_ptr(self) -> *const c_void {
		self.0
	}

	pub fn addr(self) -> usize {
		self.0 as usize
	}

	pub fn is_null(self) -> bool {
		self.0.is_null()
	}
}

impl Default for Slot {
	fn default() -> Self {
		Self::NULL
	}
}

impl fmt::Debug for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Slot({:#x})", self.addr())
	}
}

/// Dispatch-table pointer stored at the head of every polymorphic sub-object.
///
/// Record structs embed one `VPtr` as the first field of each host base they
/// mirror, so the host finds the table exactly where its own objects keep it.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct VPtr(*mut Slot);

// SAFETY: the pointee is a leaked table; see `OwnedVTable`.
unsafe impl Send for VPtr {}
unsafe impl Sync for VPtr {}

impl VPtr {
	pub const NULL: Self = Self(std::ptr::null_mut());

	pub const fn new(table: *mut Slot) -> Self {
		Self(table)
	}

	pub fn table(self) -> *mut Slot {
		self.0
	}

	pub fn is_null(self) -> bool {
		self.0.is_null()
	}
}

impl Default for VPtr {
	fn default() -> Self {
		Self::NULL
	}
}

impl fmt::Debug for VPtr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "VPtr({:p})", self.0)
	}
}
