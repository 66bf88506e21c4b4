use std::fmt;

/// One-byte form type code.
///
/// Codes below the first extended code belong to the host's own form classes.
/// Extended codes are handed out by the type registry, one per registered record
/// type, and are never reused within a process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeCode(u8);

impl TypeCode {
	/// The "no type" code. A record reporting it is not usable.
	pub const INVALID: Self = Self(0);

	/// First code past the host's own form types.
	pub const FIRST_EXTENDED: Self = Self(0x46);

	pub const fn new(code: u8) -> Self {
		Self(code)
	}

	pub const fn get(self) -> u8 {
		self.0
	}

	pub const fn is_valid(self) -> bool {
		self.0 != 0
	}

	/// Returns the following code, or `None` once the byte range is spent.
	pub const fn checked_next(self) -> Option<Self> {
		match self.0.checked_add(1) {
			Some(next) => Some(Self(next)),
			None => None,
		}
	}
}

impl fmt::Display for TypeCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{:02X}", self.0)
	}
}

impl fmt::Debug for TypeCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeCode(0x{:02X})", self.0)
	}
}

/// Process-local numeric record identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct FormId(pub u32);

impl FormId {
	/// Id carried by records that have not been inserted into a store yet.
	pub const NONE: Self = Self(0);

	pub const fn is_none(self) -> bool {
		self.0 == 0
	}
}

impl fmt::Display for FormId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:08X}", self.0)
	}
}

impl fmt::Debug for FormId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "FormId({:08X})", self.0)
	}
}
