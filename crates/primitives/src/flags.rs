bitflags::bitflags! {
	/// Record header flags as the host stores them.
	///
	/// Only the bits the extension acts on are named; unknown bits survive a
	/// round-trip through [`FormFlags::from_bits_retain`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	#[repr(transparent)]
	pub struct FormFlags: u32 {
		/// Record is marked deleted in its plugin file.
		const DELETED = 0x0000_0020;
		/// Record is skipped by the loader.
		const IGNORED = 0x0000_1000;
		/// Record is a scratch copy (editor dialogs, duplication buffers).
		///
		/// Copying into a temporary record also copies identity fields.
		const TEMPORARY = 0x0000_4000;
	}
}

impl FormFlags {
	pub const fn is_temporary(self) -> bool {
		self.contains(Self::TEMPORARY)
	}
}
