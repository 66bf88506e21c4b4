use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use formext_primitives::{Tag, TypeCode};

/// Produces a default-constructed instance of a record type.
pub type Factory<I> = fn() -> I;

/// Binary identity of one registered record type.
///
/// Descriptors live for the whole process once registered. Besides the identity
/// they own the per-type "patched" latch: dispatch-table fix-ups run once per
/// type, not once per instance, and the latch records whether that already
/// happened.
pub struct RecordTypeDescriptor<I> {
	code: TypeCode,
	short_name: Tag,
	module: &'static str,
	display_name: &'static str,
	factory: Factory<I>,
	patched: AtomicBool,
}

impl<I> RecordTypeDescriptor<I> {
	pub(crate) fn new(
		code: TypeCode,
		short_name: Tag,
		module: &'static str,
		display_name: &'static str,
		factory: Factory<I>,
	) -> Self {
		Self {
			code,
			short_name,
			module,
			display_name,
			factory,
			patched: AtomicBool::new(false),
		}
	}

	pub fn code(&self) -> TypeCode {
		self.code
	}

	/// Four-character name used as the on-disk record tag.
	pub fn short_name(&self) -> Tag {
		self.short_name
	}

	/// Name of the module that registered the type.
	pub fn module(&self) -> &'static str {
		self.module
	}

	/// Class name shown to users.
	pub fn display_name(&self) -> &'static str {
		self.display_name
	}

	/// Runs the factory.
	pub fn create(&self) -> I {
		(self.factory)()
	}

	/// Returns true once [`RecordTypeDescriptor::run_once`] succeeded.
	pub fn is_patched(&self) -> bool {
		self.patched.load(Ordering::Acquire)
	}

	/// Runs `f` if this type has not been patched yet.
	///
	/// Returns `Ok(true)` when `f` ran and succeeded, `Ok(false)` when the latch
	/// was already set. A failing `f` re-arms the latch so the next construction
	/// retries.
	pub fn run_once<E>(&self, f: impl FnOnce() -> Result<(), E>) -> Result<bool, E> {
		if self
			.patched
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return Ok(false);
		}

		match f() {
			Ok(()) => Ok(true),
			Err(e) => {
				self.patched.store(false, Ordering::Release);
				Err(e)
			}
		}
	}
}

impl<I> fmt::Debug for RecordTypeDescriptor<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RecordTypeDescriptor")
			.field("code", &self.code)
			.field("short_name", &self.short_name)
			.field("module", &self.module)
			.field("display_name", &self.display_name)
			.field("patched", &self.is_patched())
			.finish()
	}
}
