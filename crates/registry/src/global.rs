//! Process-wide registry cell.

use std::sync::OnceLock;

use formext_primitives::TypeCode;
use parking_lot::Mutex;

use crate::builder::RegistryBuilder;
use crate::descriptor::{Factory, RecordTypeDescriptor};
use crate::error::{RegistryError, Result};
use crate::table::TypeRegistry;

/// Two-phase registry suitable for a `static`.
///
/// Registration is append-only until the cell is sealed; afterwards every read
/// goes through the immutable [`TypeRegistry`] without locking. The first
/// [`GlobalRegistry::create_instance`] seals implicitly, so registration can
/// never interleave with construction.
///
/// ```ignore
/// static TYPES: GlobalRegistry<Box<dyn ExtendedRecord>> = GlobalRegistry::new();
/// ```
pub struct GlobalRegistry<I> {
	open: Mutex<Option<RegistryBuilder<I>>>,
	sealed: OnceLock<TypeRegistry<I>>,
}

impl<I> Default for GlobalRegistry<I> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I> GlobalRegistry<I> {
	pub const fn new() -> Self {
		Self {
			open: parking_lot::const_mutex(None),
			sealed: OnceLock::new(),
		}
	}

	/// Moves the start of the extended code range.
	///
	/// Only allowed before the first registration.
	pub fn set_first_code(&self, first: TypeCode) -> Result<()> {
		let mut open = self.open.lock();
		if self.sealed.get().is_some() || open.as_ref().is_some_and(|b| !b.is_empty()) {
			return Err(RegistryError::CodesAssigned);
		}
		*open = Some(RegistryBuilder::new(first));
		Ok(())
	}

	/// Registers a record type. Fails once the registry is sealed.
	pub fn register(
		&self,
		module: &'static str,
		short_name: &str,
		display_name: &'static str,
		factory: Factory<I>,
	) -> Result<TypeCode> {
		let mut open = self.open.lock();
		if self.sealed.get().is_some() {
			return Err(RegistryError::Sealed {
				short_name: short_name.to_owned(),
				module,
			});
		}
		open.get_or_insert_with(|| RegistryBuilder::new(TypeCode::FIRST_EXTENDED))
			.register(module, short_name, display_name, factory)
	}

	/// Closes the registration phase and returns the sealed table.
	pub fn seal(&self) -> &TypeRegistry<I> {
		if let Some(table) = self.sealed.get() {
			return table;
		}
		let mut open = self.open.lock();
		self.sealed.get_or_init(|| {
			let builder = open
				.take()
				.unwrap_or_else(|| RegistryBuilder::new(TypeCode::FIRST_EXTENDED));
			tracing::debug!(types = builder.len(), "sealing record type registry");
			builder.build()
		})
	}

	pub fn is_sealed(&self) -> bool {
		self.sealed.get().is_some()
	}

	/// Creates an instance, sealing the registry first if needed.
	pub fn create_instance(&self, code: TypeCode) -> Result<I> {
		self.seal().create_instance(code)
	}

	/// Resolves a short name in either phase.
	pub fn lookup(&self, short_name: &str) -> Result<TypeCode> {
		if let Some(table) = self.sealed.get() {
			return table.lookup(short_name);
		}
		let open = self.open.lock();
		match self.sealed.get() {
			Some(table) => table.lookup(short_name),
			None => open
				.as_ref()
				.ok_or_else(|| RegistryError::NotFound(short_name.to_owned()))?
				.lookup(short_name),
		}
	}

	/// Returns the descriptor for `code`, sealing the registry first if needed.
	pub fn descriptor(&self, code: TypeCode) -> Result<&RecordTypeDescriptor<I>> {
		self.seal()
			.descriptor(code)
			.ok_or(RegistryError::UnknownType(code))
	}
}
