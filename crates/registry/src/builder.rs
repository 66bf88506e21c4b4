use formext_primitives::{Tag, TypeCode};
use rustc_hash::FxHashMap as HashMap;

use crate::descriptor::{Factory, RecordTypeDescriptor};
use crate::error::{RegistryError, Result};
use crate::table::TypeRegistry;

/// Registration-phase state: assigns codes and rejects duplicate short names.
pub struct RegistryBuilder<I> {
	first_code: TypeCode,
	next_code: Option<TypeCode>,
	entries: Vec<RecordTypeDescriptor<I>>,
	by_name: HashMap<Tag, usize>,
}

impl<I> RegistryBuilder<I> {
	/// Creates an empty builder handing out codes from `first_code` upward.
	pub fn new(first_code: TypeCode) -> Self {
		Self {
			first_code,
			next_code: Some(first_code),
			entries: Vec::new(),
			by_name: HashMap::default(),
		}
	}

	/// Returns the number of registered types.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if no type was registered yet.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// First code this builder hands out.
	pub fn first_code(&self) -> TypeCode {
		self.first_code
	}

	/// Registers a record type and returns its freshly assigned code.
	///
	/// A rejected registration leaves the builder untouched, so earlier
	/// registrations stay valid.
	pub fn register(
		&mut self,
		module: &'static str,
		short_name: &str,
		display_name: &'static str,
		factory: Factory<I>,
	) -> Result<TypeCode> {
		let tag = Tag::parse(short_name)?;

		if let Some(&idx) = self.by_name.get(&tag) {
			let existing = &self.entries[idx];
			return Err(RegistryError::DuplicateShortName {
				short_name: tag,
				module,
				existing_module: existing.module(),
				existing_code: existing.code(),
			});
		}

		let code = self.next_code.ok_or(RegistryError::CodesExhausted {
			last: TypeCode::new(u8::MAX),
		})?;
		self.next_code = code.checked_next();

		self.by_name.insert(tag, self.entries.len());
		self.entries.push(RecordTypeDescriptor::new(
			code,
			tag,
			module,
			display_name,
			factory,
		));

		tracing::info!(
			module,
			class = display_name,
			short_name = %tag,
			code = %code,
			"registered record type"
		);
		Ok(code)
	}

	/// Looks up a code during the registration phase.
	pub fn lookup(&self, short_name: &str) -> Result<TypeCode> {
		Tag::parse(short_name)
			.ok()
			.and_then(|tag| self.by_name.get(&tag))
			.map(|&idx| self.entries[idx].code())
			.ok_or_else(|| RegistryError::NotFound(short_name.to_owned()))
	}

	/// Closes the registration phase.
	pub fn build(self) -> TypeRegistry<I> {
		TypeRegistry::from_entries(self.entries)
	}
}
