use formext_primitives::{Tag, TypeCode};
use rustc_hash::FxHashMap as HashMap;

use crate::descriptor::RecordTypeDescriptor;
use crate::error::{RegistryError, Result};

/// Sealed, read-only registry.
pub struct TypeRegistry<I> {
	entries: Vec<RecordTypeDescriptor<I>>,
	by_code: HashMap<TypeCode, usize>,
	by_name: HashMap<Tag, usize>,
}

impl<I> TypeRegistry<I> {
	pub(crate) fn from_entries(entries: Vec<RecordTypeDescriptor<I>>) -> Self {
		let mut by_code = HashMap::with_capacity_and_hasher(entries.len(), Default::default());
		let mut by_name = HashMap::with_capacity_and_hasher(entries.len(), Default::default());
		for (idx, entry) in entries.iter().enumerate() {
			by_code.insert(entry.code(), idx);
			by_name.insert(entry.short_name(), idx);
		}
		Self {
			entries,
			by_code,
			by_name,
		}
	}

	/// Invokes the factory registered for `code`.
	pub fn create_instance(&self, code: TypeCode) -> Result<I> {
		self.descriptor(code)
			.map(RecordTypeDescriptor::create)
			.ok_or(RegistryError::UnknownType(code))
	}

	/// Resolves a short name to its type code.
	pub fn lookup(&self, short_name: &str) -> Result<TypeCode> {
		Tag::parse(short_name)
			.ok()
			.and_then(|tag| self.lookup_tag(tag))
			.ok_or_else(|| RegistryError::NotFound(short_name.to_owned()))
	}

	/// Resolves an on-disk record tag to its type code.
	pub fn lookup_tag(&self, tag: Tag) -> Option<TypeCode> {
		self.by_name.get(&tag).map(|&idx| self.entries[idx].code())
	}

	pub fn descriptor(&self, code: TypeCode) -> Option<&RecordTypeDescriptor<I>> {
		self.by_code.get(&code).map(|&idx| &self.entries[idx])
	}

	/// Iterates descriptors in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &RecordTypeDescriptor<I>> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
