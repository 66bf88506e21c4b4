//! Construction of extended records: registry, table binding and patching.

use std::collections::hash_map::Entry;
use std::ptr::NonNull;

use formext_abi::{
	CompatTable, HostTarget, OwnedVTable, PatchEntry, PatchError, Slot, VPtr, VTableBuilder, patch_instance,
};
use formext_codec::ChunkRead;
use formext_config::Config;
use formext_primitives::TypeCode;
use formext_registry::{GlobalRegistry, RecordTypeDescriptor};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::LifecycleError;
use crate::record::{ExtendedRecord, SubObject};

pub type RecordFactory = fn() -> Box<dyn ExtendedRecord>;
pub type Registry = GlobalRegistry<Box<dyn ExtendedRecord>>;

/// Static description of a record type, submitted at link time.
#[derive(Debug)]
pub struct RecordTypeDef {
	pub module: &'static str,
	/// Four-character tag, unique across all extensions.
	pub short_name: &'static str,
	pub display_name: &'static str,
	pub factory: RecordFactory,
}

/// Registry wrapper for link-time record type definitions.
pub struct RecordTypeReg(pub &'static RecordTypeDef);
inventory::collect!(RecordTypeReg);

/// A generated table bound to one sub-object of a record type.
#[derive(Debug)]
struct BoundTable {
	base: &'static str,
	offset: usize,
	table: OwnedVTable,
}

/// Ties the type registry to one host's compatibility profile.
pub struct Lifecycle {
	registry: &'static Registry,
	compat: CompatTable,
	tables: Mutex<FxHashMap<TypeCode, Vec<BoundTable>>>,
}

impl Lifecycle {
	pub fn new(registry: &'static Registry, compat: CompatTable) -> Self {
		Self {
			registry,
			compat,
			tables: Mutex::new(FxHashMap::default()),
		}
	}

	/// Applies the configured first type code and compatibility profile.
	pub fn from_config(registry: &'static Registry, config: &Config) -> Result<Self, LifecycleError> {
		let compat = config.compat_table()?;
		if config.first_type_code() != TypeCode::FIRST_EXTENDED {
			registry.set_first_code(config.first_type_code())?;
		}
		Ok(Self::new(registry, compat))
	}

	pub fn host(&self) -> HostTarget {
		self.compat.target()
	}

	pub fn compat(&self) -> &CompatTable {
		&self.compat
	}

	pub fn registry(&self) -> &'static Registry {
		self.registry
	}

	pub fn register(&self, def: &RecordTypeDef) -> Result<TypeCode, LifecycleError> {
		Ok(self
			.registry
			.register(def.module, def.short_name, def.display_name, def.factory)?)
	}

	/// Registers every type submitted with `inventory::submit!`.
	///
	/// Stops at the first rejected registration.
	pub fn register_collected(&self) -> Result<Vec<TypeCode>, LifecycleError> {
		let mut defs: Vec<_> = inventory::iter::<RecordTypeReg>().map(|r| r.0).collect();
		defs.sort_by_key(|d| (d.module, d.short_name));
		defs.into_iter().map(|def| self.register(def)).collect()
	}

	pub fn seal(&self) {
		self.registry.seal();
	}

	pub fn lookup(&self, short_name: &str) -> Result<TypeCode, LifecycleError> {
		Ok(self.registry.lookup(short_name)?)
	}

	pub fn descriptor(
		&self,
		code: TypeCode,
	) -> Result<&'static RecordTypeDescriptor<Box<dyn ExtendedRecord>>, LifecycleError> {
		Ok(self.registry.descriptor(code)?)
	}

	/// Builds a default instance of `code` with patched dispatch tables.
	///
	/// Each table starts as a copy of the host's table for its base, with the
	/// record type's overrides on top. The first creation seals the registry. Patching runs once per type; a
	/// failed patch re-arms so the next creation retries.
	pub fn create(&self, code: TypeCode) -> Result<Box<dyn ExtendedRecord>, LifecycleError> {
		let descriptor = self.descriptor(code)?;
		let mut record = descriptor.create();
		record.form_mut().set_type_code(code);

		let layout = record.layout();
		let heads = self.bind_tables(code, &*record)?;
		let object = record.object_ptr();
		for (offset, vptr) in heads {
			// SAFETY: `ExtendedRecord` guarantees a `VPtr` at every layout offset.
			unsafe { object.as_ptr().add(offset).cast::<VPtr>().write(vptr) };
		}

		let patched = descriptor.run_once(|| self.patch(code, layout, object))?;
		tracing::debug!(
			code = %code,
			short_name = %descriptor.short_name(),
			class = descriptor.display_name(),
			patched,
			"created record"
		);
		Ok(record)
	}

	pub fn create_by_name(&self, short_name: &str) -> Result<Box<dyn ExtendedRecord>, LifecycleError> {
		self.create(self.lookup(short_name)?)
	}

	/// Returns the table pointer to store at each sub-object of `record`,
	/// generating the type's tables on first use.
	fn bind_tables(
		&self,
		code: TypeCode,
		record: &dyn ExtendedRecord,
	) -> Result<Vec<(usize, VPtr)>, LifecycleError> {
		let mut tables = self.tables.lock();
		let bound = match tables.entry(code) {
			Entry::Occupied(e) => e.into_mut(),
			Entry::Vacant(e) => e.insert(self.generate_tables(code, record)?),
		};
		Ok(bound.iter().map(|t| (t.offset, t.table.vptr())).collect())
	}

	fn generate_tables(&self, code: TypeCode, record: &dyn ExtendedRecord) -> Result<Vec<BoundTable>, LifecycleError> {
		let overrides = record.slot_overrides(self.host());
		record
			.layout()
			.iter()
			.map(|sub| -> Result<BoundTable, LifecycleError> {
				let entry = self
					.compat
					.get(sub.base)
					.ok_or(LifecycleError::MissingCompat { base: sub.base, code })?;
				if entry.vtable == 0 {
					return Err(PatchError::MissingReference {
						base: sub.base.to_owned(),
					}
					.into());
				}
				// SAFETY: a compatibility entry names the host's table for this
				// base, `entry.slots()` long and preceded by its locator.
				let inherited = unsafe { VTableBuilder::inherit(entry.vtable as *const Slot, entry.slots()) };
				let table = overrides
					.iter()
					.filter(|o| o.base == sub.base)
					.fold(inherited, |b, o| b.set(o.index, o.slot))
					.unknown(&entry.unknown)
					.build();
				tracing::trace!(
					code = %code,
					base = sub.base,
					slots = table.len(),
					table = ?table.as_ptr(),
					"generated dispatch table"
				);
				Ok(BoundTable {
					base: sub.base,
					offset: sub.offset,
					table,
				})
			})
			.collect()
	}

	fn patch(&self, code: TypeCode, layout: &[SubObject], object: NonNull<u8>) -> Result<(), LifecycleError> {
		let entries = layout
			.iter()
			.map(|sub| {
				let entry = self
					.compat
					.get(sub.base)
					.ok_or(LifecycleError::MissingCompat { base: sub.base, code })?;
				Ok(PatchEntry {
					base: sub.base,
					offset: sub.offset,
					reference: entry.vtable,
					unknown: &entry.unknown,
					slots: entry.slots(),
				})
			})
			.collect::<Result<Vec<_>, LifecycleError>>()?;
		// SAFETY: the tables were just bound through the record's layout and
		// sized from these entries. Reference validity is the compatibility
		// table's contract.
		let report = unsafe { patch_instance(object, &entries)? };
		tracing::info!(
			code = %code,
			tables = report.tables.len(),
			slots = report.slots(),
			"patched record type"
		);
		Ok(())
	}

	/// Generated table for `base` of `code`, once bound.
	pub fn table(&self, code: TypeCode, base: &str) -> Option<VPtr> {
		self.tables
			.lock()
			.get(&code)?
			.iter()
			.find(|t| t.base == base)
			.map(|t| t.table.vptr())
	}
}

/// Loads `record` from `stream`, reporting success as a boolean.
pub fn load_form(record: &mut dyn ExtendedRecord, stream: &mut dyn ChunkRead) -> bool {
	match record.load(stream) {
		Ok(report) => {
			tracing::debug!(
				decoded = report.decoded,
				unrecognized = report.unrecognized.len(),
				"record loaded"
			);
			true
		}
		Err(error) => {
			tracing::error!(
				code = %record.type_code(),
				editor_id = record.form().editor_id().unwrap_or_default(),
				%error,
				"record load failed"
			);
			false
		}
	}
}
