use std::any::Any;
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

use formext_abi::{
	CompatEntry, CompatTable, ExtensionHandle, HostTarget, PatchError, Slot, VTableBuilder, base,
};
use formext_codec::{ChunkWrite, DecodeReport, RecordReader, RecordWriter, Tag};
use formext_config::Config;
use formext_primitives::{FormFlags, FormId, TypeCode};
use formext_registry::RegistryError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::dispatch::{
	CompareToFn, CopyFromFn, DestructorFn, FormTypeFn, LoadFormFn, ReadStream, SaveFormFn, WriteStream, slots,
};
use crate::record::{DATA, EDID};

extern "C" fn host_method() {}

fn host_slot() -> Slot {
	Slot::from_ptr(host_method as *const c_void)
}

extern "C" fn host_type_info() {}

fn locator_slot() -> Slot {
	Slot::from_ptr(host_type_info as *const c_void)
}

/// Built-in masks, with reference tables that live in this process.
fn fake_host(target: HostTarget) -> CompatTable {
	let mut compat = CompatTable::empty(target);
	for (key, entry) in CompatTable::builtin(target).iter() {
		let len = entry.slots();
		let reference = (0..len)
			.fold(VTableBuilder::new(len), |b, i| b.set(i, host_slot()))
			.locator(locator_slot())
			.build();
		compat.insert(
			key,
			CompatEntry {
				vtable: reference.as_ptr() as usize,
				unknown: entry.unknown.clone(),
			},
		);
	}
	compat
}

fn leaked_registry() -> &'static Registry {
	Box::leak(Box::new(Registry::new()))
}

fn lifecycle_with(compat: CompatTable) -> (Lifecycle, TypeCode) {
	let lifecycle = Lifecycle::new(leaked_registry(), compat);
	let code = lifecycle.register(&my_form::DEF).unwrap();
	(lifecycle, code)
}

fn lifecycle(target: HostTarget) -> (Lifecycle, TypeCode) {
	lifecycle_with(fake_host(target))
}

fn my_form(record: &dyn ExtendedRecord) -> &MyForm {
	record.downcast_ref::<MyForm>().unwrap()
}

fn my_form_mut(record: &mut dyn ExtendedRecord) -> &mut MyForm {
	let any: &mut dyn Any = record;
	any.downcast_mut::<MyForm>().unwrap()
}

fn slot_at(table: formext_abi::VPtr, index: usize) -> Slot {
	// SAFETY: tests only read indices below the generated table length.
	unsafe { table.table().add(index).read() }
}

#[rstest]
#[case(HostTarget::Game)]
#[case(HostTarget::Editor)]
fn create_binds_and_patches_every_sub_object(#[case] target: HostTarget) {
	let (lifecycle, code) = lifecycle(target);
	let mut record = lifecycle.create(code).unwrap();

	assert_eq!(record.type_code(), code);
	assert!(lifecycle.registry().is_sealed());
	assert!(lifecycle.descriptor(code).unwrap().is_patched());

	let overridden: Vec<usize> = [
		slots::DESTRUCTOR,
		slots::LOAD_FORM,
		slots::SAVE_FORM,
		slots::GET_FORM_TYPE,
		slots::COPY_FROM,
		slots::COMPARE_TO,
	]
	.iter()
	.map(|s| s.get(target))
	.collect();

	for sub in record.layout() {
		let entry = lifecycle.compat().get(sub.base).unwrap();
		let table = lifecycle.table(code, sub.base).unwrap();
		// SAFETY: generated tables carry the locator in slot -1.
		assert_eq!(unsafe { table.table().sub(1).read() }, locator_slot(), "{} locator", sub.base);
		for index in 0..entry.slots() {
			if sub.base == base::FORM && overridden.contains(&index) {
				assert_ne!(slot_at(table, index), host_slot(), "{} slot {index}", sub.base);
			} else {
				assert_eq!(slot_at(table, index), host_slot(), "{} slot {index}", sub.base);
			}
		}
	}

	let primary = record.form().vptr();
	assert_eq!(Some(primary), lifecycle.table(code, base::FORM));

	let get_type = slot_at(primary, slots::GET_FORM_TYPE.get(target));
	assert_ne!(get_type, host_slot());
	// SAFETY: the slot holds `dispatch::form_type`.
	let get_type: FormTypeFn = unsafe { std::mem::transmute(get_type.as_ptr()) };
	let object = record.object_ptr().as_ptr().cast::<FormHeader>();
	assert_eq!(unsafe { get_type(object) }, code.get());
}

#[test]
fn later_instances_share_tables_without_repatching() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let first = lifecycle.create(code).unwrap();
	let second = lifecycle.create(code).unwrap();
	assert_eq!(first.form().vptr(), second.form().vptr());

	let descriptor = lifecycle.descriptor(code).unwrap();
	assert!(descriptor.is_patched());
	assert_eq!(descriptor.run_once(|| Err::<(), ()>(())), Ok(false));
}

#[test]
fn missing_compat_entry_fails_creation() {
	let (lifecycle, code) = lifecycle_with(CompatTable::empty(HostTarget::Game));
	match lifecycle.create(code) {
		Err(LifecycleError::MissingCompat { base: missing, code: c }) => {
			assert_eq!(missing, base::FORM);
			assert_eq!(c, code);
		}
		other => panic!("unexpected {:?}", other.map(|r| r.type_code())),
	}
	assert!(!lifecycle.descriptor(code).unwrap().is_patched());
}

#[test]
fn missing_reference_leaves_type_unpatched() {
	let mut compat = fake_host(HostTarget::Editor);
	let icon = compat.get(base::ICON).unwrap().clone();
	compat.insert(
		base::ICON,
		CompatEntry {
			vtable: 0,
			unknown: icon.unknown,
		},
	);
	let (lifecycle, code) = lifecycle_with(compat);

	for _ in 0..2 {
		match lifecycle.create(code) {
			Err(LifecycleError::Patch(PatchError::MissingReference { base: missing })) => {
				assert_eq!(missing, base::ICON)
			}
			other => panic!("unexpected {:?}", other.map(|r| r.type_code())),
		}
		assert!(!lifecycle.descriptor(code).unwrap().is_patched());
	}
}

#[test]
fn duplicate_short_name_keeps_first_registration() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	assert_eq!(code, TypeCode::FIRST_EXTENDED);

	let err = lifecycle.register(&my_form::DEF).unwrap_err();
	assert!(matches!(
		err,
		LifecycleError::Registry(RegistryError::DuplicateShortName { existing_code, .. }) if existing_code == code
	));
	assert_eq!(lifecycle.lookup(my_form::SHORT_NAME).unwrap(), code);
	assert_eq!(lifecycle.create_by_name("MYFM").unwrap().type_code(), code);
}

#[test]
fn register_after_first_create_is_rejected() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	lifecycle.create(code).unwrap();
	let other = RecordTypeDef {
		module: "late",
		short_name: "LATE",
		display_name: "Late",
		factory: MyForm::create,
	};
	assert!(matches!(
		lifecycle.register(&other),
		Err(LifecycleError::Registry(RegistryError::Sealed { .. }))
	));
}

#[test]
fn register_collected_finds_my_form() {
	let lifecycle = Lifecycle::new(leaked_registry(), fake_host(HostTarget::Game));
	let codes = lifecycle.register_collected().unwrap();
	let code = lifecycle.lookup(my_form::SHORT_NAME).unwrap();
	assert!(codes.contains(&code));
	assert_eq!(lifecycle.descriptor(code).unwrap().display_name(), my_form::CLASS_NAME);
}

#[test]
fn from_config_applies_first_code() {
	let config = Config::parse("first_type_code = 0x60").unwrap();
	let lifecycle = Lifecycle::from_config(leaked_registry(), &config).unwrap();
	assert_eq!(lifecycle.host(), HostTarget::Game);
	assert_eq!(lifecycle.register(&my_form::DEF).unwrap(), TypeCode::new(0x60));
}

fn populated(lifecycle: &Lifecycle, code: TypeCode) -> Box<dyn ExtendedRecord> {
	let mut record = lifecycle.create(code).unwrap();
	record.form_mut().form_id = FormId(0x900);
	record.form_mut().set_editor_id("IronSword");
	let form = my_form_mut(&mut *record);
	form.set_name("Iron Sword");
	form.set_description("A plain blade.");
	form.set_icon("weapons/iron_sword.dds");
	form.set_value(25);
	form.set_weight(12.5);
	form.extra_data = 7;
	record
}

#[test]
fn copy_into_persistent_record_keeps_identity() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let source = populated(&lifecycle, code);
	let mut dest = lifecycle.create(code).unwrap();
	dest.form_mut().form_id = FormId(0x901);

	dest.copy_from(&*source);

	assert!(!dest.compare_to(&*source));
	assert_eq!(dest.form().form_id, FormId(0x901));
	assert_eq!(dest.form().editor_id(), None);
	assert_eq!(my_form(&*dest).extra_data, 7);
	assert_eq!(my_form(&*dest).name(), "Iron Sword");
}

#[test]
fn copy_into_temporary_record_takes_identity() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let source = populated(&lifecycle, code);
	let mut dest = lifecycle.create(code).unwrap();
	dest.form_mut().flags.insert(FormFlags::TEMPORARY);

	dest.copy_from(&*source);

	assert_eq!(dest.form().form_id, FormId(0x900));
	assert_eq!(dest.form().editor_id(), Some("IronSword"));
	assert!(!dest.compare_to(&*source));
}

#[test]
fn compare_ignores_identity_but_sees_private_fields() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let a = populated(&lifecycle, code);
	let mut b = populated(&lifecycle, code);
	b.form_mut().form_id = FormId(0xABC);
	b.form_mut().set_editor_id("Other");
	assert!(!a.compare_to(&*b));

	my_form_mut(&mut *b).extra_data = 8;
	assert!(a.compare_to(&*b));

	my_form_mut(&mut *b).extra_data = 7;
	my_form_mut(&mut *b).set_weight(1.0);
	assert!(a.compare_to(&*b));
}

static NOTE_DROPS: AtomicUsize = AtomicUsize::new(0);

/// A second record type with a single component.
#[repr(C)]
#[derive(Debug, Default)]
struct Note {
	form: FormHeader,
	full_name: FullName,
}

impl Drop for Note {
	fn drop(&mut self) {
		NOTE_DROPS.fetch_add(1, Ordering::SeqCst);
	}
}

const NOTE_LAYOUT: [SubObject; 2] = [
	SubObject {
		base: base::FORM,
		offset: std::mem::offset_of!(Note, form),
	},
	SubObject {
		base: base::FULL_NAME,
		offset: std::mem::offset_of!(Note, full_name),
	},
];

// SAFETY: both layout entries name `VPtr` heads, the header first.
unsafe impl ExtendedRecord for Note {
	fn form(&self) -> &FormHeader {
		&self.form
	}

	fn form_mut(&mut self) -> &mut FormHeader {
		&mut self.form
	}

	fn layout(&self) -> &'static [SubObject] {
		&NOTE_LAYOUT
	}

	fn slot_overrides(&self, host: HostTarget) -> Vec<dispatch::SlotOverride> {
		dispatch::form_overrides::<Self>(host)
	}

	fn components(&self) -> Components<'_> {
		Components {
			full_name: Some(&self.full_name),
			..Components::default()
		}
	}

	fn components_mut(&mut self) -> ComponentsMut<'_> {
		ComponentsMut {
			full_name: Some(&mut self.full_name),
			..ComponentsMut::default()
		}
	}

	fn load(&mut self, stream: &mut dyn formext_codec::ChunkRead) -> Result<DecodeReport, LoadError> {
		record::load_record(self, stream, &record::standard_handlers())
	}

	fn copy_from(&mut self, other: &dyn ExtendedRecord) {
		record::copy_common(self, other);
	}

	fn compare_to(&self, other: &dyn ExtendedRecord) -> bool {
		record::compare_common(self, other).is_none()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

fn new_note() -> Box<dyn ExtendedRecord> {
	Box::new(Note::default())
}

fn register_note(lifecycle: &Lifecycle) -> TypeCode {
	lifecycle
		.register(&RecordTypeDef {
			module: "tests",
			short_name: "NOTE",
			display_name: "Note",
			factory: new_note,
		})
		.unwrap()
}

#[test]
fn records_of_different_types_always_differ() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let note_code = register_note(&lifecycle);
	let mut form = populated(&lifecycle, code);
	let mut note = lifecycle.create(note_code).unwrap();
	note.form_mut().set_editor_id("Note");

	assert!(form.compare_to(&*note));
	assert!(note.compare_to(&*form));

	form.copy_from(&*note);
	note.copy_from(&*form);
	assert_eq!(my_form(&*form).name(), "Iron Sword");
	assert_eq!(note.form().editor_id(), Some("Note"));
}

#[test]
fn same_code_but_different_rust_type_differs() {
	let form = MyForm::default();
	let note = Note::default();
	assert_eq!(form.type_code(), note.type_code());
	assert!(form.compare_to(&note));
}

#[test]
fn dispatch_compare_checks_type_code_first() {
	let (lifecycle, code) = lifecycle(HostTarget::Editor);
	let mut a = populated(&lifecycle, code);
	let mut b = populated(&lifecycle, code);
	let compare = slot_at(a.form().vptr(), slots::COMPARE_TO.get(HostTarget::Editor));
	// SAFETY: the slot holds `dispatch::compare_to::<MyForm>`.
	let compare: CompareToFn = unsafe { std::mem::transmute(compare.as_ptr()) };

	let pa = a.object_ptr().as_ptr();
	let pb = b.object_ptr().as_ptr();
	assert!(!unsafe { compare(pa.cast::<c_void>(), pb.cast::<FormHeader>()) });

	b.form_mut().set_type_code(TypeCode::new(0x01));
	let pb = b.object_ptr().as_ptr();
	assert!(unsafe { compare(pa.cast::<c_void>(), pb.cast::<FormHeader>()) });
}

#[test]
fn dispatch_copy_onto_itself_changes_nothing() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut record = populated(&lifecycle, code);
	let copy = slot_at(record.form().vptr(), slots::COPY_FROM.get(HostTarget::Game));
	// SAFETY: the slot holds `dispatch::copy_from::<MyForm>`.
	let copy: CopyFromFn = unsafe { std::mem::transmute(copy.as_ptr()) };

	let object = record.object_ptr().as_ptr();
	unsafe { copy(object.cast::<c_void>(), object.cast::<FormHeader>()) };
	assert_eq!(my_form(&*record).name(), "Iron Sword");
	assert_eq!(my_form(&*record).description(), "A plain blade.");
	assert_eq!(record.form().editor_id(), Some("IronSword"));

	let mut other = lifecycle.create(code).unwrap();
	let dest = other.object_ptr().as_ptr();
	let source = record.object_ptr().as_ptr();
	unsafe { copy(dest.cast::<c_void>(), source.cast::<FormHeader>()) };
	assert!(!other.compare_to(&*record));
}

#[rstest]
#[case(HostTarget::Game)]
#[case(HostTarget::Editor)]
fn dispatch_save_and_load_go_through_the_stream_handles(#[case] target: HostTarget) {
	let (lifecycle, code) = lifecycle(target);
	let source = populated(&lifecycle, code);
	let primary = source.form().vptr();
	// SAFETY: the slots hold `dispatch::save::<MyForm>` and `dispatch::load::<MyForm>`.
	let (save_slot, load_slot): (SaveFormFn, LoadFormFn) = unsafe {
		(
			std::mem::transmute(slot_at(primary, slots::SAVE_FORM.get(target)).as_ptr()),
			std::mem::transmute(slot_at(primary, slots::LOAD_FORM.get(target)).as_ptr()),
		)
	};

	let mut writer = RecordWriter::new();
	let mut output = WriteStream(&mut writer);
	let this = (&*source as *const dyn ExtendedRecord).cast::<c_void>();
	assert!(unsafe { save_slot(this, (&raw mut output).cast::<c_void>()) });
	let bytes = writer.into_bytes();
	assert_eq!(bytes, save(&*source));

	let mut target_record = lifecycle.create(code).unwrap();
	let mut reader = RecordReader::new(bytes.clone());
	let mut input = ReadStream(&mut reader);
	let this = target_record.object_ptr().as_ptr().cast::<c_void>();
	assert!(unsafe { load_slot(this, (&raw mut input).cast::<c_void>()) });
	assert!(!target_record.compare_to(&*source));
	assert_eq!(target_record.form().editor_id(), Some("IronSword"));

	let mut truncated = RecordReader::new(bytes.slice(..bytes.len() - 3));
	let mut input = ReadStream(&mut truncated);
	let mut fresh = lifecycle.create(code).unwrap();
	let this = fresh.object_ptr().as_ptr().cast::<c_void>();
	assert!(!unsafe { load_slot(this, (&raw mut input).cast::<c_void>()) });
}

#[test]
fn dispatch_destructor_frees_the_boxed_instance() {
	let (lifecycle, _) = lifecycle(HostTarget::Editor);
	let note_code = register_note(&lifecycle);
	let note = lifecycle.create(note_code).unwrap();
	let destroy = slot_at(note.form().vptr(), slots::DESTRUCTOR.get(HostTarget::Editor));
	// SAFETY: the slot holds `dispatch::destroy::<Note>`.
	let destroy: DestructorFn = unsafe { std::mem::transmute(destroy.as_ptr()) };

	let before = NOTE_DROPS.load(Ordering::SeqCst);
	let object = Box::into_raw(note).cast::<c_void>();
	// SAFETY: `object` came from `Box<Note>` and is not used again.
	let returned = unsafe { destroy(object, 1) };
	assert_eq!(returned, object);
	assert!(NOTE_DROPS.load(Ordering::SeqCst) > before);
}

#[test]
fn editor_id_is_truncated_on_a_char_boundary() {
	let mut header = FormHeader::default();
	header.set_editor_id(&"é".repeat(400));
	let id = header.editor_id().unwrap();
	assert!(id.len() <= EDITOR_ID_MAX);
	assert_eq!(id.len(), 510);

	header.set_editor_id("");
	assert_eq!(header.editor_id(), None);
}

#[test]
fn my_form_matches_the_host_object_layout() {
	let form = MyForm::default();
	let offsets: Vec<usize> = form.layout().iter().map(|sub| sub.offset).collect();
	let (expected, extra, size) = if cfg!(target_pointer_width = "32") {
		(vec![0, 0x18, 0x24, 0x2C, 0x38, 0x40], 0x48, 0x4C)
	} else {
		(vec![0, 0x28, 0x40, 0x50, 0x68, 0x78], 0x88, 0x90)
	};
	assert_eq!(offsets, expected);
	assert_eq!(std::mem::offset_of!(MyForm, extra_data), extra);
	assert_eq!(size_of::<MyForm>(), size);
	assert_eq!(size_of::<FormHeader>(), expected[1]);
}

fn save(record: &dyn ExtendedRecord) -> bytes::Bytes {
	let mut writer = RecordWriter::new();
	record.save(&mut writer).unwrap();
	writer.into_bytes()
}

fn load(bytes: bytes::Bytes) -> (MyForm, Result<DecodeReport, LoadError>) {
	let mut form = MyForm::default();
	let result = form.load(&mut RecordReader::new(bytes));
	(form, result)
}

#[test]
fn save_writes_editor_id_first_then_components() {
	let mut form = MyForm::default();
	form.form_mut().set_editor_id("A");
	form.set_name("B");
	form.set_value(3);
	form.set_weight(0.5);
	form.extra_data = 9;

	let mut expected = RecordWriter::new();
	expected.write_zstring(EDID, "A").unwrap();
	expected.write_zstring(FullName::TAG, "B").unwrap();
	let mut data = 3i32.to_le_bytes().to_vec();
	data.extend_from_slice(&0.5f32.to_le_bytes());
	data.extend_from_slice(&9u32.to_le_bytes());
	expected.write_payload(DATA, &data).unwrap();

	assert_eq!(save(&form), expected.into_bytes());
}

#[test]
fn short_private_tail_is_tolerated() {
	let mut writer = RecordWriter::new();
	let mut data = 40i32.to_le_bytes().to_vec();
	data.extend_from_slice(&2.0f32.to_le_bytes());
	data.extend_from_slice(&[0x34, 0x12]);
	writer.write_payload(DATA, &data).unwrap();

	let (form, result) = load(writer.into_bytes());
	result.unwrap();
	assert_eq!(form.value(), 40);
	assert_eq!(form.weight(), 2.0);
	assert_eq!(form.extra_data, 0x1234);
}

#[test]
fn short_generic_part_is_malformed() {
	let mut writer = RecordWriter::new();
	writer.write_zstring(FullName::TAG, "kept").unwrap();
	writer.write_payload(DATA, &[1, 0, 0, 0, 0]).unwrap();
	let (form, result) = load(writer.into_bytes());
	assert!(matches!(result, Err(LoadError::ShortPayload { .. })));
	assert_eq!(form.name(), "kept");
	assert_eq!(form.value(), 1);
}

#[test]
fn unknown_chunks_are_reported_and_skipped() {
	let mut writer = RecordWriter::new();
	writer.write_payload(Tag::new(*b"MODL"), b"mesh.nif\0").unwrap();
	writer.write_zstring(Description::TAG, "text").unwrap();
	let (form, result) = load(writer.into_bytes());
	let report = result.unwrap();
	assert_eq!(report.unrecognized.len(), 1);
	assert_eq!(report.unrecognized[0].tag, Tag::new(*b"MODL"));
	assert_eq!(form.description(), "text");
}

#[test]
fn load_form_reports_success_as_bool() {
	let mut form = MyForm::default();
	form.set_icon("x.dds");
	let good = save(&form);
	let mut target = MyForm::default();
	assert!(load_form(&mut target, &mut RecordReader::new(good.clone())));
	assert_eq!(target.icon(), "x.dds");

	let truncated = good.slice(..good.len() - 1);
	assert!(!load_form(&mut MyForm::default(), &mut RecordReader::new(truncated)));
}

fn arb_form() -> impl Strategy<Value = MyForm> {
	(
		"[A-Za-z0-9]{0,16}",
		"[ -~]{0,32}",
		"[ -~]{0,64}",
		"[a-z/._]{0,24}",
		any::<i32>(),
		-1.0e4f32..1.0e4,
		any::<u32>(),
	)
		.prop_map(|(editor_id, name, text, icon, value, weight, extra)| {
			let mut form = MyForm::default();
			form.form_mut().set_editor_id(&editor_id);
			form.set_name(name);
			form.set_description(text);
			form.set_icon(icon);
			form.set_value(value);
			form.set_weight(weight);
			form.extra_data = extra;
			form
		})
}

proptest! {
	#[test]
	fn saved_records_load_back_equal(form in arb_form()) {
		let (loaded, result) = load(save(&form));
		prop_assert!(result.unwrap().is_clean());
		prop_assert!(!loaded.compare_to(&form));
		prop_assert_eq!(loaded.form().editor_id(), form.form().editor_id());
	}
}

#[test]
fn store_round_trips_records() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut store = FormStore::new(&lifecycle, PartialRecordPolicy::Discard);
	let id = store.insert(populated(&lifecycle, code)).unwrap();
	assert_eq!(id, FormId(0x900));

	let bytes = store.save(id).unwrap();
	let loaded = store.load(code, bytes).unwrap();
	assert_eq!(loaded, FormId(0x901));
	assert!(!store.get(loaded).unwrap().compare_to(store.get(id).unwrap()));
	assert_eq!(store.get(loaded).unwrap().form().editor_id(), Some("IronSword"));
	assert_eq!(store.len(), 2);
}

#[rstest]
#[case(PartialRecordPolicy::Discard, 0)]
#[case(PartialRecordPolicy::Keep, 1)]
fn store_honors_partial_record_policy(#[case] policy: PartialRecordPolicy, #[case] kept: usize) {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut writer = RecordWriter::new();
	writer.write_zstring(FullName::TAG, "half").unwrap();
	let mut bytes = writer.into_bytes().to_vec();
	bytes.extend_from_slice(b"DESC\x20\x00short");

	let result = store_load(&lifecycle, code, policy, bytes);
	assert_eq!(result.len(), kept);
	if let Some(name) = result.first() {
		assert_eq!(name, "half");
	}
}

fn store_load(lifecycle: &Lifecycle, code: TypeCode, policy: PartialRecordPolicy, bytes: Vec<u8>) -> Vec<String> {
	let mut store = FormStore::new(lifecycle, policy);
	match store.load(code, bytes) {
		Ok(_) => {}
		Err(StoreError::Discarded { code: c, .. }) => assert_eq!(c, code),
		Err(other) => panic!("unexpected {other}"),
	}
	store.iter().map(|(_, r)| my_form(r).name().to_owned()).collect()
}

#[test]
fn duplicate_gets_new_identity() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut store = FormStore::new(&lifecycle, PartialRecordPolicy::Keep);
	let id = store.insert(populated(&lifecycle, code)).unwrap();

	let copy = store.duplicate(id).unwrap();
	assert_ne!(copy, id);
	let copied = store.get(copy).unwrap();
	assert_eq!(copied.form().editor_id(), None);
	assert!(!copied.compare_to(store.get(id).unwrap()));
}

#[test]
fn temporary_copy_applies_back_onto_source() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut store = FormStore::new(&lifecycle, PartialRecordPolicy::Keep);
	let id = store.insert(populated(&lifecycle, code)).unwrap();

	let mut temp = store.temporary_copy(id).unwrap();
	assert_eq!(temp.form().form_id, id);
	assert_eq!(store.apply(&*temp).unwrap(), false);

	my_form_mut(&mut *temp).set_value(99);
	temp.form_mut().set_editor_id("SteelSword");
	assert!(store.apply(&*temp).unwrap());

	let stored = store.get(id).unwrap();
	assert_eq!(my_form(stored).value(), 99);
	assert_eq!(stored.form().editor_id(), Some("SteelSword"));
	assert!(!stored.form().is_temporary());
}

#[test]
fn store_reports_missing_and_non_temporary_records() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut store = FormStore::new(&lifecycle, PartialRecordPolicy::Keep);
	let id = store.create(code).unwrap();

	assert!(matches!(store.save(FormId(1)), Err(StoreError::NotFound(FormId(1)))));
	let plain = lifecycle.create(code).unwrap();
	assert!(matches!(store.apply(&*plain), Err(StoreError::NotTemporary(_))));

	assert!(store.remove(id).is_some());
	assert!(store.is_empty());
	assert!(matches!(store.duplicate(id), Err(StoreError::NotFound(_))));
}

#[test]
fn store_stops_assigning_ids_after_the_last_one() {
	let (lifecycle, code) = lifecycle(HostTarget::Game);
	let mut store = FormStore::new(&lifecycle, PartialRecordPolicy::Keep);
	let mut last = lifecycle.create(code).unwrap();
	last.form_mut().form_id = FormId(u32::MAX);
	assert_eq!(store.insert(last).unwrap(), FormId(u32::MAX));

	assert!(matches!(store.create(code), Err(StoreError::IdsExhausted)));
	assert!(matches!(store.duplicate(FormId(u32::MAX)), Err(StoreError::IdsExhausted)));
	assert_eq!(store.len(), 1);

	let mut explicit = lifecycle.create(code).unwrap();
	explicit.form_mut().form_id = FormId(0x900);
	assert_eq!(store.insert(explicit).unwrap(), FormId(0x900));
	assert_eq!(store.len(), 2);
}

#[test]
fn version_and_description() {
	assert_eq!(extension::description(), "formext, v1.0 beta0");
	assert_eq!(extension::record_version(0), 0x0100_0000);
	assert_eq!(extension::record_version(0x12), 0x0100_0012);

	let handle = ExtensionHandle::new(extension::api()).unwrap();
	assert_eq!(handle.description().as_deref(), Some("formext, v1.0 beta0"));
	// SAFETY: the test command only logs its target.
	assert!(unsafe { handle.test_command(std::ptr::null_mut(), c"a", c"", c"c") });
}

#[test]
fn initialize_registers_collected_types_once() {
	let first = extension::initialize(&Config::default()).unwrap();
	assert!(first.registry().is_sealed());
	assert!(first.lookup(my_form::SHORT_NAME).is_ok());

	let again = extension::initialize(&Config::default()).unwrap();
	assert!(std::ptr::eq(first, again));
	assert!(extension::lifecycle().is_some());
}
