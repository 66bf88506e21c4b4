//! Extension code reachable through the generated dispatch tables.
//!
//! The host calls these through the primary table of an extended instance.
//! Host methods use the `thiscall` convention on 32-bit builds; the thunks take
//! the object pointer as their first argument. Load and save receive the
//! record stream as a [`ReadStream`] or [`WriteStream`] in place of the host's
//! file object. Every other known slot keeps the host's own implementation.

use std::ffi::c_void;

use formext_abi::{HostTarget, PerHost, Slot, base};
use formext_codec::{ChunkRead, ChunkWrite};

use crate::form::FormHeader;
use crate::record::ExtendedRecord;

/// Slot indices of the form base methods the extension implements.
pub mod slots {
	use formext_abi::PerHost;

	pub const DESTRUCTOR: PerHost<usize> = PerHost::new(0x10 / 4, 0x34 / 4);
	pub const LOAD_FORM: PerHost<usize> = PerHost::new(0x1C / 4, 0x40 / 4);
	pub const SAVE_FORM: PerHost<usize> = PerHost::new(0x24 / 4, 0x48 / 4);
	pub const GET_FORM_TYPE: PerHost<usize> = PerHost::new(0x70 / 4, 0x74 / 4);
	pub const COPY_FROM: PerHost<usize> = PerHost::new(0xB4 / 4, 0xB8 / 4);
	pub const COMPARE_TO: PerHost<usize> = PerHost::new(0xB8 / 4, 0xBC / 4);
}

/// One generated-table slot pointing at extension code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOverride {
	pub base: &'static str,
	pub index: usize,
	pub slot: Slot,
}

impl SlotOverride {
	fn form(index: PerHost<usize>, host: HostTarget, f: *const c_void) -> Self {
		Self {
			base: base::FORM,
			index: index.get(host),
			slot: Slot::from_ptr(f),
		}
	}
}

/// What the stream argument of the load thunk points at.
pub struct ReadStream<'a>(pub &'a mut dyn ChunkRead);

/// What the stream argument of the save thunk points at.
pub struct WriteStream<'a>(pub &'a mut dyn ChunkWrite);

/// Scalar deleting destructor: bit 0 of `flags` also frees the instance.
pub type DestructorFn = unsafe extern "C" fn(this: *mut c_void, flags: u32) -> *mut c_void;
pub type LoadFormFn = unsafe extern "C" fn(this: *mut c_void, stream: *mut c_void) -> bool;
pub type SaveFormFn = unsafe extern "C" fn(this: *const c_void, stream: *mut c_void) -> bool;
pub type FormTypeFn = unsafe extern "C" fn(this: *const FormHeader) -> u8;
pub type CopyFromFn = unsafe extern "C" fn(this: *mut c_void, source: *const FormHeader);
pub type CompareToFn = unsafe extern "C" fn(this: *const c_void, other: *const FormHeader) -> bool;

/// Form base overrides shared by every record type `R`.
pub fn form_overrides<R: ExtendedRecord>(host: HostTarget) -> Vec<SlotOverride> {
	let destroy: DestructorFn = destroy::<R>;
	let load: LoadFormFn = load::<R>;
	let save: SaveFormFn = save::<R>;
	let form_type: FormTypeFn = form_type;
	let copy: CopyFromFn = copy_from::<R>;
	let compare: CompareToFn = compare_to::<R>;
	vec![
		SlotOverride::form(slots::DESTRUCTOR, host, destroy as *const c_void),
		SlotOverride::form(slots::LOAD_FORM, host, load as *const c_void),
		SlotOverride::form(slots::SAVE_FORM, host, save as *const c_void),
		SlotOverride::form(slots::GET_FORM_TYPE, host, form_type as *const c_void),
		SlotOverride::form(slots::COPY_FROM, host, copy as *const c_void),
		SlotOverride::form(slots::COMPARE_TO, host, compare as *const c_void),
	]
}

/// # Safety
///
/// `this` must point to a live `R`. With bit 0 of `flags` set it must also be
/// the allocation of a `Box<R>`, which is freed; the instance is dropped in
/// place otherwise.
unsafe extern "C" fn destroy<R: ExtendedRecord>(this: *mut c_void, flags: u32) -> *mut c_void {
	tracing::debug!(object = ?this, flags, "destroying record");
	let record = this.cast::<R>();
	// SAFETY: see above.
	unsafe {
		if flags & 1 != 0 {
			drop(Box::from_raw(record));
		} else {
			std::ptr::drop_in_place(record);
		}
	}
	this
}

/// # Safety
///
/// `this` must point to a live `R` and `stream` to a live [`ReadStream`].
unsafe extern "C" fn load<R: ExtendedRecord>(this: *mut c_void, stream: *mut c_void) -> bool {
	// SAFETY: see above.
	let (record, stream) = unsafe { (&mut *this.cast::<R>(), &mut *stream.cast::<ReadStream<'_>>()) };
	crate::lifecycle::load_form(record, &mut *stream.0)
}

/// # Safety
///
/// `this` must point to a live `R` and `stream` to a live [`WriteStream`].
unsafe extern "C" fn save<R: ExtendedRecord>(this: *const c_void, stream: *mut c_void) -> bool {
	// SAFETY: see above.
	let (record, stream) = unsafe { (&*this.cast::<R>(), &mut *stream.cast::<WriteStream<'_>>()) };
	match record.save(&mut *stream.0) {
		Ok(()) => true,
		Err(error) => {
			tracing::error!(code = %record.type_code(), %error, "record save failed");
			false
		}
	}
}

/// Reports the type code stored in the form header.
///
/// # Safety
///
/// `this` must point to a live form header.
pub unsafe extern "C" fn form_type(this: *const FormHeader) -> u8 {
	// SAFETY: upheld by the caller.
	unsafe { (*this).type_code().get() }
}

/// # Safety
///
/// `this` must point to a live `R`; `source` to a live form whose header sits
/// at its start. A source with the same type code is an `R` because every
/// instance of a code comes from the same factory.
unsafe extern "C" fn copy_from<R: ExtendedRecord>(this: *mut c_void, source: *const FormHeader) {
	if this.cast_const() == source.cast::<c_void>() {
		return;
	}
	// SAFETY: see above.
	unsafe {
		let this = &mut *this.cast::<R>();
		if (*source).type_code() != this.type_code() {
			return;
		}
		let source = &*source.cast::<R>();
		this.copy_from(source);
	}
}

/// # Safety
///
/// As for [`copy_from`].
unsafe extern "C" fn compare_to<R: ExtendedRecord>(this: *const c_void, other: *const FormHeader) -> bool {
	// SAFETY: see `copy_from`.
	unsafe {
		let this = &*this.cast::<R>();
		if (*other).type_code() != this.type_code() {
			return true;
		}
		this.compare_to(&*other.cast::<R>())
	}
}
