//! ABI-stable surface between a loader and the extension.
//!
//! The loader is compiled without knowledge of the extension's record types; it
//! only sees [`ExtensionApiV1`]. Slots are append-only: existing fields never
//! move, new function slots go at the end, and `size` tells a loader built
//! against an older header which slots the running extension actually has.

use std::ffi::{CStr, c_char, c_void};
use std::marker::PhantomData;
use std::mem::offset_of;
use std::ptr::NonNull;

/// Version of the table layout. Bumped only for incompatible changes.
pub const EXTENSION_ABI_VERSION: u32 = 1;

/// Runs the extension's test command against a host object.
pub type TestCommandFn =
	unsafe extern "C" fn(target: *mut c_void, a: *const c_char, b: *const c_char, c: *const c_char);

/// Returns a NUL-terminated description owned by the extension.
pub type DescriptionFn = unsafe extern "C" fn() -> *const c_char;

/// Function table exported by the extension's entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExtensionApiV1 {
	pub abi_version: u32,
	/// Size in bytes of the table as the extension was built.
	pub size: u32,
	pub test_command: Option<TestCommandFn>,
	pub description: Option<DescriptionFn>,
}

const HEADER_LEN: usize = offset_of!(ExtensionApiV1, test_command);

impl ExtensionApiV1 {
	pub const fn new(test_command: TestCommandFn, description: DescriptionFn) -> Self {
		Self {
			abi_version: EXTENSION_ABI_VERSION,
			size: size_of::<Self>() as u32,
			test_command: Some(test_command),
			description: Some(description),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterfaceError {
	#[error("extension returned a null interface table")]
	Null,

	#[error("extension ABI version {found} does not match loader version {expected}")]
	AbiMismatch { found: u32, expected: u32 },

	#[error("interface table of {size} bytes is smaller than its header")]
	Truncated { size: u32 },
}

/// Loader-side view of an extension table.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionHandle<'a> {
	api: NonNull<ExtensionApiV1>,
	size: u32,
	_marker: PhantomData<&'a ExtensionApiV1>,
}

impl<'a> ExtensionHandle<'a> {
	/// Validates a table returned by an extension entry point.
	///
	/// # Safety
	///
	/// `api` must be null or point to at least `size` readable bytes laid out as
	/// [`ExtensionApiV1`], valid for `'a`.
	pub unsafe fn from_raw(api: *const ExtensionApiV1) -> Result<Self, InterfaceError> {
		let api = NonNull::new(api.cast_mut()).ok_or(InterfaceError::Null)?;
		// SAFETY: the header fields exist in every table version.
		let (abi_version, size) = unsafe {
			let raw = api.as_ptr();
			((*raw).abi_version, (*raw).size)
		};
		if abi_version != EXTENSION_ABI_VERSION {
			return Err(InterfaceError::AbiMismatch {
				found: abi_version,
				expected: EXTENSION_ABI_VERSION,
			});
		}
		if (size as usize) < HEADER_LEN {
			return Err(InterfaceError::Truncated { size });
		}
		Ok(Self {
			api,
			size,
			_marker: PhantomData,
		})
	}

	/// Wraps a table the caller already holds a reference to.
	pub fn new(api: &'a ExtensionApiV1) -> Result<Self, InterfaceError> {
		// SAFETY: a reference is valid for reads of the whole struct.
		unsafe { Self::from_raw(api) }
	}

	/// True if the extension's table extends past `field_end`.
	fn has(&self, field_end: usize) -> bool {
		self.size as usize >= field_end
	}

	fn test_command_fn(&self) -> Option<TestCommandFn> {
		let end = offset_of!(ExtensionApiV1, test_command) + size_of::<Option<TestCommandFn>>();
		// SAFETY: `size` covers the field.
		self.has(end)
			.then(|| unsafe { (*self.api.as_ptr()).test_command })
			.flatten()
	}

	fn description_fn(&self) -> Option<DescriptionFn> {
		let end = offset_of!(ExtensionApiV1, description) + size_of::<Option<DescriptionFn>>();
		// SAFETY: `size` covers the field.
		self.has(end)
			.then(|| unsafe { (*self.api.as_ptr()).description })
			.flatten()
	}

	/// Queries the extension's description. `None` if the slot is absent.
	pub fn description(&self) -> Option<String> {
		let f = self.description_fn()?;
		// SAFETY: the extension contract returns null or a NUL-terminated string.
		let raw = unsafe { f() };
		if raw.is_null() {
			return None;
		}
		// SAFETY: checked non-null above.
		Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
	}

	/// Invokes the test command. Returns false if the slot is absent.
	///
	/// # Safety
	///
	/// `target` must be null or a live host object.
	pub unsafe fn test_command(&self, target: *mut c_void, a: &CStr, b: &CStr, c: &CStr) -> bool {
		let Some(f) = self.test_command_fn() else {
			return false;
		};
		// SAFETY: arguments are valid C strings; `target` per the caller.
		unsafe { f(target, a.as_ptr(), b.as_ptr(), c.as_ptr()) };
		true
	}
}
