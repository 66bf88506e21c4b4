use formext_abi::{HostString, VPtr};
use formext_primitives::{FormFlags, FormId, TypeCode};

/// Longest editor id the host accepts, in bytes.
pub const EDITOR_ID_MAX: usize = 0x1FF;

/// The form root sub-object every extended record starts with.
///
/// Its dispatch-table pointer is the instance's primary table. The fields
/// follow the host's form root member for member.
#[repr(C)]
#[derive(Debug, Default)]
pub struct FormHeader {
	vtbl: VPtr,
	type_code: TypeCode,
	pub flags: FormFlags,
	pub form_id: FormId,
	editor_id: HostString,
}

impl FormHeader {
	pub fn type_code(&self) -> TypeCode {
		self.type_code
	}

	pub(crate) fn set_type_code(&mut self, code: TypeCode) {
		self.type_code = code;
	}

	pub fn vptr(&self) -> VPtr {
		self.vtbl
	}

	pub fn editor_id(&self) -> Option<&str> {
		(!self.editor_id.is_empty()).then(|| self.editor_id.as_str())
	}

	/// Sets the editor id, truncating to [`EDITOR_ID_MAX`] bytes. Empty clears it.
	pub fn set_editor_id(&mut self, id: &str) {
		let mut end = id.len().min(EDITOR_ID_MAX);
		while !id.is_char_boundary(end) {
			end -= 1;
		}
		if end < id.len() {
			tracing::warn!(len = id.len(), max = EDITOR_ID_MAX, "editor id truncated");
		}
		self.editor_id = HostString::new(&id[..end]);
	}

	pub fn is_temporary(&self) -> bool {
		self.flags.is_temporary()
	}

	/// Copies form id and editor id from `other`.
	pub fn copy_identity(&mut self, other: &FormHeader) {
		self.form_id = other.form_id;
		self.editor_id.clone_from(&other.editor_id);
	}
}
