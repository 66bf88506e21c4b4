//! The contract every extended record type implements, plus the shared
//! load/save/copy/compare plumbing built on it.

use std::any::Any;
use std::ptr::NonNull;

use formext_abi::HostTarget;
use formext_codec::{
	ChunkHandlers, ChunkRead, ChunkWrite, CodecError, DecodeReport, MalformedStream, Payload, Tag,
	decode,
};
use formext_primitives::TypeCode;

use crate::component::{Components, ComponentsMut};
use crate::dispatch::SlotOverride;
use crate::error::LoadError;
use crate::form::FormHeader;

/// Editor id chunk.
pub const EDID: Tag = Tag::new(*b"EDID");
/// Fixed-size components followed by the type's private bytes.
pub const DATA: Tag = Tag::new(*b"DATA");

/// One host sub-object of a record: the base it mirrors and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubObject {
	/// Compatibility-table key of the base.
	pub base: &'static str,
	/// Byte offset from the start of the instance.
	pub offset: usize,
}

/// An instance of an extended record type, as the form store sees it.
///
/// # Safety
///
/// Every [`SubObject`] returned by [`ExtendedRecord::layout`] must name the
/// offset of a [`formext_abi::VPtr`] inside `Self`, and the first entry must be
/// the [`FormHeader`] at offset 0. The lifecycle writes table pointers and the
/// patcher reads them through these offsets.
pub unsafe trait ExtendedRecord: Any + 'static {
	fn form(&self) -> &FormHeader;
	fn form_mut(&mut self) -> &mut FormHeader;

	fn type_code(&self) -> TypeCode {
		self.form().type_code()
	}

	/// Sub-objects whose dispatch tables the lifecycle installs and patches.
	fn layout(&self) -> &'static [SubObject];

	/// Slots of the generated tables that point at extension code.
	fn slot_overrides(&self, host: HostTarget) -> Vec<SlotOverride>;

	fn components(&self) -> Components<'_>;
	fn components_mut(&mut self) -> ComponentsMut<'_>;

	/// Appends the type's private bytes to the `DATA` payload.
	fn save_private(&self, out: &mut Vec<u8>) {
		let _ = out;
	}

	/// Reads the type's private bytes from the tail of `DATA`.
	fn load_private(&mut self, payload: &mut Payload<'_>) -> Result<(), MalformedStream> {
		let _ = payload;
		Ok(())
	}

	/// Decodes one record stream into `self`.
	fn load(&mut self, stream: &mut dyn ChunkRead) -> Result<DecodeReport, LoadError>;

	/// Writes `self` as one record stream.
	fn save(&self, stream: &mut dyn ChunkWrite) -> Result<(), CodecError> {
		save_record(self, stream)
	}

	/// Copies component values and private fields from `other`.
	///
	/// Identity (form id, editor id) is copied only into a temporary record.
	/// A source of another type leaves `self` unchanged.
	fn copy_from(&mut self, other: &dyn ExtendedRecord);

	/// Returns true if `other` differs from `self`. Records of different types
	/// always differ. Identity fields are not compared.
	fn compare_to(&self, other: &dyn ExtendedRecord) -> bool;

	fn as_any(&self) -> &dyn Any;
}

impl dyn ExtendedRecord {
	/// Address of the instance, i.e. of its primary sub-object.
	pub fn object_ptr(&mut self) -> NonNull<u8> {
		NonNull::from(self).cast::<u8>()
	}

	pub fn downcast_ref<R: ExtendedRecord>(&self) -> Option<&R> {
		self.as_any().downcast_ref::<R>()
	}
}

/// Standard handlers: editor id, the text components, and `DATA`.
pub fn standard_handlers<R: ExtendedRecord>() -> ChunkHandlers<R> {
	let mut handlers = ChunkHandlers::new().with(EDID, load_edid::<R>).with(DATA, load_data::<R>);
	for tag in [
		crate::component::FullName::TAG,
		crate::component::Description::TAG,
		crate::component::Icon::TAG,
	] {
		handlers.insert(tag, load_text::<R>);
	}
	handlers
}

fn load_edid<R: ExtendedRecord>(record: &mut R, payload: &mut Payload<'_>) -> Result<(), MalformedStream> {
	let id = payload.read_zstring();
	tracing::trace!(editor_id = %id, "EDID chunk");
	record.form_mut().set_editor_id(&id);
	Ok(())
}

fn load_text<R: ExtendedRecord>(record: &mut R, payload: &mut Payload<'_>) -> Result<(), MalformedStream> {
	let tag = payload.tag();
	if !record.components_mut().load_text(payload) {
		tracing::warn!(%tag, code = %record.type_code(), "record type has no component for chunk");
	}
	Ok(())
}

fn load_data<R: ExtendedRecord>(record: &mut R, payload: &mut Payload<'_>) -> Result<(), MalformedStream> {
	record.components_mut().read_generic(payload)?;
	record.load_private(payload)
}

/// Decodes `stream` into `record` with `handlers`.
pub fn load_record<R: ExtendedRecord>(
	record: &mut R,
	stream: &mut dyn ChunkRead,
	handlers: &ChunkHandlers<R>,
) -> Result<DecodeReport, LoadError> {
	tracing::debug!(
		code = %record.type_code(),
		form_id = %record.form().form_id,
		"loading record"
	);
	decode(record, stream, handlers)
}

/// Writes the editor id, one chunk per non-empty text component, then `DATA`.
pub fn save_record<R: ExtendedRecord + ?Sized>(
	record: &R,
	stream: &mut dyn ChunkWrite,
) -> Result<(), CodecError> {
	let form = record.form();
	tracing::debug!(
		code = %form.type_code(),
		form_id = %form.form_id,
		editor_id = form.editor_id().unwrap_or_default(),
		"saving record"
	);
	if let Some(id) = form.editor_id() {
		stream.write_zstring(EDID, id)?;
	}
	let components = record.components();
	components.save_text(stream)?;

	let mut data = Vec::new();
	components.write_generic(&mut data);
	record.save_private(&mut data);
	if components.has_generic() || !data.is_empty() {
		stream.write_payload(DATA, &data)?;
	}
	Ok(())
}

/// Returns `other` as an `R` if it carries the same type code as `this`.
pub fn same_type<'a, R: ExtendedRecord>(this: &R, other: &'a dyn ExtendedRecord) -> Option<&'a R> {
	if this.type_code() != other.type_code() {
		return None;
	}
	other.downcast_ref::<R>()
}

/// Shared part of [`ExtendedRecord::copy_from`].
///
/// Returns the typed source so the caller can copy its private fields, or
/// `None` if the types differ and nothing was copied.
pub fn copy_common<'a, R: ExtendedRecord>(this: &mut R, other: &'a dyn ExtendedRecord) -> Option<&'a R> {
	let Some(src) = same_type(this, other) else {
		tracing::debug!(
			dst = %this.type_code(),
			src = %other.type_code(),
			"copy between record types ignored"
		);
		return None;
	};
	if this.form().is_temporary() {
		this.form_mut().copy_identity(src.form());
	}
	this.components_mut().copy_from(&src.components());
	Some(src)
}

/// Shared part of [`ExtendedRecord::compare_to`].
///
/// `None` means the records already differ; otherwise the typed other side is
/// returned for comparing private fields.
pub fn compare_common<'a, R: ExtendedRecord>(this: &R, other: &'a dyn ExtendedRecord) -> Option<&'a R> {
	let other = same_type(this, other)?;
	(!this.components().differ(&other.components())).then_some(other)
}
