//! Example record type.
//!
//! A form with the standard name, description, icon, gold value and weight
//! components, plus one private field stored at the end of `DATA`.

use std::any::Any;
use std::mem::offset_of;
use std::sync::LazyLock;

use formext_abi::{HostString, HostTarget, base};
use formext_codec::{ChunkHandlers, ChunkRead, DecodeReport, MalformedStream, Payload};

use crate::component::{BoxedText, Components, ComponentsMut, Description, FullName, Icon, Value, Weight};
use crate::dispatch::{SlotOverride, form_overrides};
use crate::error::LoadError;
use crate::extension::SOLUTION_NAME;
use crate::form::FormHeader;
use crate::lifecycle::{RecordTypeDef, RecordTypeReg};
use crate::record::{self, ExtendedRecord, SubObject};

pub const SHORT_NAME: &str = "MYFM";
pub const CLASS_NAME: &str = "MyForm";

#[repr(C)]
#[derive(Debug, Default)]
pub struct MyForm {
	form: FormHeader,
	full_name: FullName,
	description: Description,
	icon: Icon,
	value: Value,
	weight: Weight,
	pub extra_data: u32,
}

const LAYOUT: [SubObject; 6] = [
	SubObject {
		base: base::FORM,
		offset: offset_of!(MyForm, form),
	},
	SubObject {
		base: base::FULL_NAME,
		offset: offset_of!(MyForm, full_name),
	},
	SubObject {
		base: base::DESCRIPTION,
		offset: offset_of!(MyForm, description),
	},
	SubObject {
		base: base::ICON,
		offset: offset_of!(MyForm, icon),
	},
	SubObject {
		base: base::VALUE,
		offset: offset_of!(MyForm, value),
	},
	SubObject {
		base: base::WEIGHT,
		offset: offset_of!(MyForm, weight),
	},
];

static HANDLERS: LazyLock<ChunkHandlers<MyForm>> = LazyLock::new(record::standard_handlers::<MyForm>);

pub static DEF: RecordTypeDef = RecordTypeDef {
	module: SOLUTION_NAME,
	short_name: SHORT_NAME,
	display_name: CLASS_NAME,
	factory: MyForm::create,
};

inventory::submit!(RecordTypeReg(&DEF));

impl MyForm {
	pub fn create() -> Box<dyn ExtendedRecord> {
		Box::new(Self::default())
	}

	pub fn name(&self) -> &str {
		self.full_name.name.as_str()
	}

	pub fn set_name(&mut self, name: impl AsRef<str>) {
		self.full_name.name = HostString::new(name.as_ref());
	}

	pub fn description(&self) -> &str {
		self.description.text.as_str()
	}

	pub fn set_description(&mut self, text: impl AsRef<str>) {
		self.description.text = BoxedText::new(text.as_ref());
	}

	pub fn icon(&self) -> &str {
		self.icon.texture_path.as_str()
	}

	pub fn set_icon(&mut self, path: impl AsRef<str>) {
		self.icon.texture_path = HostString::new(path.as_ref());
	}

	pub fn value(&self) -> i32 {
		self.value.value
	}

	pub fn set_value(&mut self, value: i32) {
		self.value.value = value;
	}

	pub fn weight(&self) -> f32 {
		self.weight.weight
	}

	pub fn set_weight(&mut self, weight: f32) {
		self.weight.weight = weight;
	}
}

// SAFETY: `LAYOUT` names the `VPtr` heads of the header and each component,
// with the header first at offset 0 of this `repr(C)` struct.
unsafe impl ExtendedRecord for MyForm {
	fn form(&self) -> &FormHeader {
		&self.form
	}

	fn form_mut(&mut self) -> &mut FormHeader {
		&mut self.form
	}

	fn layout(&self) -> &'static [SubObject] {
		&LAYOUT
	}

	fn slot_overrides(&self, host: HostTarget) -> Vec<SlotOverride> {
		form_overrides::<Self>(host)
	}

	fn components(&self) -> Components<'_> {
		Components {
			full_name: Some(&self.full_name),
			description: Some(&self.description),
			icon: Some(&self.icon),
			value: Some(&self.value),
			weight: Some(&self.weight),
		}
	}

	fn components_mut(&mut self) -> ComponentsMut<'_> {
		ComponentsMut {
			full_name: Some(&mut self.full_name),
			description: Some(&mut self.description),
			icon: Some(&mut self.icon),
			value: Some(&mut self.value),
			weight: Some(&mut self.weight),
		}
	}

	fn save_private(&self, out: &mut Vec<u8>) {
		out.extend_from_slice(&self.extra_data.to_le_bytes());
	}

	/// Older records may stop short of `extra_data`; missing bytes keep their value.
	fn load_private(&mut self, payload: &mut Payload<'_>) -> Result<(), MalformedStream> {
		let mut raw = self.extra_data.to_le_bytes();
		let n = payload.remaining().min(raw.len());
		payload.read_exact(&mut raw[..n])?;
		self.extra_data = u32::from_le_bytes(raw);
		Ok(())
	}

	fn load(&mut self, stream: &mut dyn ChunkRead) -> Result<DecodeReport, LoadError> {
		record::load_record(self, stream, &HANDLERS)
	}

	fn copy_from(&mut self, other: &dyn ExtendedRecord) {
		if let Some(src) = record::copy_common(self, other) {
			self.extra_data = src.extra_data;
		}
	}

	fn compare_to(&self, other: &dyn ExtendedRecord) -> bool {
		match record::compare_common(self, other) {
			Some(other) => self.extra_data != other.extra_data,
			None => true,
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
