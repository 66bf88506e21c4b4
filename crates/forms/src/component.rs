//! Embedded property groups ("base form components").
//!
//! Each component is a host sub-object with its own dispatch-table pointer at
//! its head. Text components persist in a chunk of their own; fixed-size ones
//! share the record's `DATA` chunk in declaration order. Members mirror the
//! host's component layouts of the game build.

use formext_abi::{HostString, VPtr};
use formext_codec::{ChunkWrite, CodecError, MalformedStream, Payload, Tag};

macro_rules! text_component {
	($(#[$meta:meta])* $name:ident { $field:ident: $ty:ty } => $tag:literal) => {
		$(#[$meta])*
		#[repr(C)]
		#[derive(Debug, Default)]
		pub struct $name {
			vtbl: VPtr,
			pub $field: $ty,
		}

		impl $name {
			pub const TAG: Tag = Tag::new(*$tag);

			pub fn new(value: &str) -> Self {
				Self {
					vtbl: VPtr::NULL,
					$field: <$ty>::new(value),
				}
			}

			pub fn vptr(&self) -> VPtr {
				self.vtbl
			}

			fn copy_from(&mut self, other: &Self) {
				self.$field.clone_from(&other.$field);
			}

			fn differs(&self, other: &Self) -> bool {
				self.$field != other.$field
			}

			fn save(&self, out: &mut dyn ChunkWrite) -> Result<(), CodecError> {
				if self.$field.is_empty() {
					return Ok(());
				}
				out.write_zstring(Self::TAG, self.$field.as_str())
			}

			fn load(&mut self, payload: &mut Payload<'_>) {
				self.$field = <$ty>::new(&payload.read_zstring());
			}
		}
	};
}

macro_rules! fixed_component {
	($(#[$meta:meta])* $name:ident { $field:ident: $ty:ty }) => {
		$(#[$meta])*
		#[repr(C)]
		#[derive(Debug, Default)]
		pub struct $name {
			vtbl: VPtr,
			pub $field: $ty,
		}

		impl $name {
			pub fn new($field: $ty) -> Self {
				Self {
					vtbl: VPtr::NULL,
					$field,
				}
			}

			pub fn vptr(&self) -> VPtr {
				self.vtbl
			}

			fn copy_from(&mut self, other: &Self) {
				self.$field = other.$field;
			}

			fn differs(&self, other: &Self) -> bool {
				self.$field != other.$field
			}

			fn write(&self, out: &mut Vec<u8>) {
				out.extend_from_slice(&self.$field.to_le_bytes());
			}
		}
	};
}

/// Text behind a single pointer, as the game build keeps descriptions.
#[repr(transparent)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxedText(Option<Box<HostString>>);

impl BoxedText {
	pub fn new(text: &str) -> Self {
		Self((!text.is_empty()).then(|| Box::new(HostString::new(text))))
	}

	pub fn as_str(&self) -> &str {
		self.0.as_deref().map_or("", HostString::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.as_str().is_empty()
	}
}

text_component!(
	/// Display name (`FULL`).
	FullName { name: HostString } => b"FULL"
);
text_component!(
	/// Long description text (`DESC`).
	Description { text: BoxedText } => b"DESC"
);
text_component!(
	/// Texture path of the inventory icon (`ICON`).
	Icon { texture_path: HostString } => b"ICON"
);
fixed_component!(
	/// Gold value.
	Value { value: i32 }
);
fixed_component!(Weight { weight: f32 });

/// Borrowed view of the components a record embeds.
///
/// Generic copy and compare run over this view once the concrete types are
/// known to match, so the code is shared by every record type.
#[derive(Debug, Default, Clone, Copy)]
pub struct Components<'a> {
	pub full_name: Option<&'a FullName>,
	pub description: Option<&'a Description>,
	pub icon: Option<&'a Icon>,
	pub value: Option<&'a Value>,
	pub weight: Option<&'a Weight>,
}

#[derive(Debug, Default)]
pub struct ComponentsMut<'a> {
	pub full_name: Option<&'a mut FullName>,
	pub description: Option<&'a mut Description>,
	pub icon: Option<&'a mut Icon>,
	pub value: Option<&'a mut Value>,
	pub weight: Option<&'a mut Weight>,
}

fn pair_differs<T>(a: Option<&T>, b: Option<&T>, differs: fn(&T, &T) -> bool) -> bool {
	match (a, b) {
		(Some(a), Some(b)) => differs(a, b),
		(None, None) => false,
		_ => true,
	}
}

impl Components<'_> {
	/// True if any component is missing on one side or holds a different value.
	pub fn differ(&self, other: &Components<'_>) -> bool {
		pair_differs(self.full_name, other.full_name, FullName::differs)
			|| pair_differs(self.description, other.description, Description::differs)
			|| pair_differs(self.icon, other.icon, Icon::differs)
			|| pair_differs(self.value, other.value, Value::differs)
			|| pair_differs(self.weight, other.weight, Weight::differs)
	}

	/// True if the record stores anything in the generic part of `DATA`.
	pub fn has_generic(&self) -> bool {
		self.value.is_some() || self.weight.is_some()
	}

	/// Writes one chunk per non-empty text component.
	pub fn save_text(&self, out: &mut dyn ChunkWrite) -> Result<(), CodecError> {
		if let Some(c) = self.full_name {
			c.save(out)?;
		}
		if let Some(c) = self.description {
			c.save(out)?;
		}
		if let Some(c) = self.icon {
			c.save(out)?;
		}
		Ok(())
	}

	/// Appends the fixed-size components in declaration order.
	pub fn write_generic(&self, out: &mut Vec<u8>) {
		if let Some(c) = self.value {
			c.write(out);
		}
		if let Some(c) = self.weight {
			c.write(out);
		}
	}
}

impl ComponentsMut<'_> {
	pub fn copy_from(&mut self, src: &Components<'_>) {
		if let (Some(dst), Some(src)) = (self.full_name.as_deref_mut(), src.full_name) {
			dst.copy_from(src);
		}
		if let (Some(dst), Some(src)) = (self.description.as_deref_mut(), src.description) {
			dst.copy_from(src);
		}
		if let (Some(dst), Some(src)) = (self.icon.as_deref_mut(), src.icon) {
			dst.copy_from(src);
		}
		if let (Some(dst), Some(src)) = (self.value.as_deref_mut(), src.value) {
			dst.copy_from(src);
		}
		if let (Some(dst), Some(src)) = (self.weight.as_deref_mut(), src.weight) {
			dst.copy_from(src);
		}
	}

	/// Applies a text chunk. Returns false if no embedded component owns `tag`.
	pub fn load_text(&mut self, payload: &mut Payload<'_>) -> bool {
		let tag = payload.tag();
		if tag == FullName::TAG
			&& let Some(c) = self.full_name.as_deref_mut()
		{
			c.load(payload);
		} else if tag == Description::TAG
			&& let Some(c) = self.description.as_deref_mut()
		{
			c.load(payload);
		} else if tag == Icon::TAG
			&& let Some(c) = self.icon.as_deref_mut()
		{
			c.load(payload);
		} else {
			return false;
		}
		true
	}

	/// Reads the fixed-size components from the head of a `DATA` payload.
	pub fn read_generic(&mut self, payload: &mut Payload<'_>) -> Result<(), MalformedStream> {
		if let Some(c) = self.value.as_deref_mut() {
			c.value = payload.read_i32()?;
		}
		if let Some(c) = self.weight.as_deref_mut() {
			c.weight = payload.read_f32()?;
		}
		Ok(())
	}
}
