use std::fmt;
use std::str::FromStr;

/// A four-byte tag, stored exactly as it appears on disk.
///
/// Tags identify chunk kinds inside a record (`EDID`, `FULL`, ...) and record
/// types themselves (the registry short name). They are opaque to the codec: two
/// tags are equal when their bytes are equal, nothing more.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tag([u8; 4]);

/// Error returned when a string cannot become a [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tag {0:?} must be exactly four ASCII characters")]
pub struct TagError(pub String);

impl Tag {
	/// Creates a tag from its on-disk bytes.
	pub const fn new(bytes: [u8; 4]) -> Self {
		Self(bytes)
	}

	/// Creates a tag from a byte-string literal such as `b"EDID"`.
	pub const fn from_bytes(bytes: &[u8; 4]) -> Self {
		Self(*bytes)
	}

	/// Returns the on-disk bytes.
	pub const fn as_bytes(&self) -> &[u8; 4] {
		&self.0
	}

	/// Interprets the tag as the little-endian integer a host reads off disk.
	pub const fn to_u32_le(self) -> u32 {
		u32::from_le_bytes(self.0)
	}

	/// Inverse of [`Tag::to_u32_le`].
	pub const fn from_u32_le(value: u32) -> Self {
		Self(value.to_le_bytes())
	}

	/// Parses a tag from exactly four ASCII characters.
	pub fn parse(s: &str) -> Result<Self, TagError> {
		let bytes: [u8; 4] = s
			.as_bytes()
			.try_into()
			.map_err(|_| TagError(s.to_owned()))?;
		if !bytes.is_ascii() {
			return Err(TagError(s.to_owned()));
		}
		Ok(Self(bytes))
	}

	/// Returns true if every byte is printable ASCII.
	pub fn is_printable(&self) -> bool {
		self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
	}
}

impl FromStr for Tag {
	type Err = TagError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_printable() {
			for b in self.0 {
				write!(f, "{}", b as char)?;
			}
			Ok(())
		} else {
			write!(f, "{{{:08X}}}", self.to_u32_le())
		}
	}
}

impl fmt::Debug for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Tag({self})")
	}
}

impl From<[u8; 4]> for Tag {
	fn from(bytes: [u8; 4]) -> Self {
		Self(bytes)
	}
}
