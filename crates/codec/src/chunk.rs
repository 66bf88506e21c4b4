use formext_primitives::Tag;

/// Tag of the chunk announcing the real size of the next one.
pub const SIZE_OVERRIDE: Tag = Tag::new(*b"XXXX");

/// Tag plus `u16` length.
pub const HEADER_LEN: usize = 6;

/// Largest payload whose length fits the header itself.
pub const MAX_INLINE_LEN: usize = u16::MAX as usize;

/// A decoded chunk header with the effective payload length.
///
/// Size-override chunks never surface as headers; their value is folded into
/// `len` of the chunk they precede.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
	pub tag: Tag,
	pub len: usize,
}

impl ChunkHeader {
	pub const fn new(tag: Tag, len: usize) -> Self {
		Self { tag, len }
	}

	/// True if writing this chunk needs a preceding size override.
	pub const fn is_oversized(&self) -> bool {
		self.len > MAX_INLINE_LEN
	}
}
