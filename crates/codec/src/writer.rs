use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use formext_primitives::Tag;

use crate::chunk::{HEADER_LEN, MAX_INLINE_LEN, SIZE_OVERRIDE};
use crate::error::CodecError;

/// Sink for one record's chunks.
pub trait ChunkWrite {
	fn write_payload(&mut self, tag: Tag, payload: &[u8]) -> Result<(), CodecError>;

	/// Writes `value` followed by a NUL terminator.
	fn write_zstring(&mut self, tag: Tag, value: &str) -> Result<(), CodecError> {
		let mut payload = Vec::with_capacity(value.len() + 1);
		payload.extend_from_slice(value.as_bytes());
		payload.push(0);
		self.write_payload(tag, &payload)
	}
}

/// [`ChunkWrite`] into an in-memory buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordWriter {
	buf: BytesMut,
	chunks: usize,
}

impl RecordWriter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			buf: BytesMut::with_capacity(capacity),
			chunks: 0,
		}
	}

	/// Chunks written so far, not counting size overrides.
	pub fn chunks(&self) -> usize {
		self.chunks
	}

	pub fn len(&self) -> usize {
		self.buf.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	pub fn into_bytes(self) -> Bytes {
		self.buf.freeze()
	}

	/// Closes the record into `out`, returning the bytes written.
	pub fn flush_to<W: io::Write + ?Sized>(self, out: &mut W) -> Result<usize, CodecError> {
		out.write_all(&self.buf)?;
		out.flush()?;
		tracing::trace!(chunks = self.chunks, bytes = self.buf.len(), "flushed record");
		Ok(self.buf.len())
	}
}

impl ChunkWrite for RecordWriter {
	fn write_payload(&mut self, tag: Tag, payload: &[u8]) -> Result<(), CodecError> {
		if tag == SIZE_OVERRIDE {
			return Err(CodecError::ReservedTag(tag));
		}
		let len = payload.len();
		if len > MAX_INLINE_LEN {
			let real = u32::try_from(len).map_err(|_| CodecError::PayloadTooLarge { tag, len })?;
			self.buf.reserve(2 * HEADER_LEN + 4 + len);
			self.buf.put_slice(SIZE_OVERRIDE.as_bytes());
			self.buf.put_u16_le(4);
			self.buf.put_u32_le(real);
			self.buf.put_slice(tag.as_bytes());
			self.buf.put_u16_le(0);
		} else {
			self.buf.reserve(HEADER_LEN + len);
			self.buf.put_slice(tag.as_bytes());
			self.buf.put_u16_le(len as u16);
		}
		self.buf.put_slice(payload);
		self.chunks += 1;
		tracing::trace!(%tag, len, "wrote chunk");
		Ok(())
	}
}
