use bytes::{Buf, Bytes};
use formext_primitives::Tag;

use crate::chunk::{ChunkHeader, HEADER_LEN, SIZE_OVERRIDE};
use crate::error::MalformedStream;

/// Source of one record's chunks.
///
/// Reading a tag discards whatever the previous chunk left unread, so handlers
/// may consume as much or as little of a payload as they understand.
pub trait ChunkRead {
	/// Advances to the next chunk. `Ok(None)` marks the end of the record.
	fn read_tag(&mut self) -> Result<Option<ChunkHeader>, MalformedStream>;

	/// Copies up to `buf.len()` bytes of the current payload, returning the count.
	fn read_payload(&mut self, buf: &mut [u8]) -> usize;

	/// Unread bytes of the current payload.
	fn remaining_payload(&self) -> usize;

	/// True once the last chunk has been fully consumed.
	fn at_end(&self) -> bool;

	fn skip_payload(&mut self) {
		let mut scratch = [0u8; 256];
		while self.read_payload(&mut scratch) > 0 {}
	}

	/// Returns the rest of the current payload.
	fn take_payload(&mut self) -> Bytes {
		let mut out = vec![0u8; self.remaining_payload()];
		let n = self.read_payload(&mut out);
		out.truncate(n);
		Bytes::from(out)
	}
}

/// [`ChunkRead`] over an in-memory record.
#[derive(Debug, Clone, Default)]
pub struct RecordReader {
	buf: Bytes,
	current: Option<ChunkHeader>,
	remaining: usize,
}

impl RecordReader {
	pub fn new(buf: impl Into<Bytes>) -> Self {
		Self {
			buf: buf.into(),
			current: None,
			remaining: 0,
		}
	}

	/// Header of the chunk being read, if any.
	pub fn current(&self) -> Option<ChunkHeader> {
		self.current
	}

	/// Bytes left in the record, including the current payload.
	pub fn remaining(&self) -> usize {
		self.buf.len()
	}

	fn poison(&mut self, err: MalformedStream) -> MalformedStream {
		self.buf.clear();
		self.current = None;
		self.remaining = 0;
		err
	}

	fn read_header(&mut self) -> Result<Option<(Tag, usize)>, MalformedStream> {
		if self.buf.is_empty() {
			return Ok(None);
		}
		if self.buf.len() < HEADER_LEN {
			let available = self.buf.len();
			return Err(self.poison(MalformedStream::TruncatedHeader { available }));
		}
		let mut tag = [0u8; 4];
		self.buf.copy_to_slice(&mut tag);
		let len = usize::from(self.buf.get_u16_le());
		Ok(Some((Tag::new(tag), len)))
	}
}

impl ChunkRead for RecordReader {
	fn read_tag(&mut self) -> Result<Option<ChunkHeader>, MalformedStream> {
		self.buf.advance(self.remaining);
		self.remaining = 0;
		self.current = None;

		let mut size_override = None;
		loop {
			let Some((tag, short_len)) = self.read_header()? else {
				return match size_override {
					Some(_) => Err(self.poison(MalformedStream::DanglingSizeOverride)),
					None => Ok(None),
				};
			};

			if tag == SIZE_OVERRIDE {
				if short_len != 4 {
					return Err(self.poison(MalformedStream::BadSizeOverride { len: short_len }));
				}
				if size_override.is_some() {
					return Err(self.poison(MalformedStream::DanglingSizeOverride));
				}
				if self.buf.len() < 4 {
					let remaining = self.buf.len();
					return Err(self.poison(MalformedStream::TruncatedPayload {
						tag,
						declared: 4,
						remaining,
					}));
				}
				size_override = Some(self.buf.get_u32_le() as usize);
				continue;
			}

			let len = size_override.unwrap_or(short_len);
			if len > self.buf.len() {
				let remaining = self.buf.len();
				return Err(self.poison(MalformedStream::TruncatedPayload {
					tag,
					declared: len,
					remaining,
				}));
			}

			let header = ChunkHeader::new(tag, len);
			tracing::trace!(%tag, len, "read chunk header");
			self.current = Some(header);
			self.remaining = len;
			return Ok(Some(header));
		}
	}

	fn read_payload(&mut self, buf: &mut [u8]) -> usize {
		let n = buf.len().min(self.remaining);
		self.buf.copy_to_slice(&mut buf[..n]);
		self.remaining -= n;
		n
	}

	fn remaining_payload(&self) -> usize {
		self.remaining
	}

	fn at_end(&self) -> bool {
		self.buf.is_empty()
	}

	fn skip_payload(&mut self) {
		self.buf.advance(self.remaining);
		self.remaining = 0;
	}

	fn take_payload(&mut self) -> Bytes {
		let out = self.buf.split_to(self.remaining);
		self.remaining = 0;
		out
	}
}
