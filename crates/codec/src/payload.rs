use bytes::Bytes;
use formext_primitives::Tag;

use crate::chunk::ChunkHeader;
use crate::error::MalformedStream;
use crate::reader::ChunkRead;

/// Typed view of the current chunk's payload, handed to chunk handlers.
pub struct Payload<'a> {
	header: ChunkHeader,
	reader: &'a mut dyn ChunkRead,
}

impl<'a> Payload<'a> {
	pub fn new(header: ChunkHeader, reader: &'a mut dyn ChunkRead) -> Self {
		Self { header, reader }
	}

	pub fn tag(&self) -> Tag {
		self.header.tag
	}

	/// Declared payload length.
	pub fn len(&self) -> usize {
		self.header.len
	}

	pub fn is_empty(&self) -> bool {
		self.header.len == 0
	}

	/// Bytes not yet consumed.
	pub fn remaining(&self) -> usize {
		self.reader.remaining_payload()
	}

	pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MalformedStream> {
		let available = self.remaining();
		if available < buf.len() {
			return Err(MalformedStream::ShortPayload {
				tag: self.header.tag,
				wanted: buf.len(),
				available,
			});
		}
		self.reader.read_payload(buf);
		Ok(())
	}

	fn array<const N: usize>(&mut self) -> Result<[u8; N], MalformedStream> {
		let mut out = [0u8; N];
		self.read_exact(&mut out)?;
		Ok(out)
	}

	pub fn read_u8(&mut self) -> Result<u8, MalformedStream> {
		Ok(self.array::<1>()?[0])
	}

	pub fn read_u32(&mut self) -> Result<u32, MalformedStream> {
		self.array().map(u32::from_le_bytes)
	}

	pub fn read_i32(&mut self) -> Result<i32, MalformedStream> {
		self.array().map(i32::from_le_bytes)
	}

	pub fn read_f32(&mut self) -> Result<f32, MalformedStream> {
		self.array().map(f32::from_le_bytes)
	}

	/// Reads exactly `n` bytes.
	pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, MalformedStream> {
		let mut out = vec![0u8; n];
		self.read_exact(&mut out)?;
		Ok(Bytes::from(out))
	}

	/// Reads up to a NUL terminator or the end of the payload.
	///
	/// The terminator is consumed. Bytes that are not UTF-8 are replaced.
	pub fn read_zstring(&mut self) -> String {
		let mut raw = Vec::with_capacity(self.remaining());
		let mut byte = [0u8; 1];
		while self.reader.read_payload(&mut byte) == 1 && byte[0] != 0 {
			raw.push(byte[0]);
		}
		String::from_utf8_lossy(&raw).into_owned()
	}

	/// Consumes and returns everything left.
	pub fn rest(&mut self) -> Bytes {
		self.reader.take_payload()
	}
}

impl std::fmt::Debug for Payload<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Payload")
			.field("header", &self.header)
			.field("remaining", &self.remaining())
			.finish()
	}
}
