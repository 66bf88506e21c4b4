//! Table-driven decoding of one record stream.

use std::fmt;

use formext_primitives::Tag;
use rustc_hash::FxHashMap;

use crate::chunk::ChunkHeader;
use crate::error::MalformedStream;
use crate::payload::Payload;
use crate::reader::ChunkRead;

/// Applies one chunk to the record being decoded.
pub type ChunkHandler<T> = fn(&mut T, &mut Payload<'_>) -> Result<(), MalformedStream>;

/// Handlers keyed by chunk tag.
pub struct ChunkHandlers<T> {
	handlers: FxHashMap<Tag, ChunkHandler<T>>,
}

impl<T> Default for ChunkHandlers<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> ChunkHandlers<T> {
	pub fn new() -> Self {
		Self {
			handlers: FxHashMap::default(),
		}
	}

	pub fn with(mut self, tag: Tag, handler: ChunkHandler<T>) -> Self {
		self.insert(tag, handler);
		self
	}

	/// Installs `handler` for `tag`, returning the handler it replaced.
	pub fn insert(&mut self, tag: Tag, handler: ChunkHandler<T>) -> Option<ChunkHandler<T>> {
		self.handlers.insert(tag, handler)
	}

	pub fn get(&self, tag: Tag) -> Option<ChunkHandler<T>> {
		self.handlers.get(&tag).copied()
	}

	pub fn contains(&self, tag: Tag) -> bool {
		self.handlers.contains_key(&tag)
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

impl<T> fmt::Debug for ChunkHandlers<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut tags: Vec<_> = self.handlers.keys().collect();
		tags.sort();
		f.debug_struct("ChunkHandlers").field("tags", &tags).finish()
	}
}

/// A chunk skipped because no handler knew its tag. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnrecognizedChunk {
	pub tag: Tag,
	pub len: usize,
}

impl fmt::Display for UnrecognizedChunk {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unrecognized chunk {} ({} bytes)", self.tag, self.len)
	}
}

/// Outcome of a successful decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
	/// Chunks applied by a handler.
	pub decoded: usize,
	pub unrecognized: Vec<UnrecognizedChunk>,
}

impl DecodeReport {
	pub fn is_clean(&self) -> bool {
		self.unrecognized.is_empty()
	}
}

enum DecodeState {
	AwaitTag,
	HaveTag(ChunkHeader),
	AwaitNext,
}

/// Decodes every chunk of `reader` into `target`.
///
/// Stops at the end of the record or at the first malformed chunk. On error
/// `target` keeps whatever the preceding chunks applied.
pub fn decode<T>(
	target: &mut T,
	reader: &mut dyn ChunkRead,
	handlers: &ChunkHandlers<T>,
) -> Result<DecodeReport, MalformedStream> {
	let mut report = DecodeReport::default();
	let mut state = DecodeState::AwaitTag;
	loop {
		state = match state {
			DecodeState::AwaitTag => match reader.read_tag()? {
				Some(header) => DecodeState::HaveTag(header),
				None => break,
			},
			DecodeState::HaveTag(header) => {
				match handlers.get(header.tag) {
					Some(handler) => {
						let mut payload = Payload::new(header, reader);
						handler(target, &mut payload)?;
						report.decoded += 1;
					}
					None => {
						let chunk = UnrecognizedChunk {
							tag: header.tag,
							len: header.len,
						};
						tracing::warn!(tag = %chunk.tag, len = chunk.len, "skipping unrecognized chunk");
						reader.skip_payload();
						report.unrecognized.push(chunk);
					}
				}
				DecodeState::AwaitNext
			}
			DecodeState::AwaitNext => {
				let left = reader.remaining_payload();
				if left > 0 {
					tracing::trace!(left, "discarding unread payload");
					reader.skip_payload();
				}
				DecodeState::AwaitTag
			}
		};
	}
	Ok(report)
}
