//! Chunked binary format for extended record payloads.
//!
//! A record is a flat sequence of chunks, each laid out as
//!
//! ```text
//! tag: [u8; 4] | len: u16 LE | payload: [u8; len]
//! ```
//!
//! Payloads longer than `u16::MAX` are preceded by a size-override chunk
//! (`XXXX`, length 4, `u32` LE real size) and carry 0 in their own length
//! field. Chunk order carries no meaning, and chunks the reader does not know
//! are skipped by length, so older and newer builds can read each other's
//! records.
//!
//! [`ChunkRead`] and [`ChunkWrite`] are the only surface the surrounding
//! persistence layer has to provide. [`decode`] drives a [`ChunkHandlers`] table
//! over a reader.

pub mod chunk;
pub mod decode;
pub mod error;
pub mod payload;
pub mod reader;
pub mod writer;

pub use chunk::{ChunkHeader, HEADER_LEN, MAX_INLINE_LEN, SIZE_OVERRIDE};
pub use decode::{ChunkHandler, ChunkHandlers, DecodeReport, UnrecognizedChunk, decode};
pub use error::{CodecError, MalformedStream};
pub use formext_primitives::Tag;
pub use payload::Payload;
pub use reader::{ChunkRead, RecordReader};
pub use writer::{ChunkWrite, RecordWriter};
