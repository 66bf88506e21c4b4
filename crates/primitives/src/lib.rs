//! Shared identifiers for extended record types.
//!
//! Every other formext crate speaks in these types:
//!
//! * [`Tag`]: four raw bytes naming a chunk kind or a record type on disk
//! * [`TypeCode`]: the one-byte form type assigned at registration
//! * [`FormId`]: the process-local numeric identity of a record
//! * [`FormFlags`]: record header flags, most importantly [`FormFlags::TEMPORARY`]

/// Record header flags.
pub mod flags;
/// Numeric identifiers.
pub mod ids;
/// Four-character tags.
pub mod tag;

pub use flags::FormFlags;
pub use ids::{FormId, TypeCode};
pub use tag::{Tag, TagError};
