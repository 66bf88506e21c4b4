use formext_primitives::Tag;

/// A record stream that cannot be decoded past some point.
///
/// Decoding of the affected record stops at the first one of these. Whatever
/// was applied before the error stays applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedStream {
	#[error("truncated chunk header: {available} of 6 bytes left")]
	TruncatedHeader { available: usize },

	#[error("chunk {tag} declares {declared} bytes but only {remaining} remain")]
	TruncatedPayload {
		tag: Tag,
		declared: usize,
		remaining: usize,
	},

	#[error("chunk {tag} is too short: wanted {wanted} bytes, {available} left")]
	ShortPayload {
		tag: Tag,
		wanted: usize,
		available: usize,
	},

	#[error("size override chunk has length {len}, expected 4")]
	BadSizeOverride { len: usize },

	#[error("size override is not followed by a chunk")]
	DanglingSizeOverride,
}

/// Failures while producing or flushing a record.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	#[error(transparent)]
	Malformed(#[from] MalformedStream),

	#[error("chunk {tag} payload of {len} bytes does not fit a size override")]
	PayloadTooLarge { tag: Tag, len: usize },

	/// The size-override tag is written by the writer itself, never by callers.
	#[error("chunk tag {0} is reserved")]
	ReservedTag(Tag),

	#[error("failed to flush record: {0}")]
	Io(#[from] std::io::Error),
}
