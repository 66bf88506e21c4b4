use formext_abi::PatchError;
use formext_codec::{CodecError, MalformedStream};
use formext_config::ConfigError;
use formext_primitives::{FormId, TypeCode};
use formext_registry::RegistryError;
use thiserror::Error;

/// Decode failure of a single record. Other records are unaffected.
pub type LoadError = MalformedStream;

#[derive(Debug, Error)]
pub enum LifecycleError {
	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Patch(#[from] PatchError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The host profile has no entry for a base the record type derives from.
	#[error("no compatibility entry for base {base} of record type {code}")]
	MissingCompat { base: &'static str, code: TypeCode },
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),

	#[error(transparent)]
	Codec(#[from] CodecError),

	#[error("record of type {code} discarded: {source}")]
	Discarded {
		code: TypeCode,
		#[source]
		source: MalformedStream,
	},

	#[error("no record with form id {0}")]
	NotFound(FormId),

	#[error("record {0} is not a temporary copy")]
	NotTemporary(FormId),

	#[error("no form ids left to assign")]
	IdsExhausted,
}
