use formext_primitives::{Tag, TagError, TypeCode};

/// Registry failures.
///
/// All of them are fatal to extension initialization except [`RegistryError::UnknownType`]
/// and [`RegistryError::NotFound`], which callers may treat as a missing record type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// Another module already claimed the short name.
	#[error(
		"short name {short_name} from {module} is already registered by {existing_module} as {existing_code}"
	)]
	DuplicateShortName {
		short_name: Tag,
		module: &'static str,
		existing_module: &'static str,
		existing_code: TypeCode,
	},

	/// Registration attempted after the registration phase closed.
	#[error("cannot register {short_name:?} from {module}: registry is sealed")]
	Sealed {
		short_name: String,
		module: &'static str,
	},

	#[error("no record type registered for code {0}")]
	UnknownType(TypeCode),

	#[error("no record type registered under short name {0:?}")]
	NotFound(String),

	#[error("invalid short name: {0}")]
	InvalidShortName(#[from] TagError),

	/// The one-byte code space is spent.
	#[error("no type codes left after {last}")]
	CodesExhausted { last: TypeCode },

	/// The first code can only change before any type was registered.
	#[error("type codes already assigned; the first code can no longer change")]
	CodesAssigned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
