//! Process-wide registry of extended record types.
//!
//! Each registered type gets a one-byte [`TypeCode`], a unique four-character
//! short name, and a factory. Registration happens during module load through a
//! [`RegistryBuilder`]; sealing turns the builder into an immutable
//! [`TypeRegistry`]. [`GlobalRegistry`] wraps both phases behind a `static`.
//!
//! The registry is generic over the instance type so it has no opinion on what a
//! record is; `formext-forms` instantiates it with boxed record trait objects.

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod global;
pub mod table;

pub use builder::RegistryBuilder;
pub use descriptor::{Factory, RecordTypeDescriptor};
pub use error::{RegistryError, Result};
pub use formext_primitives::{Tag, TypeCode};
pub use global::GlobalRegistry;
pub use table::TypeRegistry;
