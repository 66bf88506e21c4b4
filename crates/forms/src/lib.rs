//! Extended record types for a partially described host.
//!
//! An extended record is a Rust struct laid out like a host form: a
//! [`FormHeader`] sub-object first, then one sub-object per embedded
//! component, each starting with its dispatch-table pointer. [`Lifecycle`]
//! builds instances through the type registry, points their sub-objects at
//! per-type tables and patches the slots the extension cannot define with the
//! host's own entries, once per type. Records persist through the chunk codec.
//!
//! [`MyForm`] is the example record type; [`extension`] is the entry surface a
//! loader uses.

pub mod component;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod form;
pub mod lifecycle;
pub mod my_form;
pub mod record;
pub mod store;

pub use component::{BoxedText, Components, ComponentsMut, Description, FullName, Icon, Value, Weight};
pub use error::{LifecycleError, LoadError, StoreError};
pub use form::{EDITOR_ID_MAX, FormHeader};
pub use formext_config::PartialRecordPolicy;
pub use lifecycle::{Lifecycle, RecordFactory, RecordTypeDef, RecordTypeReg, Registry, load_form};
pub use my_form::MyForm;
pub use record::{ExtendedRecord, SubObject};
pub use store::FormStore;

#[cfg(test)]
mod tests;
