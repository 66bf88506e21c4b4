//! Binary compatibility between extension-built objects and the host.
//!
//! The host's class descriptions are incomplete: the number of virtual slots of
//! each base class is known, but some signatures are not, so the extension
//! cannot define those slots itself. This crate provides:
//!
//! * [`OwnedVTable`]: the extension-side dispatch table for one sub-object
//! * [`SlotMask`] + [`CompatTable`]: which slots are unknown per base class, and
//!   where the host's own table for that base lives
//! * [`patch_instance`]: copies the unknown slots from the host tables into the
//!   tables reachable from a freshly built instance
//! * [`HostString`]: the host's string member layout, for records embedded
//!   in host objects
//! * [`ExtensionApiV1`]: the append-only C table through which a loader talks to
//!   the extension without knowing its types

pub mod compat;
pub mod host;
pub mod interface;
pub mod mask;
pub mod patch;
pub mod slot;
pub mod string;
pub mod vtable;

pub use compat::{CompatEntry, CompatTable, base};
pub use host::{HostTarget, PerHost};
pub use interface::{EXTENSION_ABI_VERSION, ExtensionApiV1, ExtensionHandle, InterfaceError};
pub use mask::SlotMask;
pub use patch::{PatchEntry, PatchError, PatchReport, PatchedTable, patch_instance, patch_table};
pub use slot::{Slot, VPtr};
pub use string::HostString;
pub use vtable::{OwnedVTable, VTableBuilder, pure_call};
