//! Core types - pure abstractions shared across the crate.

mod file;
mod kind;
mod link;
mod reference;

pub use file::VirtualFile;
pub(crate) use file::extension_of;
pub use kind::AssetKind;
pub use link::{LinkKind, is_external_reference};
pub use reference::{Candidate, Reference};
