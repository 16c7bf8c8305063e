//! Voice catalog and selection.
//!
//! The backend supplies an asynchronously loaded voice list; this module
//! models it as an immutable snapshot and picks the best voice for a
//! requested language tag.

mod catalog;
mod resolver;

pub use catalog::{Voice, VoiceCatalog};
pub use resolver::{ResolverPolicy, resolve};
