//! Storage layout data model.
//!
//! Immutable value records: a [`Layout`] is an ordered list of [`Variable`]s,
//! each carrying a recursive [`TypeDescriptor`]. The resolver turns a layout
//! into [`PositionedVariable`]s.

pub mod types;
pub mod variable;

pub use types::{ScalarClass, StorageSize, TypeDescriptor, TypeKind};
pub use variable::{Layout, PositionedVariable, SlotHint, Variable};
