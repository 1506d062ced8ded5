//! slotguard core - storage layout compatibility checker
//!
//! This crate decides whether an upgrade from one storage layout to another
//! keeps previously written storage readable. It provides:
//! - The layout data model (types, variables, layouts)
//! - The Slot Layout Resolver (slot/offset assignment with packing)
//! - The Type Compatibility Oracle (in-place reinterpretation rules)
//! - The Layout Differ (positional comparison producing a report)
//! - The error and logging facilities shared by the other crates
//!
//! Everything here is pure: no I/O, no shared state.

pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod oracle;
pub mod resolver;

// Re-exported so the logging macros resolve for downstream crates
pub use slotguard_core_types as core_types;

// Re-export commonly used types
pub use diff::{diff, CheckOptions, Finding, Report, Severity};
pub use errors::{ExError, ExErrorKind, LayoutError, Result};
pub use model::{Layout, PositionedVariable, TypeDescriptor, TypeKind, Variable};
pub use oracle::{is_compatible, CompatLevel, Compatibility};
pub use resolver::{resolve, SLOT_WIDTH};
