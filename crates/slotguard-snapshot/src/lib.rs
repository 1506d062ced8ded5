//! slotguard snapshot - storage layout snapshot files
//!
//! Provides:
//! - The JSON snapshot format (compiler `storageLayout` shape, one entry per unit)
//! - A parser that decodes each unit's type table into core [`Layout`]s
//!
//! A unit whose type table cannot be decoded keeps its error in the
//! resulting [`LayoutSet`]; the other units are unaffected.
//!
//! [`Layout`]: slotguard_core::Layout

pub mod errors;
pub mod format;
pub mod parser;

// Re-export key types
pub use errors::Result;
pub use format::{Encoding, Members, StorageEntry, TypeEntry, UnitStorage};
pub use parser::{
    parse_snapshot_file, parse_snapshot_str, parse_unit, LayoutSet, ParseOptions, UnitLayout,
};
