//! Engine configuration.
//!
//! Loaded from an optional TOML file; every section and key may be omitted.
//!
//! # Example
//!
//! ```toml
//! [check]
//! strict_warnings = true
//!
//! [units]
//! fail_on_removed = true
//! fail_on_added = false
//!
//! [snapshot]
//! honor_declared_slots = false
//! ```

#![allow(clippy::result_large_err)]

use serde::{Deserialize, Serialize};
use slotguard_core::errors::{ExError, ExErrorKind};
use slotguard_core::CheckOptions;
use slotguard_snapshot::ParseOptions;
use std::path::Path;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// `[check]`: gate applied to each compared unit's report
    pub check: CheckOptions,
    /// `[units]`: how whole-unit additions and removals are judged
    pub units: UnitPolicy,
    /// `[snapshot]`: how snapshot files are decoded
    pub snapshot: ParseOptions,
}

/// Whether adding or removing a whole unit fails the run
///
/// Both default to false: a unit that exists on one side only is reported
/// but not compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnitPolicy {
    pub fail_on_removed: bool,
    pub fail_on_added: bool,
}

/// Read and parse a config TOML file from `path`.
///
/// # Errors
///
/// `Io` if the file cannot be read, `InvalidConfig` if it does not parse.
pub fn load_config(path: &Path) -> Result<EngineConfig, ExError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ExError::new(ExErrorKind::Io)
            .with_op("load_config")
            .with_message(format!("could not read '{}': {}", path.display(), e))
    })?;

    parse_config(&content).map_err(|e| {
        let message = format!("{} ({})", e.message(), path.display());
        e.with_message(message)
    })
}

/// Parse config TOML text.
///
/// # Errors
///
/// `InvalidConfig` on malformed TOML, unknown keys or wrongly typed values.
pub fn parse_config(content: &str) -> Result<EngineConfig, ExError> {
    toml::from_str(content).map_err(|e| {
        ExError::new(ExErrorKind::InvalidConfig)
            .with_op("load_config")
            .with_message(format!("could not parse config: {}", e))
    })
}
