//! Error handling for slotguard-snapshot
//!
//! Wraps slotguard-core ExError with snapshot-specific helpers

use slotguard_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a whole-document error
pub fn invalid_snapshot(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidSnapshot)
        .with_op("parse_snapshot")
        .with_message(reason.to_string())
}

/// Create an error for one unit of a snapshot
pub fn invalid_unit(unit: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidSnapshot)
        .with_op("parse_unit")
        .with_unit(unit)
        .with_message(reason.to_string())
}

/// Create an error for a variable whose type entry cannot be decoded
pub fn invalid_type(unit: &str, variable: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::MalformedLayout)
        .with_op("parse_unit")
        .with_unit(unit)
        .with_variable(variable)
        .with_message(reason.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(format!("{}: {}", path.display(), err))
}
