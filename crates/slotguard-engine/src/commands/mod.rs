//! Command orchestration layer.
//!
//! Provides high-level command functions that coordinate between the
//! snapshot parser and the core checker.

pub mod compare;
