//! slotguard engine - orchestration layer
//!
//! Provides multi-unit comparison of storage layout snapshots on top of the
//! pure core checker: unit matching, per-unit error isolation, unit policy,
//! configuration and boundary logging.

pub mod commands;
pub mod config;

pub use commands::compare::{
    compare_snapshot_files, compare_snapshots, compare_unit, SnapshotReport, UnitOutcome,
};
pub use config::{load_config, parse_config, EngineConfig, UnitPolicy};
