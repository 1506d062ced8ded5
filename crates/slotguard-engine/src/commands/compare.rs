//! Snapshot comparison with boundary logging.
//!
//! Matches units of a reference snapshot against a head snapshot by name,
//! compares each shared unit with the core checker and collects the outcomes
//! into a [`SnapshotReport`].
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for comparisons:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (snapshot, core) use only `tracing::debug!()` for internal details.

#![allow(clippy::result_large_err)]

use crate::config::EngineConfig;
use serde_json::json;
use slotguard_core::diff::render_human_summary;
use slotguard_core::errors::{ExError, ExErrorKind};
use slotguard_core::{diff, log_op_end, log_op_error, log_op_start, Layout, Report};
use slotguard_snapshot::{parse_snapshot_file, LayoutSet};
use std::collections::BTreeMap;
use std::path::Path;

/// What happened to one unit
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// Present on both sides and compared
    Compared(Report),
    /// Present on both sides but one of them could not be decoded or resolved
    Failed(ExError),
    /// Present only in the reference snapshot
    Removed,
    /// Present only in the head snapshot
    Added,
}

impl UnitOutcome {
    /// Whether this outcome lets the run pass under `config`
    pub fn passes(&self, config: &EngineConfig) -> bool {
        match self {
            UnitOutcome::Compared(report) => report.passes(&config.check),
            UnitOutcome::Failed(_) => false,
            UnitOutcome::Removed => !config.units.fail_on_removed,
            UnitOutcome::Added => !config.units.fail_on_added,
        }
    }

    fn status(&self) -> &'static str {
        match self {
            UnitOutcome::Compared(_) => "compared",
            UnitOutcome::Failed(_) => "failed",
            UnitOutcome::Removed => "removed",
            UnitOutcome::Added => "added",
        }
    }
}

/// Outcomes of all units, keyed and ordered by unit name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotReport {
    units: BTreeMap<String, UnitOutcome>,
}

impl SnapshotReport {
    pub fn units(&self) -> &BTreeMap<String, UnitOutcome> {
        &self.units
    }

    pub fn get(&self, unit: &str) -> Option<&UnitOutcome> {
        self.units.get(unit)
    }

    /// True iff every unit passes under `config`
    pub fn passes(&self, config: &EngineConfig) -> bool {
        self.units.values().all(|o| o.passes(config))
    }

    /// True if any unit failed on malformed input rather than on findings
    pub fn has_input_errors(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ExError)> {
        self.units.iter().filter_map(|(name, outcome)| match outcome {
            UnitOutcome::Failed(err) => Some((name.as_str(), err)),
            _ => None,
        })
    }

    /// Machine-readable rendering
    ///
    /// # Errors
    ///
    /// `Serialization` if a report cannot be converted to JSON.
    pub fn to_json(&self, config: &EngineConfig) -> Result<serde_json::Value, ExError> {
        let mut units = serde_json::Map::new();
        for (name, outcome) in &self.units {
            let mut entry = json!({
                "status": outcome.status(),
                "passes": outcome.passes(config),
            });
            match outcome {
                UnitOutcome::Compared(report) => {
                    entry["report"] = serde_json::to_value(report).map_err(|e| {
                        ExError::new(ExErrorKind::Serialization)
                            .with_op("to_json")
                            .with_unit(name)
                            .with_message(e.to_string())
                    })?;
                }
                UnitOutcome::Failed(err) => {
                    entry["error"] = json!({
                        "code": err.code(),
                        "message": err.message(),
                        "variable": err.variable(),
                    });
                }
                UnitOutcome::Removed | UnitOutcome::Added => {}
            }
            units.insert(name.clone(), entry);
        }

        Ok(json!({
            "ok": self.passes(config),
            "units": units,
        }))
    }

    /// Human-readable rendering, one section per unit
    pub fn to_text(&self, config: &EngineConfig) -> String {
        let mut out = String::new();
        for (name, outcome) in &self.units {
            match outcome {
                UnitOutcome::Compared(report) => out.push_str(&render_human_summary(name, report)),
                UnitOutcome::Failed(err) => out.push_str(&format!(
                    "## Storage Layout: {}\n\n**Status**: Error  \n{}\n",
                    name, err
                )),
                UnitOutcome::Removed => out.push_str(&format!(
                    "## Storage Layout: {}\n\n**Status**: Removed (only in reference)\n",
                    name
                )),
                UnitOutcome::Added => out.push_str(&format!(
                    "## Storage Layout: {}\n\n**Status**: Added (only in head)\n",
                    name
                )),
            }
            out.push('\n');
        }

        let verdict = if self.has_input_errors() {
            "ERROR"
        } else if self.passes(config) {
            "PASS"
        } else {
            "FAIL"
        };
        out.push_str(&format!("Result: {} ({} units)\n", verdict, self.units.len()));
        out
    }
}

/// Compare one unit's reference layout against its head layout
///
/// ## Errors
///
/// - `MalformedLayout` / `StructuralImpossibility`: a layout cannot be resolved
pub fn compare_unit(unit: &str, old: &Layout, new: &Layout) -> Result<Report, ExError> {
    log_op_start!(
        "compare_unit",
        unit = unit,
        old_len = old.len() as u64,
        new_len = new.len() as u64
    );
    let start = std::time::Instant::now();

    let report = diff(old, new).map_err(|e| {
        let err = ExError::from(e).with_op("compare_unit").with_unit(unit);
        log_op_error!(
            "compare_unit",
            err.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            unit = unit
        );
        err
    })?;

    log_op_end!(
        "compare_unit",
        duration_ms = start.elapsed().as_millis() as u64,
        unit = unit,
        finding_count = report.findings().len() as u64,
        unsafe_count = report.unsafe_findings().count() as u64,
        ok = report.ok()
    );

    Ok(report)
}

/// Compare every unit of `old` against the same-named unit of `new`
///
/// Units are visited in name order. A unit that fails to decode or resolve
/// becomes [`UnitOutcome::Failed`] without affecting the other units.
pub fn compare_snapshots(old: &LayoutSet, new: &LayoutSet, config: &EngineConfig) -> SnapshotReport {
    log_op_start!(
        "compare_snapshots",
        old_len = old.len() as u64,
        new_len = new.len() as u64
    );
    let start = std::time::Instant::now();

    let mut units = BTreeMap::new();
    for (name, old_unit) in old {
        let outcome = match (old_unit, new.get(name)) {
            (_, None) => UnitOutcome::Removed,
            (Err(err), Some(_)) | (Ok(_), Some(Err(err))) => UnitOutcome::Failed(err.clone()),
            (Ok(old_layout), Some(Ok(new_layout))) => {
                match compare_unit(name, old_layout, new_layout) {
                    Ok(report) => UnitOutcome::Compared(report),
                    Err(err) => UnitOutcome::Failed(err),
                }
            }
        };
        units.insert(name.clone(), outcome);
    }
    for name in new.keys().filter(|name| !old.contains_key(*name)) {
        units.insert(name.clone(), UnitOutcome::Added);
    }

    let report = SnapshotReport { units };
    log_op_end!(
        "compare_snapshots",
        duration_ms = start.elapsed().as_millis() as u64,
        ok = report.passes(config),
        failed = report.failures().count() as u64
    );
    report
}

/// Parse two snapshot files and compare them
///
/// ## Errors
///
/// - `Io`: a file could not be read
/// - `InvalidSnapshot`: a file is not a snapshot document
pub fn compare_snapshot_files(
    ref_path: &Path,
    head_path: &Path,
    config: &EngineConfig,
) -> Result<SnapshotReport, ExError> {
    log_op_start!(
        "compare_snapshot_files",
        reference = %ref_path.display(),
        head = %head_path.display()
    );
    let start = std::time::Instant::now();

    let parsed = parse_snapshot_file(ref_path, &config.snapshot).and_then(|old| {
        parse_snapshot_file(head_path, &config.snapshot).map(|new| (old, new))
    });
    let (old, new) = parsed.map_err(|e| {
        log_op_error!(
            "compare_snapshot_files",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    let report = compare_snapshots(&old, &new, config);

    log_op_end!(
        "compare_snapshot_files",
        duration_ms = start.elapsed().as_millis() as u64,
        units = report.units().len() as u64
    );
    Ok(report)
}
