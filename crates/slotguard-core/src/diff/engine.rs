//! Layout Differ.
//!
//! The core entry point is [`diff`], which resolves two layouts and walks
//! them in declaration order, producing a [`Report`].
//!
//! Variables are matched by position, never by name: storage is addressed by
//! slot, and the slot follows from order and size alone.

use crate::diff::model::{Finding, Report, Severity};
use crate::errors::Result;
use crate::model::{Layout, PositionedVariable, Variable};
use crate::oracle::{check_variable, CompatLevel};
use crate::resolver::{join_path, resolve_in_scope, SLOT_WIDTH};

/// Compare an old layout against a new one.
///
/// Emits one finding per declaration index up to the longer of the two
/// layouts. The report is ok iff no finding is unsafe.
///
/// # Errors
///
/// Returns a [`crate::errors::LayoutError`] only when a layout cannot be
/// resolved at all. Differences between layouts, however severe, are
/// findings.
pub fn diff(old: &Layout, new: &Layout) -> Result<Report> {
    diff_members(old.variables(), new.variables(), "")
}

/// Diff two variable lists laid out from slot 0. Also used for struct members.
pub(crate) fn diff_members(old: &[Variable], new: &[Variable], scope: &str) -> Result<Report> {
    let old_resolved = resolve_in_scope(old, scope)?.variables;
    let new_resolved = resolve_in_scope(new, scope)?.variables;

    let len = old_resolved.len().max(new_resolved.len());
    let mut findings = Vec::with_capacity(len);

    for i in 0..len {
        let finding = match (old_resolved.get(i), new_resolved.get(i)) {
            (Some(o), Some(n)) => compare_pair(o, n, scope)?,
            (Some(o), None) => Finding {
                severity: Severity::UnsafeRemove,
                old: Some(o.clone()),
                new: None,
                explanation: format!(
                    "removed from slot {}, offset {}; later data at this position would be misread",
                    o.slot, o.offset
                ),
            },
            (None, Some(n)) => appended(n, &old_resolved),
            (None, None) => continue,
        };
        tracing::debug!(
            variable = %join_path(scope, finding.name()),
            severity = finding.severity.label(),
            "classified"
        );
        findings.push(finding);
    }

    Ok(Report::new(findings))
}

fn compare_pair(
    old: &PositionedVariable,
    new: &PositionedVariable,
    scope: &str,
) -> Result<Finding> {
    let path = join_path(scope, new.name());
    let verdict = check_variable(old.ty(), new.ty(), &path)?;
    let moved = old.position() != new.position();

    let (severity, explanation) = match verdict.level {
        CompatLevel::Incompatible => {
            let reason = verdict.reason.unwrap_or_default();
            if moved {
                (
                    Severity::UnsafeTypeChange,
                    format!(
                        "{}; also moved from slot {}, offset {} to slot {}, offset {}",
                        reason, old.slot, old.offset, new.slot, new.offset
                    ),
                )
            } else {
                (Severity::UnsafeTypeChange, reason)
            }
        }
        _ if moved => (
            Severity::UnsafeResize,
            format!(
                "moved from slot {}, offset {} to slot {}, offset {} because an earlier variable changed size",
                old.slot, old.offset, new.slot, new.offset
            ),
        ),
        CompatLevel::Warning => (
            Severity::Warning,
            with_rename(verdict.reason.unwrap_or_default(), old, new),
        ),
        CompatLevel::Compatible => (Severity::Ok, unchanged(old, new)),
    };

    Ok(Finding {
        severity,
        old: Some(old.clone()),
        new: Some(new.clone()),
        explanation,
    })
}

fn unchanged(old: &PositionedVariable, new: &PositionedVariable) -> String {
    if old.name() != new.name() {
        format!("renamed from `{}` to `{}`", old.name(), new.name())
    } else {
        format!("unchanged at slot {}, offset {}", new.slot, new.offset)
    }
}

fn with_rename(reason: String, old: &PositionedVariable, new: &PositionedVariable) -> String {
    if old.name() != new.name() {
        format!("{} (renamed from `{}`)", reason, old.name())
    } else {
        reason
    }
}

/// A new tail variable is safe unless it lands on bytes the old layout used.
fn appended(new: &PositionedVariable, old: &[PositionedVariable]) -> Finding {
    match old.iter().find(|o| o.overlaps(new, SLOT_WIDTH)) {
        Some(clash) => Finding {
            severity: Severity::UnsafeAppend,
            old: None,
            new: Some(new.clone()),
            explanation: format!(
                "appended at slot {}, offset {}, overlapping storage of `{}` (slot {}, offset {})",
                new.slot,
                new.offset,
                clash.name(),
                clash.slot,
                clash.offset
            ),
        },
        None => Finding {
            severity: Severity::Ok,
            old: None,
            new: Some(new.clone()),
            explanation: format!("appended at slot {}, offset {}", new.slot, new.offset),
        },
    }
}
