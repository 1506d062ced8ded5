//! Layout diff output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Findings keep declaration order so that output is deterministic.

use serde::{Deserialize, Serialize};

use crate::model::PositionedVariable;

/// Classification of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Unchanged, harmlessly renamed, or appended after the old tail
    Ok,
    /// Same bit pattern, different meaning; surfaced for review, never blocking
    Warning,
    /// An appended variable lands on bytes the old layout already uses
    UnsafeAppend,
    /// A declared variable disappeared
    UnsafeRemove,
    /// The type at a position can no longer be read in place
    UnsafeTypeChange,
    /// The variable moved because something before it changed size
    UnsafeResize,
}

impl Severity {
    pub fn is_unsafe(&self) -> bool {
        !matches!(self, Severity::Ok | Severity::Warning)
    }

    /// Stable display label
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::UnsafeAppend => "UNSAFE-APPEND",
            Severity::UnsafeRemove => "UNSAFE-REMOVE",
            Severity::UnsafeTypeChange => "UNSAFE-TYPE-CHANGE",
            Severity::UnsafeResize => "UNSAFE-RESIZE",
        }
    }

    pub const ALL: [Severity; 6] = [
        Severity::Ok,
        Severity::Warning,
        Severity::UnsafeAppend,
        Severity::UnsafeRemove,
        Severity::UnsafeTypeChange,
        Severity::UnsafeResize,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One comparison result for a matched or unmatched declaration index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Absent when the variable was appended
    pub old: Option<PositionedVariable>,
    /// Absent when the variable was removed
    pub new: Option<PositionedVariable>,
    pub explanation: String,
}

impl Finding {
    /// Name to report the finding under (the new name wins over the old one)
    pub fn name(&self) -> &str {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(PositionedVariable::name)
            .unwrap_or_default()
    }

    /// Declaration index the finding is about
    pub fn index(&self) -> usize {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(|v| v.index)
            .unwrap_or_default()
    }
}

/// Options controlling whether a report passes a gate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Treat WARNING findings as blocking
    pub strict_warnings: bool,
}

/// All findings of one layout comparison
///
/// `ok` is derived once at construction: true iff no finding is unsafe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    ok: bool,
    findings: Vec<Finding>,
}

impl Report {
    pub fn new(findings: Vec<Finding>) -> Self {
        let ok = !findings.iter().any(|f| f.severity.is_unsafe());
        Self { ok, findings }
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Whether the report passes under `options`
    pub fn passes(&self, options: &CheckOptions) -> bool {
        self.ok && !(options.strict_warnings && self.warnings().next().is_some())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn unsafe_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity.is_unsafe())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }
}
