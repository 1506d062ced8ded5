//! Human-readable summary renderer for layout reports.

use crate::diff::model::{Finding, Report, Severity};
use crate::model::PositionedVariable;

/// Render a human-readable Markdown/text summary of a [`Report`].
///
/// Intended for CI logs and review comments. Only findings other than plain
/// OK are listed one by one; OK findings are counted.
pub fn render_human_summary(unit: &str, report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Storage Layout: {}\n\n", unit));

    let status = if report.ok() { "Safe" } else { "Unsafe" };
    out.push_str(&format!(
        "**Status**: {}  \n**Variables compared**: {}\n\n",
        status,
        report.findings().len()
    ));

    // Counts
    let counts: Vec<String> = Severity::ALL
        .iter()
        .map(|s| (s, report.count(*s)))
        .filter(|(_, n)| *n > 0)
        .map(|(s, n)| format!("{} {}", n, s.label()))
        .collect();
    if !counts.is_empty() {
        out.push_str(&format!("{}\n\n", counts.join(", ")));
    }

    let notable: Vec<&Finding> = report
        .findings()
        .iter()
        .filter(|f| f.severity != Severity::Ok)
        .collect();
    if notable.is_empty() {
        out.push_str("_No storage-affecting changes detected._\n");
        return out;
    }

    out.push_str("### Findings\n\n");
    for finding in notable {
        out.push_str(&format!(
            "- **{}** `{}` [{} → {}]: {}\n",
            finding.severity.label(),
            finding.name(),
            position(finding.old.as_ref()),
            position(finding.new.as_ref()),
            finding.explanation
        ));
    }

    out
}

fn position(var: Option<&PositionedVariable>) -> String {
    match var {
        Some(v) => format!("{}:{}", v.slot, v.offset),
        None => "-".to_string(),
    }
}
