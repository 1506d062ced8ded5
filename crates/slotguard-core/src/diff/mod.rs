//! Storage layout diff engine.
//!
//! Compares two layouts of one unit and produces a structured,
//! deterministic report suitable for CI gates and human review.
//!
//! ## Entry point
//!
//! ```
//! use slotguard_core::diff::{diff, render_human_summary};
//! use slotguard_core::model::{Layout, TypeDescriptor, Variable};
//!
//! let old = Layout::new(vec![Variable::new("a", TypeDescriptor::uint(256))]);
//! let new = Layout::new(vec![
//!     Variable::new("a", TypeDescriptor::uint(256)),
//!     Variable::new("b", TypeDescriptor::uint(256)),
//! ]);
//! let report = diff(&old, &new).unwrap();
//! assert!(report.ok());
//! let summary = render_human_summary("Token", &report);
//! assert!(summary.contains("Token"));
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical findings in
//!   declaration order.
//! - **Positional matching**: names are reported but never used to pair
//!   variables.
//! - **Errors are for input only**: every layout difference is a finding.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::diff;
pub use human_summary::render_human_summary;
pub use model::{CheckOptions, Finding, Report, Severity};
