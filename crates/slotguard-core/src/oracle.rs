//! Type Compatibility Oracle.
//!
//! Decides whether bytes written under an old type can be read back in place
//! under a new type. The decision is driven by kind, scalar class and byte
//! size only; labels never take part.

use serde::{Deserialize, Serialize};

use crate::diff::engine::diff_members;
use crate::errors::Result;
use crate::model::{StorageSize, TypeDescriptor, TypeKind};
use crate::resolver::{element_path, footprint};

/// Outcome class of a compatibility check, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatLevel {
    Compatible,
    /// Bit pattern preserved, meaning changed; surfaced for review only
    Warning,
    Incompatible,
}

/// Verdict returned by [`is_compatible`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub level: CompatLevel,
    pub reason: Option<String>,
}

impl Compatibility {
    pub fn compatible() -> Self {
        Self {
            level: CompatLevel::Compatible,
            reason: None,
        }
    }

    pub fn warning(reason: impl Into<String>) -> Self {
        Self {
            level: CompatLevel::Warning,
            reason: Some(reason.into()),
        }
    }

    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self {
            level: CompatLevel::Incompatible,
            reason: Some(reason.into()),
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.level != CompatLevel::Incompatible
    }

    pub fn is_warning(&self) -> bool {
        self.level == CompatLevel::Warning
    }

    /// Prefix the reason with the location it was found at
    fn within(self, context: &str) -> Self {
        Self {
            level: self.level,
            reason: self.reason.map(|r| format!("{}: {}", context, r)),
        }
    }
}

/// Where a type sits relative to its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// A variable or struct member; its neighbours are checked positionally
    Inline,
    /// An array element; every element after the first depends on its stride
    Element,
    /// A mapping value; each key hashes to an independent location
    MappingValue,
}

/// Decide whether a value stored as `old` can be reinterpreted as `new`.
///
/// Rules are evaluated in order and the first match wins:
///
/// 1. identical kind, size and structure: compatible
/// 2. scalars of equal width but different class: warning
/// 3. scalars of different width: incompatible
/// 4. dynamic arrays / mappings: the element or value type is checked
///    recursively; its failure is the container's failure
/// 5. fixed arrays of equal length: element check, worst level wins
/// 6. fixed arrays of different length: incompatible
/// 7. structs: member lists are diffed append-only
/// 8. anything else: incompatible
///
/// # Errors
///
/// Returns a [`crate::errors::LayoutError`] if either type is malformed in a
/// way the check needs to look at (e.g. a struct member without a size).
pub fn is_compatible(old: &TypeDescriptor, new: &TypeDescriptor) -> Result<Compatibility> {
    check(old, new, Position::Inline, "")
}

pub(crate) fn check_variable(
    old: &TypeDescriptor,
    new: &TypeDescriptor,
    path: &str,
) -> Result<Compatibility> {
    check(old, new, Position::Inline, path)
}

fn check(
    old: &TypeDescriptor,
    new: &TypeDescriptor,
    position: Position,
    path: &str,
) -> Result<Compatibility> {
    // Rule 1
    if old.kind == new.kind && old.size == new.size {
        return Ok(Compatibility::compatible());
    }

    let verdict = match (&old.kind, &new.kind) {
        // Rules 2 and 3
        (TypeKind::Scalar { class: a }, TypeKind::Scalar { class: b }) => {
            if old.size != new.size {
                Compatibility::incompatible(format!(
                    "`{}` ({}) cannot be reinterpreted as `{}` ({})",
                    old.label,
                    describe_size(old.size),
                    new.label,
                    describe_size(new.size)
                ))
            } else if a != b {
                Compatibility::warning(format!(
                    "`{}` reinterpreted as `{}`: same {} encoding, {} read as {}",
                    old.label,
                    new.label,
                    describe_size(new.size),
                    a.as_str(),
                    b.as_str()
                ))
            } else {
                Compatibility::compatible()
            }
        }
        (TypeKind::Enum, TypeKind::Enum)
        | (TypeKind::ContractRef, TypeKind::ContractRef)
        | (TypeKind::FunctionRef, TypeKind::FunctionRef) => {
            if old.size == new.size {
                Compatibility::compatible()
            } else {
                Compatibility::incompatible(format!(
                    "`{}` ({}) resized to `{}` ({})",
                    old.label,
                    describe_size(old.size),
                    new.label,
                    describe_size(new.size)
                ))
            }
        }
        // Rule 4
        (TypeKind::DynamicArray { element: a }, TypeKind::DynamicArray { element: b }) => {
            check(a, b, Position::Element, &element_path(path))?.within("array element")
        }
        (TypeKind::Mapping { value: a }, TypeKind::Mapping { value: b }) => {
            check(a, b, Position::MappingValue, &element_path(path))?.within("mapping value")
        }
        // Rules 5 and 6
        (
            TypeKind::FixedArray {
                element: a,
                length: la,
            },
            TypeKind::FixedArray {
                element: b,
                length: lb,
            },
        ) => {
            if la != lb {
                Compatibility::incompatible(format!(
                    "array length changed from {} to {}",
                    la, lb
                ))
            } else {
                check(a, b, Position::Element, &element_path(path))?.within("array element")
            }
        }
        // Rule 7
        (TypeKind::Struct { members: a }, TypeKind::Struct { members: b }) => {
            let report = diff_members(a, b, path)?;
            let members = if let Some(finding) = report.unsafe_findings().next() {
                Compatibility::incompatible(format!(
                    "member `{}` {}",
                    finding.name(),
                    finding.explanation
                ))
            } else if let Some(finding) = report.warnings().next() {
                Compatibility::warning(format!(
                    "member `{}`: {}",
                    finding.name(),
                    finding.explanation
                ))
            } else {
                Compatibility::compatible()
            };

            if members.is_compatible() && position == Position::Element {
                let before = footprint(old, path)?.slots();
                let after = footprint(new, path)?.slots();
                if before != after {
                    return Ok(Compatibility::incompatible(format!(
                        "`{}` grew from {} to {} slots, shifting every array element after the first",
                        new.label, before, after
                    )));
                }
            }
            members
        }
        // Rule 8
        _ => Compatibility::incompatible(format!(
            "{} `{}` replaced by {} `{}`",
            old.kind.name(),
            old.label,
            new.kind.name(),
            new.label
        )),
    };

    Ok(verdict)
}

fn describe_size(size: Option<StorageSize>) -> String {
    match size {
        Some(StorageSize::Bytes(n)) => format!("{}-byte", n),
        Some(StorageSize::Dynamic) => "dynamic".to_string(),
        None => "unsized".to_string(),
    }
}
