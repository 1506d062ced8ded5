//! Snapshot parser with validation
//!
//! Parses a JSON snapshot (unit name -> storage layout) and decodes each
//! unit's type table into core type descriptors. Failures are isolated per
//! unit: a broken unit yields an error entry, the rest still parse.

#![allow(clippy::result_large_err)]

use crate::errors::{invalid_snapshot, invalid_type, invalid_unit, io_error, Result};
use crate::format::{
    array_base_id, mapping_value_id, Encoding, Members, StorageEntry, TypeEntry, UnitStorage,
};
use serde::{Deserialize, Serialize};
use slotguard_core::errors::ExError;
use slotguard_core::model::{ScalarClass, StorageSize, TypeKind};
use slotguard_core::{Layout, TypeDescriptor, Variable};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parse-time options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Carry declared `slot`/`offset` values as slot hints instead of
    /// recomputing every position
    pub honor_declared_slots: bool,
}

/// Layout of one unit, or the reason it could not be decoded
pub type UnitLayout = std::result::Result<Layout, ExError>;

/// All units of one snapshot, in unit-name order
pub type LayoutSet = BTreeMap<String, UnitLayout>;

/// Parse a snapshot file from a path
///
/// # Errors
///
/// `Io` if the file cannot be read, otherwise as [`parse_snapshot_str`].
pub fn parse_snapshot_file(path: &Path, options: &ParseOptions) -> Result<LayoutSet> {
    let content = fs::read_to_string(path).map_err(|e| io_error("read_snapshot", path, e))?;

    parse_snapshot_str(&content, options)
}

/// Parse a snapshot from a string
///
/// # Errors
///
/// Fails only if the document is not a JSON object. Problems inside a unit
/// are returned as that unit's entry.
pub fn parse_snapshot_str(content: &str, options: &ParseOptions) -> Result<LayoutSet> {
    let units: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)
        .map_err(|e| invalid_snapshot(&format!("JSON parse error: {}", e)))?;

    let set: LayoutSet = units
        .into_iter()
        .map(|(name, value)| {
            let layout = parse_unit(&name, value, options);
            (name, layout)
        })
        .collect();

    tracing::debug!(
        units = set.len(),
        failed = set.values().filter(|u| u.is_err()).count(),
        "snapshot parsed"
    );
    Ok(set)
}

/// Decode one unit's storage layout
///
/// # Errors
///
/// `InvalidSnapshot` if the unit does not have the expected shape,
/// `MalformedLayout` naming the variable whose type cannot be decoded.
pub fn parse_unit(name: &str, value: serde_json::Value, options: &ParseOptions) -> UnitLayout {
    let storage: UnitStorage = serde_json::from_value(value)
        .map_err(|e| invalid_unit(name, &format!("unexpected unit shape: {}", e)))?;

    let mut decoder = TypeDecoder {
        unit: name,
        types: &storage.types,
        options,
        stack: Vec::new(),
    };

    storage
        .storage
        .iter()
        .map(|entry| decoder.variable(entry, ""))
        .collect::<Result<Vec<_>>>()
        .map(Layout::new)
}

/// Walks the type table of one unit
struct TypeDecoder<'a> {
    unit: &'a str,
    types: &'a BTreeMap<String, TypeEntry>,
    options: &'a ParseOptions,
    /// Type ids currently being decoded, for cycle detection
    stack: Vec<String>,
}

impl TypeDecoder<'_> {
    fn variable(&mut self, entry: &StorageEntry, scope: &str) -> Result<Variable> {
        let path = if scope.is_empty() {
            entry.label.clone()
        } else {
            format!("{}.{}", scope, entry.label)
        };
        let ty = self.decode(&entry.type_id, &path)?;
        let variable = Variable::new(entry.label.clone(), ty);

        match entry.slot {
            Some(slot) if self.options.honor_declared_slots => {
                Ok(variable.with_slot_hint(slot, entry.offset))
            }
            _ => Ok(variable),
        }
    }

    fn decode(&mut self, type_id: &str, path: &str) -> Result<TypeDescriptor> {
        if self.stack.iter().any(|id| id == type_id) {
            return Err(self.error(
                path,
                &format!("cyclic type reference through `{}`", type_id),
            ));
        }
        let types = self.types;
        let entry = types
            .get(type_id)
            .ok_or_else(|| self.error(path, &format!("unknown type id `{}`", type_id)))?;

        self.stack.push(type_id.to_string());
        let decoded = self.decode_entry(type_id, entry, path);
        self.stack.pop();
        decoded
    }

    fn decode_entry(
        &mut self,
        type_id: &str,
        entry: &TypeEntry,
        path: &str,
    ) -> Result<TypeDescriptor> {
        let label = entry.label.clone();
        match entry.encoding_for(type_id) {
            Encoding::Mapping => {
                let value_id = entry.value.as_deref().or_else(|| mapping_value_id(type_id));
                let value_id = self.require(value_id, "value", path)?;
                let value = self.decode(value_id, &format!("{}[]", path))?;
                Ok(TypeDescriptor::new(
                    label,
                    TypeKind::Mapping {
                        value: Box::new(value),
                    },
                    Some(StorageSize::Dynamic),
                ))
            }
            Encoding::DynamicArray => {
                let base_id = entry.base.as_deref().or_else(|| array_base_id(type_id));
                let base_id = self.require(base_id, "base", path)?;
                let element = self.decode(base_id, &format!("{}[]", path))?;
                Ok(TypeDescriptor::new(
                    label,
                    TypeKind::DynamicArray {
                        element: Box::new(element),
                    },
                    Some(StorageSize::Dynamic),
                ))
            }
            Encoding::Bytes => {
                let class = if entry.label == "string" {
                    ScalarClass::String
                } else {
                    ScalarClass::Bytes
                };
                Ok(TypeDescriptor::scalar(label, class, StorageSize::Dynamic))
            }
            Encoding::Inplace => self.decode_inplace(type_id, entry, path),
        }
    }

    fn decode_inplace(
        &mut self,
        type_id: &str,
        entry: &TypeEntry,
        path: &str,
    ) -> Result<TypeDescriptor> {
        let label = entry.label.clone();
        let declared = self.declared_size(entry, path)?;

        // Checked before the prefixes: `struct S[2]` and `contract C[3]` are arrays.
        if let Some(length) = fixed_array_length(&label) {
            let base_id = entry.base.as_deref().or_else(|| array_base_id(type_id));
            let base_id = self.require(base_id, "base", path)?;
            let length = length.ok_or_else(|| {
                self.error(path, &format!("cannot read array length from `{}`", label))
            })?;
            let element = self.decode(base_id, &format!("{}[]", path))?;
            return Ok(TypeDescriptor::new(
                label,
                TypeKind::FixedArray {
                    element: Box::new(element),
                    length,
                },
                None,
            ));
        }

        if type_id.starts_with("t_userDefinedValueType(") {
            let size = declared.ok_or_else(|| {
                self.error(
                    path,
                    &format!("user-defined value type `{}` has no numberOfBytes", label),
                )
            })?;
            return Ok(TypeDescriptor::scalar(label, ScalarClass::UserDefined, size));
        }

        if label.starts_with("struct ") {
            let fields = match &entry.members {
                Some(Members::Fields(fields)) => fields,
                _ => return Err(self.error(path, &format!("struct `{}` lists no members", label))),
            };
            let members = fields
                .iter()
                .map(|field| self.variable(field, path))
                .collect::<Result<Vec<_>>>()?;
            return Ok(TypeDescriptor::new(label, TypeKind::Struct { members }, None));
        }

        if label.starts_with("enum ") {
            // Enums of up to 256 variants fit one byte.
            let size = declared.or_else(|| match &entry.members {
                Some(Members::Variants(v)) if v.len() <= 256 => Some(StorageSize::Bytes(1)),
                _ => None,
            });
            return Ok(TypeDescriptor::new(label, TypeKind::Enum, size));
        }

        if label.starts_with("contract ") {
            let size = declared.or(Some(StorageSize::Bytes(20)));
            return Ok(TypeDescriptor::new(label, TypeKind::ContractRef, size));
        }

        if label.starts_with("function ") {
            let fallback = if label.contains(" external") { 24 } else { 8 };
            let size = declared.or(Some(StorageSize::Bytes(fallback)));
            return Ok(TypeDescriptor::new(label, TypeKind::FunctionRef, size));
        }

        let (class, natural) = parse_scalar(&label)
            .ok_or_else(|| self.error(path, &format!("unknown scalar type `{}`", label)))?;
        let size = match natural {
            StorageSize::Dynamic => StorageSize::Dynamic,
            StorageSize::Bytes(_) => declared.unwrap_or(natural),
        };
        Ok(TypeDescriptor::scalar(label, class, size))
    }

    /// `numberOfBytes` as a storage size; `None` when the entry omits it
    fn declared_size(&self, entry: &TypeEntry, path: &str) -> Result<Option<StorageSize>> {
        entry
            .number_of_bytes
            .map(|n| {
                u32::try_from(n).map(StorageSize::Bytes).map_err(|_| {
                    self.error(path, &format!("`{}` declares {} bytes", entry.label, n))
                })
            })
            .transpose()
    }

    fn require<'e>(&self, field: Option<&'e str>, name: &str, path: &str) -> Result<&'e str> {
        field.ok_or_else(|| self.error(path, &format!("type entry is missing `{}`", name)))
    }

    fn error(&self, path: &str, reason: &str) -> ExError {
        invalid_type(self.unit, path, reason)
    }
}

/// `Some(Some(n))` for labels ending in `[n]`, `Some(None)` for a bracket
/// suffix that is not a length, `None` for non-array labels.
fn fixed_array_length(label: &str) -> Option<Option<u64>> {
    let inner = label.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    Some(inner[open + 1..].parse().ok())
}

/// Class and natural size of a primitive type name
pub(crate) fn parse_scalar(label: &str) -> Option<(ScalarClass, StorageSize)> {
    let fixed = |class, bytes| Some((class, StorageSize::Bytes(bytes)));

    match label {
        "bool" => return fixed(ScalarClass::Bool, 1),
        "address" | "address payable" => return fixed(ScalarClass::Address, 20),
        "string" => return Some((ScalarClass::String, StorageSize::Dynamic)),
        "bytes" => return Some((ScalarClass::Bytes, StorageSize::Dynamic)),
        "uint" => return fixed(ScalarClass::Unsigned, 32),
        "int" => return fixed(ScalarClass::Signed, 32),
        "fixed" => return fixed(ScalarClass::Fixed, 16),
        "ufixed" => return fixed(ScalarClass::Ufixed, 16),
        _ => {}
    }

    if let Some(bits) = label.strip_prefix("uint") {
        return integer_width(bits).and_then(|b| fixed(ScalarClass::Unsigned, b));
    }
    if let Some(bits) = label.strip_prefix("int") {
        return integer_width(bits).and_then(|b| fixed(ScalarClass::Signed, b));
    }
    if let Some(n) = label.strip_prefix("bytes") {
        return match n.parse::<u32>() {
            Ok(n) if (1..=32).contains(&n) => fixed(ScalarClass::FixedBytes, n),
            _ => None,
        };
    }
    if let Some(suffix) = label.strip_prefix("ufixed") {
        return fixed_point_width(suffix).and_then(|b| fixed(ScalarClass::Ufixed, b));
    }
    if let Some(suffix) = label.strip_prefix("fixed") {
        return fixed_point_width(suffix).and_then(|b| fixed(ScalarClass::Fixed, b));
    }
    None
}

/// Byte width of an `N` in `uintN`/`intN`: a multiple of 8 in 8..=256
fn integer_width(bits: &str) -> Option<u32> {
    match bits.parse::<u32>() {
        Ok(b) if b % 8 == 0 && (8..=256).contains(&b) => Some(b / 8),
        _ => None,
    }
}

/// Byte width of an `MxN` in `fixedMxN`: `M` as for integers, `N` at most 80
fn fixed_point_width(suffix: &str) -> Option<u32> {
    let (m, n) = suffix.split_once('x')?;
    match n.parse::<u32>() {
        Ok(n) if n <= 80 => integer_width(m),
        _ => None,
    }
}
