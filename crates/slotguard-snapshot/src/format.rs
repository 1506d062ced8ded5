//! Snapshot format schema
//!
//! Defines the JSON structure of one unit's storage layout as emitted by the
//! compiler (`storageLayout` output): a list of storage entries plus a table
//! of type entries they refer to by id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage layout of one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStorage {
    /// Variables in declaration order
    pub storage: Vec<StorageEntry>,

    /// Type table keyed by type id (`t_uint256`, `t_struct(Pos)12_storage`, ...)
    #[serde(default)]
    pub types: BTreeMap<String, TypeEntry>,
}

/// One declared variable (or struct member)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub label: String,

    /// Declared slot, as a decimal string or a number
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub slot: Option<u64>,

    /// Declared byte offset within the slot
    #[serde(default)]
    pub offset: u32,

    /// Id of the entry in the type table
    #[serde(rename = "type")]
    pub type_id: String,
}

/// How a type is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Inplace,
    Mapping,
    DynamicArray,
    /// `string` and `bytes`
    Bytes,
}

impl Encoding {
    /// Encoding implied by a compiler type id, for type tables that omit
    /// the `encoding` field
    pub fn from_type_id(type_id: &str) -> Self {
        if type_id.starts_with("t_mapping(") {
            Encoding::Mapping
        } else if type_id.starts_with("t_array(") && type_id.ends_with("dyn_storage") {
            Encoding::DynamicArray
        } else if type_id.starts_with("t_string")
            || type_id == "t_bytes"
            || type_id.starts_with("t_bytes_")
        {
            Encoding::Bytes
        } else {
            Encoding::Inplace
        }
    }
}

/// Value type id of a mapping type id: `t_mapping(K,V)` -> `V`
pub(crate) fn mapping_value_id(type_id: &str) -> Option<&str> {
    let args = type_id.strip_prefix("t_mapping(")?.strip_suffix(')')?;
    let comma = top_level_comma(args)?;
    Some(&args[comma + 1..])
}

/// Element type id of an array type id: `t_array(B)3_storage` -> `B`
pub(crate) fn array_base_id(type_id: &str) -> Option<&str> {
    let rest = type_id.strip_prefix("t_array(")?;
    let close = matching_paren(rest)?;
    Some(&rest[..close])
}

fn top_level_comma(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Index of the `)` closing a group whose `(` was just consumed
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Member list of a struct or enum type entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Members {
    /// Struct members, laid out like top-level storage
    Fields(Vec<StorageEntry>),
    /// Enum variant names
    Variants(Vec<String>),
}

/// One entry of the type table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Omitted by some layout extractors; see [`TypeEntry::encoding_for`]
    #[serde(default)]
    pub encoding: Option<Encoding>,

    /// Source-level type name; drives kind detection for in-place types
    pub label: String,

    #[serde(
        rename = "numberOfBytes",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub number_of_bytes: Option<u64>,

    /// Element type id of an array
    #[serde(default)]
    pub base: Option<String>,

    /// Key type id of a mapping (not part of the layout)
    #[serde(default)]
    pub key: Option<String>,

    /// Value type id of a mapping
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub members: Option<Members>,
}

impl TypeEntry {
    /// Declared encoding, or the one implied by `type_id`
    pub fn encoding_for(&self, type_id: &str) -> Encoding {
        self.encoding.unwrap_or_else(|| Encoding::from_type_id(type_id))
    }
}

/// Accept a non-negative integer written either as a JSON number or as a
/// decimal string, the way compilers emit slot numbers and sizes.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Option<u64>, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Option<u64>, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
        }

        fn visit_str<E>(self, value: &str) -> Result<Option<u64>, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_unit<E>(self) -> Result<Option<u64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(DecimalVisitor)
}
