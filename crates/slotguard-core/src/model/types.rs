use serde::{Deserialize, Serialize};

use crate::model::variable::Variable;

/// Byte size of a storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageSize {
    /// Fixed number of bytes
    Bytes(u32),
    /// Variable contents behind a single indirection slot
    Dynamic,
}

/// Semantic class of a primitive scalar
///
/// Two scalars of the same width but different class share a bit pattern
/// and differ only in meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarClass {
    Unsigned,
    Signed,
    Address,
    Bool,
    FixedBytes,
    Bytes,
    String,
    Fixed,
    Ufixed,
    /// A user-defined value type; the underlying type is not recorded
    UserDefined,
}

impl ScalarClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarClass::Unsigned => "unsigned integer",
            ScalarClass::Signed => "signed integer",
            ScalarClass::Address => "address",
            ScalarClass::Bool => "bool",
            ScalarClass::FixedBytes => "fixed bytes",
            ScalarClass::Bytes => "bytes",
            ScalarClass::String => "string",
            ScalarClass::Fixed => "fixed-point",
            ScalarClass::Ufixed => "unsigned fixed-point",
            ScalarClass::UserDefined => "user-defined value type",
        }
    }
}

/// Kind of a storage type
///
/// A closed set: the compatibility oracle matches on every variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Scalar { class: ScalarClass },
    FixedArray { element: Box<TypeDescriptor>, length: u64 },
    DynamicArray { element: Box<TypeDescriptor> },
    /// Keys are hashed into the slot address and never stored, so only the
    /// value type is kept.
    Mapping { value: Box<TypeDescriptor> },
    Struct { members: Vec<Variable> },
    Enum,
    ContractRef,
    FunctionRef,
}

impl TypeKind {
    /// Short name used in explanations
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Scalar { .. } => "scalar",
            TypeKind::FixedArray { .. } => "fixed-size array",
            TypeKind::DynamicArray { .. } => "dynamic array",
            TypeKind::Mapping { .. } => "mapping",
            TypeKind::Struct { .. } => "struct",
            TypeKind::Enum => "enum",
            TypeKind::ContractRef => "contract reference",
            TypeKind::FunctionRef => "function reference",
        }
    }
}

/// Description of a storage type
///
/// `label` is for humans only; compatibility is decided from `kind` and
/// `size`. `size` is required for scalars, enums, contract and function
/// references, implied (`Dynamic`) for dynamic arrays and mappings, and
/// derived from the contents for structs and fixed-size arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub label: String,
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<StorageSize>,
}

impl TypeDescriptor {
    pub fn new(label: impl Into<String>, kind: TypeKind, size: Option<StorageSize>) -> Self {
        Self {
            label: label.into(),
            kind,
            size,
        }
    }

    pub fn scalar(label: impl Into<String>, class: ScalarClass, size: StorageSize) -> Self {
        Self::new(label, TypeKind::Scalar { class }, Some(size))
    }

    /// `uintN` for `bits` in 8..=256
    pub fn uint(bits: u32) -> Self {
        Self::scalar(
            format!("uint{}", bits),
            ScalarClass::Unsigned,
            StorageSize::Bytes(bits / 8),
        )
    }

    /// `intN` for `bits` in 8..=256
    pub fn int(bits: u32) -> Self {
        Self::scalar(
            format!("int{}", bits),
            ScalarClass::Signed,
            StorageSize::Bytes(bits / 8),
        )
    }

    pub fn address() -> Self {
        Self::scalar("address", ScalarClass::Address, StorageSize::Bytes(20))
    }

    pub fn boolean() -> Self {
        Self::scalar("bool", ScalarClass::Bool, StorageSize::Bytes(1))
    }

    /// `bytesN` for `n` in 1..=32
    pub fn fixed_bytes(n: u32) -> Self {
        Self::scalar(
            format!("bytes{}", n),
            ScalarClass::FixedBytes,
            StorageSize::Bytes(n),
        )
    }

    pub fn string() -> Self {
        Self::scalar("string", ScalarClass::String, StorageSize::Dynamic)
    }

    pub fn bytes() -> Self {
        Self::scalar("bytes", ScalarClass::Bytes, StorageSize::Dynamic)
    }

    pub fn mapping(key_label: &str, value: TypeDescriptor) -> Self {
        let label = format!("mapping({} => {})", key_label, value.label);
        Self::new(
            label,
            TypeKind::Mapping {
                value: Box::new(value),
            },
            Some(StorageSize::Dynamic),
        )
    }

    pub fn dynamic_array(element: TypeDescriptor) -> Self {
        let label = format!("{}[]", element.label);
        Self::new(
            label,
            TypeKind::DynamicArray {
                element: Box::new(element),
            },
            Some(StorageSize::Dynamic),
        )
    }

    pub fn fixed_array(element: TypeDescriptor, length: u64) -> Self {
        let label = format!("{}[{}]", element.label, length);
        Self::new(
            label,
            TypeKind::FixedArray {
                element: Box::new(element),
                length,
            },
            None,
        )
    }

    pub fn structure(name: &str, members: Vec<Variable>) -> Self {
        Self::new(format!("struct {}", name), TypeKind::Struct { members }, None)
    }

    pub fn enumeration(name: &str, bytes: u32) -> Self {
        Self::new(
            format!("enum {}", name),
            TypeKind::Enum,
            Some(StorageSize::Bytes(bytes)),
        )
    }

    pub fn contract(name: &str) -> Self {
        Self::new(
            format!("contract {}", name),
            TypeKind::ContractRef,
            Some(StorageSize::Bytes(20)),
        )
    }

    /// Internal function pointers take 8 bytes, external ones 24
    /// (address + selector).
    pub fn function(external: bool) -> Self {
        let (label, bytes) = if external {
            ("function external", 24)
        } else {
            ("function internal", 8)
        };
        Self::new(label, TypeKind::FunctionRef, Some(StorageSize::Bytes(bytes)))
    }

    /// True for kinds that always occupy one indirection slot
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::DynamicArray { .. } | TypeKind::Mapping { .. }
        ) || self.size == Some(StorageSize::Dynamic)
    }
}
