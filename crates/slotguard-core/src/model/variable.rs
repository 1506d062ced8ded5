use serde::{Deserialize, Serialize};

use crate::model::types::TypeDescriptor;

/// Manually assigned storage position for a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotHint {
    pub slot: u64,
    #[serde(default)]
    pub offset: u32,
}

/// A named storage slot occupant
///
/// The name is only used for reporting; two variables at the same position
/// with compatible types are the same storage regardless of name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_hint: Option<SlotHint>,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            slot_hint: None,
        }
    }

    /// Pin the variable to a manually assigned slot/offset
    pub fn with_slot_hint(mut self, slot: u64, offset: u32) -> Self {
        self.slot_hint = Some(SlotHint { slot, offset });
        self
    }
}

/// One version of one storage-owning unit, in declaration order
///
/// The order is the on-chain declaration order and is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    variables: Vec<Variable>,
}

impl Layout {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self { variables }
    }

    pub fn push(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }
}

impl From<Vec<Variable>> for Layout {
    fn from(variables: Vec<Variable>) -> Self {
        Self::new(variables)
    }
}

impl FromIterator<Variable> for Layout {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A variable with its resolved storage position
///
/// `width` is the number of bytes the variable occupies starting at
/// (`slot`, `offset`); whole-slot and multi-slot values report a multiple of
/// the slot width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedVariable {
    pub index: usize,
    pub variable: Variable,
    pub slot: u64,
    pub offset: u32,
    pub width: u64,
}

impl PositionedVariable {
    pub fn name(&self) -> &str {
        &self.variable.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.variable.ty
    }

    pub fn position(&self) -> (u64, u32) {
        (self.slot, self.offset)
    }

    /// Absolute byte range `[start, end)` in storage
    pub fn byte_range(&self, slot_width: u32) -> (u128, u128) {
        let start = self.slot as u128 * slot_width as u128 + self.offset as u128;
        (start, start + self.width as u128)
    }

    pub fn overlaps(&self, other: &PositionedVariable, slot_width: u32) -> bool {
        let (a_start, a_end) = self.byte_range(slot_width);
        let (b_start, b_end) = other.byte_range(slot_width);
        a_start < b_end && b_start < a_end
    }
}
