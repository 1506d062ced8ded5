//! Slot Layout Resolver.
//!
//! Assigns every variable of a [`Layout`] its storage slot and byte offset
//! using the fixed packing rules of the target VM:
//!
//! - value types pack left to right into 32-byte slots and never straddle a
//!   slot boundary;
//! - mappings, dynamic arrays and dynamically sized scalars take one whole
//!   slot of their own;
//! - structs and fixed-size arrays start on a fresh slot, and whatever follows
//!   them starts on a fresh slot too.
//!
//! The resolved numbers are the ground truth compared across versions, so
//! they must match the compiler exactly.

use crate::errors::{LayoutError, Result};
use crate::model::{Layout, PositionedVariable, StorageSize, TypeDescriptor, TypeKind, Variable};

/// Width of one storage slot in bytes
pub const SLOT_WIDTH: u32 = 32;

/// How much storage a type occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footprint {
    /// A value type of the given byte width, packable with its neighbours
    Packed(u32),
    /// One indirection slot (mapping, dynamic array, string, bytes)
    WholeSlot,
    /// A run of whole slots starting on a fresh boundary (struct, fixed array)
    Slots(u64),
}

impl Footprint {
    /// Number of slots the footprint spans when placed at offset 0
    pub fn slots(&self) -> u64 {
        match self {
            Footprint::Packed(_) | Footprint::WholeSlot => 1,
            Footprint::Slots(n) => *n,
        }
    }
}

/// Result of laying out one variable list
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub variables: Vec<PositionedVariable>,
    /// Slots touched, counting a partially filled last slot
    pub slots: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Cursor {
    slot: u64,
    offset: u32,
}

impl Cursor {
    fn next_slot(&mut self, path: &str) -> Result<()> {
        self.slot = self
            .slot
            .checked_add(1)
            .ok_or_else(|| overflow(path))?;
        self.offset = 0;
        Ok(())
    }

    fn align(&mut self, path: &str) -> Result<()> {
        if self.offset > 0 {
            self.next_slot(path)?;
        }
        Ok(())
    }

    fn skip_slots(&mut self, n: u64, path: &str) -> Result<()> {
        self.slot = self.slot.checked_add(n).ok_or_else(|| overflow(path))?;
        self.offset = 0;
        Ok(())
    }

    fn slots_used(&self) -> u64 {
        if self.offset > 0 {
            self.slot + 1
        } else {
            self.slot
        }
    }
}

fn overflow(path: &str) -> LayoutError {
    LayoutError::SlotOverflow {
        variable: path.to_string(),
    }
}

pub(crate) fn join_path(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

pub(crate) fn element_path(path: &str) -> String {
    format!("{}[]", path)
}

/// Resolve every variable of `layout` to its storage position.
///
/// # Errors
///
/// Returns a [`LayoutError`] naming the first variable whose type cannot be
/// interpreted as storage (missing or invalid size, empty struct,
/// zero-length array).
pub fn resolve(layout: &Layout) -> Result<Vec<PositionedVariable>> {
    Ok(resolve_in_scope(layout.variables(), "")?.variables)
}

/// Lay out `variables` from slot 0. `scope` prefixes variable paths in errors.
pub(crate) fn resolve_in_scope(variables: &[Variable], scope: &str) -> Result<Resolved> {
    let mut cursor = Cursor::default();
    let mut placed = Vec::with_capacity(variables.len());

    for (index, variable) in variables.iter().enumerate() {
        let path = join_path(scope, &variable.name);

        if let Some(hint) = variable.slot_hint {
            if hint.offset >= SLOT_WIDTH {
                return Err(LayoutError::InvalidSlotHint {
                    variable: path,
                    offset: hint.offset,
                    slot_width: SLOT_WIDTH,
                });
            }
            cursor = Cursor {
                slot: hint.slot,
                offset: hint.offset,
            };
        }

        let (slot, offset, width) = match footprint(&variable.ty, &path)? {
            Footprint::Packed(width) => {
                if cursor.offset + width > SLOT_WIDTH {
                    cursor.next_slot(&path)?;
                }
                let at = (cursor.slot, cursor.offset, width as u64);
                cursor.offset += width;
                if cursor.offset == SLOT_WIDTH {
                    cursor.next_slot(&path)?;
                }
                at
            }
            Footprint::WholeSlot => {
                cursor.align(&path)?;
                let at = (cursor.slot, 0, SLOT_WIDTH as u64);
                cursor.skip_slots(1, &path)?;
                at
            }
            Footprint::Slots(n) => {
                cursor.align(&path)?;
                let width = n
                    .checked_mul(SLOT_WIDTH as u64)
                    .ok_or_else(|| overflow(&path))?;
                let at = (cursor.slot, 0, width);
                cursor.skip_slots(n, &path)?;
                at
            }
        };

        tracing::trace!(variable = %path, slot, offset, width, "placed");
        placed.push(PositionedVariable {
            index,
            variable: variable.clone(),
            slot,
            offset,
            width,
        });
    }

    Ok(Resolved {
        variables: placed,
        slots: cursor.slots_used(),
    })
}

/// Compute (and validate) the storage footprint of a type.
///
/// Validation is recursive: element, value and member types are checked
/// even though a mapping or dynamic array always takes a single slot.
///
/// # Errors
///
/// Returns a [`LayoutError`] for the first malformed type found, with `path`
/// extended to the offending nested variable.
pub fn footprint(ty: &TypeDescriptor, path: &str) -> Result<Footprint> {
    match &ty.kind {
        TypeKind::Mapping { value } => {
            footprint(value, &element_path(path))?;
            Ok(Footprint::WholeSlot)
        }
        TypeKind::DynamicArray { element } => {
            footprint(element, &element_path(path))?;
            Ok(Footprint::WholeSlot)
        }
        TypeKind::Scalar { .. } if ty.size == Some(StorageSize::Dynamic) => {
            Ok(Footprint::WholeSlot)
        }
        TypeKind::Scalar { .. }
        | TypeKind::Enum
        | TypeKind::ContractRef
        | TypeKind::FunctionRef => packed_width(ty, path).map(Footprint::Packed),
        TypeKind::FixedArray { element, length } => {
            if *length == 0 {
                return Err(LayoutError::ZeroLengthArray {
                    variable: path.to_string(),
                    label: ty.label.clone(),
                });
            }
            let slots = match footprint(element, &element_path(path))? {
                Footprint::Packed(width) => {
                    let per_slot = (SLOT_WIDTH / width) as u64;
                    length.div_ceil(per_slot)
                }
                Footprint::WholeSlot => *length,
                Footprint::Slots(n) => length.checked_mul(n).ok_or_else(|| overflow(path))?,
            };
            Ok(Footprint::Slots(slots))
        }
        TypeKind::Struct { members } => {
            if members.is_empty() {
                return Err(LayoutError::EmptyStruct {
                    variable: path.to_string(),
                    label: ty.label.clone(),
                });
            }
            let resolved = resolve_in_scope(members, path)?;
            Ok(Footprint::Slots(resolved.slots))
        }
    }
}

fn packed_width(ty: &TypeDescriptor, path: &str) -> Result<u32> {
    match ty.size {
        None => Err(LayoutError::MissingSize {
            variable: path.to_string(),
            label: ty.label.clone(),
        }),
        Some(StorageSize::Dynamic) => Err(LayoutError::UnexpectedDynamicSize {
            variable: path.to_string(),
            label: ty.label.clone(),
        }),
        Some(StorageSize::Bytes(0)) => Err(LayoutError::ZeroSize {
            variable: path.to_string(),
            label: ty.label.clone(),
        }),
        Some(StorageSize::Bytes(width)) if width > SLOT_WIDTH => Err(LayoutError::OversizedValue {
            variable: path.to_string(),
            label: ty.label.clone(),
            width,
            slot_width: SLOT_WIDTH,
        }),
        Some(StorageSize::Bytes(width)) => Ok(width),
    }
}
