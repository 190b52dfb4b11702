//! ABI type classification.
//!
//! [`classify`] maps a type layout to the class that decides how the value
//! travels through a call: which register file it draws from, or whether it
//! is copied and passed by reference. Classification is a pure function of
//! the layout; it never consults or mutates allocation state, so the same
//! descriptor always lands in the same class.

use crate::arch;
use crate::error::{Error, Result};
use crate::layout::{ScalarKind, TypeLayout};

/// How a value is passed at the ABI level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiClass {
    /// Integer scalar in a general-purpose register.
    Integer,
    /// Floating-point scalar in a floating-point register.
    Float,
    /// Address in a general-purpose register.
    Pointer,
    /// Aggregate of at most one word, passed in one general-purpose register.
    StructRegister,
    /// Single-float aggregate, passed in one floating-point register.
    StructSfa,
    /// Aggregate passed by pointer to a copy.
    StructReference,
}

/// Classify a layout descriptor.
///
/// Scalars resolve by carrier kind. Aggregates over one word, or of an
/// irregular size, go by reference; the rest flatten to scalar leaves to
/// distinguish the single-float case from everything else.
pub fn classify(layout: &TypeLayout) -> Result<AbiClass> {
    match layout {
        TypeLayout::Scalar { kind, .. } => Ok(scalar_class(*kind)),
        TypeLayout::Group { size, .. } => classify_aggregate(layout, *size),
        TypeLayout::Sequence { .. } => classify_aggregate(layout, layout.byte_size()),
    }
}

const fn scalar_class(kind: ScalarKind) -> AbiClass {
    match kind {
        ScalarKind::Integer => AbiClass::Integer,
        ScalarKind::Float => AbiClass::Float,
        ScalarKind::Pointer => AbiClass::Pointer,
    }
}

fn classify_aggregate(layout: &TypeLayout, size: u32) -> Result<AbiClass> {
    if !arch::register_eligible(size) {
        return Ok(AbiClass::StructReference);
    }

    let mut leaves = Vec::new();
    flatten(layout, 0, &mut leaves)?;

    // Exactly one leaf, and it is a float: the aggregate rides in a
    // floating-point register. Zero leaves and multi-leaf aggregates both
    // take the general-purpose path.
    if let [ScalarKind::Float] = leaves.as_slice() {
        Ok(AbiClass::StructSfa)
    } else {
        Ok(AbiClass::StructRegister)
    }
}

/// Collect the scalar leaves of a layout tree in declaration order.
///
/// Padding members are scalars and are collected like any other leaf. The
/// recursion is depth-bounded so pathological nesting fails cleanly.
fn flatten(layout: &TypeLayout, depth: usize, leaves: &mut Vec<ScalarKind>) -> Result<()> {
    if depth > arch::MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep(arch::MAX_NESTING_DEPTH));
    }
    match layout {
        TypeLayout::Scalar { kind, .. } => {
            leaves.push(*kind);
            Ok(())
        }
        TypeLayout::Group { members, .. } => {
            for member in members {
                flatten(member, depth + 1, leaves)?;
            }
            Ok(())
        }
        TypeLayout::Sequence { element, count } => {
            for _ in 0..*count {
                flatten(element, depth + 1, leaves)?;
            }
            Ok(())
        }
    }
}
