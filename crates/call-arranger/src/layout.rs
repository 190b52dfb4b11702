//! Type layout descriptors consumed by the arranger.
//!
//! A [`TypeLayout`] is a self-contained description of a value's memory
//! shape: a scalar carrier, a group of ordered members, or a repeated
//! element. Descriptors come from the memory-layout subsystem and are
//! treated as immutable values here; the arranger only reads sizes,
//! alignments, and member structure. Hashability makes descriptors usable
//! as cache keys.

use crate::arch;
use crate::error::{Error, Result};

/// What a scalar carries, which decides its register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Float,
    Pointer,
}

/// Memory shape of one value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeLayout {
    Scalar {
        size: u32,
        align: u32,
        kind: ScalarKind,
    },
    Group {
        size: u32,
        align: u32,
        members: Vec<TypeLayout>,
    },
    Sequence {
        element: Box<TypeLayout>,
        count: u32,
    },
}

impl TypeLayout {
    /// Total size in bytes, padding included.
    #[must_use]
    pub fn byte_size(&self) -> u32 {
        match self {
            Self::Scalar { size, .. } | Self::Group { size, .. } => *size,
            Self::Sequence { element, count } => element.byte_size() * count,
        }
    }

    /// Required alignment in bytes.
    #[must_use]
    pub fn alignment(&self) -> u32 {
        match self {
            Self::Scalar { align, .. } | Self::Group { align, .. } => *align,
            Self::Sequence { element, .. } => element.alignment(),
        }
    }

    /// Check that a descriptor is well-formed before arrangement.
    ///
    /// Malformed descriptors are a fatal configuration error: the scalar
    /// carrier table is fixed, alignments must be non-zero powers of two,
    /// and nesting beyond [`arch::MAX_NESTING_DEPTH`] is rejected instead of
    /// recursed into.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(0)
    }

    fn validate_at(&self, depth: usize) -> Result<()> {
        if depth > arch::MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep(arch::MAX_NESTING_DEPTH));
        }
        match self {
            Self::Scalar { size, align, kind } => {
                let size_ok = match kind {
                    ScalarKind::Integer => matches!(size, 1 | 2 | 4 | 8),
                    ScalarKind::Float => matches!(size, 4 | 8),
                    ScalarKind::Pointer => *size == arch::WORD_SIZE,
                };
                if !size_ok {
                    return Err(Error::InvalidLayout(format!(
                        "no {kind:?} carrier of {size} bytes"
                    )));
                }
                check_alignment(*align)
            }
            Self::Group {
                size,
                align,
                members,
            } => {
                check_alignment(*align)?;
                // Members validate before their sizes are read, so the size
                // arithmetic below never sees an unchecked subtree.
                let mut content = 0u32;
                for member in members {
                    member.validate_at(depth + 1)?;
                    content = content.checked_add(member.byte_size()).ok_or_else(|| {
                        Error::InvalidLayout("group size overflows the address space".into())
                    })?;
                }
                if content > *size {
                    return Err(Error::InvalidLayout(format!(
                        "group of {size} bytes holds {content} bytes of members"
                    )));
                }
                Ok(())
            }
            Self::Sequence { element, count } => {
                element.validate_at(depth + 1)?;
                element.byte_size().checked_mul(*count).ok_or_else(|| {
                    Error::InvalidLayout(format!(
                        "sequence of {count} elements overflows the address space"
                    ))
                })?;
                Ok(())
            }
        }
    }

    // ── Constructors for common carriers ──

    #[must_use]
    pub const fn int8() -> Self {
        Self::Scalar {
            size: 1,
            align: 1,
            kind: ScalarKind::Integer,
        }
    }

    #[must_use]
    pub const fn int16() -> Self {
        Self::Scalar {
            size: 2,
            align: 2,
            kind: ScalarKind::Integer,
        }
    }

    #[must_use]
    pub const fn int32() -> Self {
        Self::Scalar {
            size: 4,
            align: 4,
            kind: ScalarKind::Integer,
        }
    }

    #[must_use]
    pub const fn int64() -> Self {
        Self::Scalar {
            size: 8,
            align: 8,
            kind: ScalarKind::Integer,
        }
    }

    #[must_use]
    pub const fn float32() -> Self {
        Self::Scalar {
            size: 4,
            align: 4,
            kind: ScalarKind::Float,
        }
    }

    #[must_use]
    pub const fn float64() -> Self {
        Self::Scalar {
            size: 8,
            align: 8,
            kind: ScalarKind::Float,
        }
    }

    #[must_use]
    pub const fn pointer() -> Self {
        Self::Scalar {
            size: arch::WORD_SIZE,
            align: arch::WORD_SIZE,
            kind: ScalarKind::Pointer,
        }
    }

    /// A one-byte padding member for explicit struct padding.
    #[must_use]
    pub const fn padding_byte() -> Self {
        Self::int8()
    }

    /// Build a group from ordered members, computing natural size/alignment
    /// (members laid end to end, padding expected to appear as explicit
    /// members, overall size rounded up to the alignment).
    #[must_use]
    pub fn group_of(members: Vec<TypeLayout>) -> Self {
        let align = members.iter().map(TypeLayout::alignment).max().unwrap_or(1);
        let content: u32 = members.iter().map(TypeLayout::byte_size).sum();
        let size = content.next_multiple_of(align);
        Self::Group {
            size,
            align,
            members,
        }
    }

    #[must_use]
    pub fn sequence_of(element: TypeLayout, count: u32) -> Self {
        Self::Sequence {
            element: Box::new(element),
            count,
        }
    }
}

fn check_alignment(align: u32) -> Result<()> {
    if align == 0 || !align.is_power_of_two() {
        return Err(Error::InvalidLayout(format!(
            "alignment {align} is not a power of two"
        )));
    }
    Ok(())
}
