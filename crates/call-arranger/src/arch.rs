//! Modeled architecture constants (registers, widths, byte order).
//!
//! This module centralizes everything the arranger knows about the target
//! ABI so the classifier, storage calculator, and tests agree on one
//! description. The modeled architecture is a little-endian 64-bit machine
//! with separate general-purpose and floating-point argument register files.

// ── Machine widths ──

/// Machine word size in bytes. Aggregates up to one word may travel in a
/// single general-purpose register.
pub const WORD_SIZE: u32 = 8;

/// Size of one stack argument slot in bytes. Every stack-passed value
/// consumes at least one full slot, sub-word values included.
pub const STACK_SLOT_SIZE: u32 = 8;

/// Alignment of the stack argument area.
pub const STACK_SLOT_ALIGN: u32 = 8;

// ── Argument-side register budgets ──

/// Number of general-purpose registers available for arguments.
pub const INT_ARGUMENT_REGS: u8 = 5;

/// Number of floating-point registers available for arguments.
pub const FLOAT_ARGUMENT_REGS: u8 = 4;

// ── Return-side register budgets ──
//
// The return side draws from its own pool; consuming an argument register
// never affects return placement and vice versa.

/// Number of general-purpose registers available for return values.
pub const INT_RETURN_REGS: u8 = 2;

/// Number of floating-point registers available for return values.
pub const FLOAT_RETURN_REGS: u8 = 2;

// ── Aggregate eligibility ──

/// Whether an aggregate of `size` bytes may be passed in a single register.
///
/// Sizes over one word and the irregular sizes 3, 5, 6, and 7 must go by
/// reference; everything else (0, 1, 2, 4, 8) rides in a register.
#[must_use]
pub const fn register_eligible(size: u32) -> bool {
    size <= WORD_SIZE && !matches!(size, 3 | 5 | 6 | 7)
}

/// Round `size` up to the next register-eligible width.
///
/// Used when a sub-word aggregate occupies a register view: a 2-byte struct
/// moves through a 2-byte view, but a register copy of its buffer reads the
/// eligible width, never 3/5/6/7 bytes.
#[must_use]
pub const fn round_to_eligible(size: u32) -> u32 {
    match size {
        0..=1 => size,
        2 => 2,
        3..=4 => 4,
        _ => 8,
    }
}

// ── Byte order ──

/// Byte order of the modeled architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

pub const BYTE_ORDER: ByteOrder = ByteOrder::Little;

/// Byte offset of a `size`-byte value inside its full stack slot.
///
/// Little-endian machines keep narrow values at the base of the slot;
/// big-endian machines push them to the high end. The slot itself is always
/// reserved in full.
#[must_use]
pub const fn slot_sub_offset(size: u32) -> u32 {
    match BYTE_ORDER {
        ByteOrder::Little => 0,
        ByteOrder::Big => STACK_SLOT_SIZE - size,
    }
}

/// Bound on layout tree nesting accepted by the classifier. Deeper trees are
/// rejected rather than recursed into, keeping failure modes predictable.
pub const MAX_NESTING_DEPTH: usize = 32;
