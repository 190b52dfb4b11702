//! Storage calculation: handing out registers and stack slots.
//!
//! A [`StorageCalculator`] is built fresh for one side of one arrangement
//! (argument side or return side), consumed while walking the signature, and
//! discarded. It owns the only mutable state in the crate: two register
//! counters and a bump offset into the stack argument area.

use crate::arch;

/// Which register file a location lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterKind {
    General,
    Float,
}

/// One issued storage location. Locations are issued once and never reused
/// within a calculator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageLocation {
    Register {
        kind: RegisterKind,
        /// Index within the register file, counted from the first
        /// argument/return register of that file.
        index: u8,
        /// View width in bytes; sub-word values use a narrowed view of the
        /// full register.
        size: u32,
    },
    Stack {
        /// Byte offset of the value from the start of the stack argument
        /// area, sub-slot placement already applied.
        offset: u32,
        size: u32,
    },
}

/// Single-use register/stack allocator for one side of a call.
#[derive(Debug)]
pub struct StorageCalculator {
    int_limit: u8,
    float_limit: u8,
    int_used: u8,
    float_used: u8,
    stack_offset: u32,
}

impl StorageCalculator {
    /// Calculator drawing from the argument-side register pools.
    #[must_use]
    pub const fn for_arguments() -> Self {
        Self::with_limits(arch::INT_ARGUMENT_REGS, arch::FLOAT_ARGUMENT_REGS)
    }

    /// Calculator drawing from the return-side register pools.
    #[must_use]
    pub const fn for_return() -> Self {
        Self::with_limits(arch::INT_RETURN_REGS, arch::FLOAT_RETURN_REGS)
    }

    const fn with_limits(int_limit: u8, float_limit: u8) -> Self {
        Self {
            int_limit,
            float_limit,
            int_used: 0,
            float_used: 0,
            stack_offset: 0,
        }
    }

    /// Allocate storage for a `size`-byte value in the given register file,
    /// falling back to the stack once the file is exhausted.
    ///
    /// The two register counters are independent: consuming a
    /// general-purpose register never affects floating-point capacity. Stack
    /// fallback always succeeds; a narrow value still consumes a full
    /// aligned slot, sitting at the byte-order-determined sub-offset.
    pub fn allocate(&mut self, kind: RegisterKind, size: u32) -> StorageLocation {
        let (used, limit) = match kind {
            RegisterKind::General => (&mut self.int_used, self.int_limit),
            RegisterKind::Float => (&mut self.float_used, self.float_limit),
        };
        if *used < limit {
            let index = *used;
            *used += 1;
            tracing::trace!(?kind, index, size, "issued register");
            return StorageLocation::Register { kind, index, size };
        }

        let slot = self.reserve(arch::STACK_SLOT_SIZE, arch::STACK_SLOT_ALIGN);
        StorageLocation::Stack {
            offset: slot + arch::slot_sub_offset(size),
            size,
        }
    }

    /// Reserve `size` bytes of stack at the requested alignment.
    /// `align` must be a non-zero power of two.
    ///
    /// Offsets are monotonically non-decreasing and issued ranges never
    /// overlap for the lifetime of the calculator.
    pub fn allocate_stack(&mut self, size: u32, align: u32) -> StorageLocation {
        let offset = self.reserve(size, align);
        StorageLocation::Stack { offset, size }
    }

    fn reserve(&mut self, size: u32, align: u32) -> u32 {
        let offset = self.stack_offset.next_multiple_of(align);
        self.stack_offset = offset + size;
        tracing::trace!(offset, size, align, "reserved stack range");
        offset
    }

    /// General-purpose registers issued so far.
    #[must_use]
    pub const fn general_used(&self) -> u8 {
        self.int_used
    }

    /// Floating-point registers issued so far.
    #[must_use]
    pub const fn float_used(&self) -> u8 {
        self.float_used
    }

    /// Total bytes of stack argument area consumed so far.
    #[must_use]
    pub const fn stack_bytes(&self) -> u32 {
        self.stack_offset
    }
}
