//! Binding recipes: the primitive steps moving one value between its
//! generic boxed representation and its assigned storage.
//!
//! Recipes are interpreted against a small operand stack by the stub
//! generator. Each step documents its stack effect; a recipe for one value
//! starts with that value on top of the stack (unbox) or ends with it there
//! (box).

use crate::arch;
use crate::classify::AbiClass;
use crate::error::{Error, Result};
use crate::layout::TypeLayout;
use crate::storage::{RegisterKind, StorageCalculator, StorageLocation};

/// One primitive step of a binding recipe.
///
/// Each variant maps 1:1 to an operation the stub generator knows how to
/// emit. This keeps the arranger decoupled from any concrete instruction
/// set and makes recipes directly inspectable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeStep {
    /// Pop a value and place it in `location`.
    MoveToStorage { location: StorageLocation },
    /// Push the value held in `location`.
    MoveFromStorage { location: StorageLocation },
    /// Pop a buffer address, push `size` bytes read at byte `offset`.
    BufferLoad { offset: u32, size: u32 },
    /// Pop a value, then a buffer address, and write the value's low `size`
    /// bytes at byte `offset`.
    BufferStore { offset: u32, size: u32 },
    /// Push the address of a fresh scratch buffer of `size`/`align` bytes.
    AllocateBuffer { size: u32, align: u32 },
    /// Pop a source buffer address, allocate a scratch buffer of
    /// `size`/`align`, copy `size` bytes into it, push the scratch address.
    CopyBuffer { size: u32, align: u32 },
    /// Duplicate the top of the stack.
    Dup,
    /// Pop a boxed reference, push its raw native address. With
    /// `as_base_offset` the address is pushed as a (base, byte offset) pair
    /// instead, letting the stub address movable heap storage.
    UnboxAddress { as_base_offset: bool },
    /// Pop a raw native address, push a boxed reference. `target` carries
    /// the referenced layout's size and alignment when known; `None` boxes
    /// an opaque address.
    BoxAddress { target: Option<(u32, u32)> },
}

/// One value's complete binding: its layout, its ABI class, and the ordered
/// recipe moving it between representation and storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    pub layout: TypeLayout,
    pub class: AbiClass,
    pub recipe: Vec<RecipeStep>,
}

/// A direction-specific binding calculator.
///
/// The two implementations mirror each other: [`UnboxStrategy`] unpacks
/// outgoing values into storage, [`BoxStrategy`] packs incoming storage into
/// values. Keeping them behind one trait lets the arranger dispatch on
/// class exactly once per value, whichever way the data flows.
pub trait BindingStrategy {
    /// Strategy name for diagnostics.
    fn name(&self) -> &'static str;

    /// Compute the recipe for one classified value, drawing storage from
    /// `storage`. `variadic` marks trailing variadic parameters, which never
    /// draw floating-point registers on the modeled architecture.
    fn bindings_for(
        &self,
        class: AbiClass,
        layout: &TypeLayout,
        storage: &mut StorageCalculator,
        variadic: bool,
    ) -> Result<Vec<RecipeStep>>;
}

/// Outgoing direction: generic boxed value → assigned storage.
#[derive(Debug, Clone, Copy)]
pub struct UnboxStrategy {
    pub allow_heap_addressing: bool,
}

/// Incoming direction: assigned storage → generic boxed value.
///
/// Heap addressing is an unbox-side concern (only outgoing values live in
/// movable storage), so this strategy carries no options.
#[derive(Debug, Clone, Copy)]
pub struct BoxStrategy;

/// Register file for a class, with the variadic reroute applied.
fn register_kind(class: AbiClass, variadic: bool) -> RegisterKind {
    match class {
        AbiClass::Float | AbiClass::StructSfa if !variadic => RegisterKind::Float,
        _ => RegisterKind::General,
    }
}

/// Register view width for a register-class aggregate.
///
/// A single-float aggregate moves exactly its float member, even when the
/// group carries trailing padding; other register aggregates move their full
/// size rounded up to the next eligible width.
fn view_width(class: AbiClass, layout: &TypeLayout) -> u32 {
    if class == AbiClass::StructSfa {
        first_scalar_size(layout)
    } else {
        arch::round_to_eligible(layout.byte_size())
    }
}

/// Size of the first scalar leaf. Classification guarantees a single-float
/// aggregate has exactly one leaf, so this is the float member's size.
fn first_scalar_size(layout: &TypeLayout) -> u32 {
    match layout {
        TypeLayout::Scalar { size, .. } => *size,
        TypeLayout::Group { members, .. } => members.first().map_or(0, first_scalar_size),
        TypeLayout::Sequence { element, .. } => first_scalar_size(element),
    }
}

impl BindingStrategy for UnboxStrategy {
    fn name(&self) -> &'static str {
        "unbox"
    }

    fn bindings_for(
        &self,
        class: AbiClass,
        layout: &TypeLayout,
        storage: &mut StorageCalculator,
        variadic: bool,
    ) -> Result<Vec<RecipeStep>> {
        let size = layout.byte_size();
        let kind = register_kind(class, variadic);
        let steps = match class {
            AbiClass::Integer | AbiClass::Float => {
                vec![RecipeStep::MoveToStorage {
                    location: storage.allocate(kind, size),
                }]
            }
            AbiClass::Pointer => vec![
                RecipeStep::UnboxAddress {
                    as_base_offset: self.allow_heap_addressing,
                },
                RecipeStep::MoveToStorage {
                    location: storage.allocate(kind, arch::WORD_SIZE),
                },
            ],
            AbiClass::StructRegister | AbiClass::StructSfa => {
                let width = view_width(class, layout);
                vec![
                    RecipeStep::BufferLoad {
                        offset: 0,
                        size: width,
                    },
                    RecipeStep::MoveToStorage {
                        location: storage.allocate(kind, width),
                    },
                ]
            }
            AbiClass::StructReference => {
                if variadic {
                    return Err(variadic_reference_error(layout));
                }
                vec![
                    RecipeStep::CopyBuffer {
                        size,
                        align: layout.alignment(),
                    },
                    RecipeStep::UnboxAddress {
                        as_base_offset: false,
                    },
                    RecipeStep::MoveToStorage {
                        location: storage.allocate(RegisterKind::General, arch::WORD_SIZE),
                    },
                ]
            }
        };
        Ok(steps)
    }
}

impl BindingStrategy for BoxStrategy {
    fn name(&self) -> &'static str {
        "box"
    }

    fn bindings_for(
        &self,
        class: AbiClass,
        layout: &TypeLayout,
        storage: &mut StorageCalculator,
        variadic: bool,
    ) -> Result<Vec<RecipeStep>> {
        let size = layout.byte_size();
        let kind = register_kind(class, variadic);
        let steps = match class {
            AbiClass::Integer | AbiClass::Float => {
                vec![RecipeStep::MoveFromStorage {
                    location: storage.allocate(kind, size),
                }]
            }
            AbiClass::Pointer => vec![
                RecipeStep::MoveFromStorage {
                    location: storage.allocate(kind, arch::WORD_SIZE),
                },
                RecipeStep::BoxAddress { target: None },
            ],
            AbiClass::StructRegister | AbiClass::StructSfa => {
                let width = view_width(class, layout);
                vec![
                    RecipeStep::AllocateBuffer {
                        size,
                        align: layout.alignment(),
                    },
                    RecipeStep::Dup,
                    RecipeStep::MoveFromStorage {
                        location: storage.allocate(kind, width),
                    },
                    RecipeStep::BufferStore {
                        offset: 0,
                        size: width,
                    },
                ]
            }
            AbiClass::StructReference => {
                if variadic {
                    return Err(variadic_reference_error(layout));
                }
                // No copy on the incoming side: the reference borrows the
                // received address, and its lifetime is the caller's
                // responsibility.
                vec![
                    RecipeStep::MoveFromStorage {
                        location: storage.allocate(RegisterKind::General, arch::WORD_SIZE),
                    },
                    RecipeStep::BoxAddress {
                        target: Some((size, layout.alignment())),
                    },
                ]
            }
        };
        Ok(steps)
    }
}

fn variadic_reference_error(layout: &TypeLayout) -> Error {
    Error::UnsupportedVariadic(format!(
        "{}-byte aggregate passed by reference in a variadic position",
        layout.byte_size()
    ))
}
