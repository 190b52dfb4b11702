//! Whole-signature arrangement.
//!
//! [`arrange`] walks a function signature once and produces the immutable
//! [`CallingSequence`] the stub generator consumes: per-argument and
//! per-return binding recipes plus the in-memory-return flag. The return
//! value is placed first, because an in-memory return injects a hidden
//! leading pointer argument that shifts every real argument by one
//! general-purpose register.

use crate::binding::{BindingStrategy, BoxStrategy, ParameterBinding, UnboxStrategy};
use crate::classify::{AbiClass, classify};
use crate::error::{Error, Result};
use crate::layout::TypeLayout;
use crate::storage::StorageCalculator;

/// Which way data crosses the language boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Managed code calling native code: arguments unbox, the return boxes.
    Downcall,
    /// Native code calling managed code: arguments box, the return unboxes.
    Upcall,
}

/// Arrangement options recognized by the linking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArrangeOptions {
    /// Emit base+offset address bindings instead of raw addresses, so the
    /// stub can reach values in movable heap storage.
    pub allow_heap_addressing: bool,
    /// Number of trailing parameters that are variadic.
    pub variadic_argument_count: usize,
}

/// Platform-neutral function signature: parameter layouts in declaration
/// order plus an optional return layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub parameters: Vec<TypeLayout>,
    pub return_layout: Option<TypeLayout>,
}

impl FunctionSignature {
    #[must_use]
    pub const fn new(parameters: Vec<TypeLayout>, return_layout: Option<TypeLayout>) -> Self {
        Self {
            parameters,
            return_layout,
        }
    }
}

/// The complete arrangement for one signature on the modeled architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallingSequence {
    /// Argument bindings in passing order. With an in-memory return the
    /// first entry is the synthesized return-buffer pointer.
    pub arguments: Vec<ParameterBinding>,
    /// Binding for the return value; absent for void signatures and for
    /// in-memory returns.
    pub return_binding: Option<ParameterBinding>,
    /// Whether the return value travels through a caller-supplied buffer
    /// instead of return registers.
    pub in_memory_return: bool,
    /// Bytes of stack argument area the arguments consume; the stub
    /// generator sizes the outgoing frame from this.
    pub argument_stack_bytes: u32,
}

/// Arrange a signature for one direction under the given options.
///
/// Classification and storage assignment are deterministic, so arranging the
/// same inputs twice yields identical sequences; callers may cache the
/// result and share it freely across threads.
///
/// # Errors
///
/// Fails on malformed descriptors, and on a variadic parameter that would
/// have to travel by reference (an explicit extension point of the modeled
/// architecture). No error is transient; retrying never helps.
pub fn arrange(
    signature: &FunctionSignature,
    direction: Direction,
    options: &ArrangeOptions,
) -> Result<CallingSequence> {
    for parameter in &signature.parameters {
        parameter.validate()?;
    }
    if let Some(return_layout) = &signature.return_layout {
        return_layout.validate()?;
    }
    if options.variadic_argument_count > signature.parameters.len() {
        return Err(Error::InvalidLayout(format!(
            "variadic count {} exceeds the {} declared parameters",
            options.variadic_argument_count,
            signature.parameters.len()
        )));
    }

    let unbox = UnboxStrategy {
        allow_heap_addressing: options.allow_heap_addressing,
    };
    let (argument_strategy, return_strategy): (&dyn BindingStrategy, &dyn BindingStrategy) =
        match direction {
            Direction::Downcall => (&unbox, &BoxStrategy),
            Direction::Upcall => (&BoxStrategy, &unbox),
        };

    // One argument-side calculator threads through the hidden return pointer
    // (if any) and every declared parameter, so register consumption
    // accumulates in passing order. The return side gets its own pools.
    let mut argument_storage = StorageCalculator::for_arguments();
    let mut arguments = Vec::with_capacity(signature.parameters.len() + 1);
    let mut return_binding = None;
    let mut in_memory_return = false;

    if let Some(return_layout) = &signature.return_layout {
        let class = classify(return_layout)?;
        if class == AbiClass::StructReference {
            in_memory_return = true;
            let pointer = TypeLayout::pointer();
            let recipe = argument_strategy.bindings_for(
                AbiClass::Pointer,
                &pointer,
                &mut argument_storage,
                false,
            )?;
            arguments.push(ParameterBinding {
                layout: pointer,
                class: AbiClass::Pointer,
                recipe,
            });
        } else {
            let mut return_storage = StorageCalculator::for_return();
            let recipe =
                return_strategy.bindings_for(class, return_layout, &mut return_storage, false)?;
            return_binding = Some(ParameterBinding {
                layout: return_layout.clone(),
                class,
                recipe,
            });
        }
    }

    let fixed_count = signature.parameters.len() - options.variadic_argument_count;
    for (position, parameter) in signature.parameters.iter().enumerate() {
        let class = classify(parameter)?;
        let recipe = argument_strategy.bindings_for(
            class,
            parameter,
            &mut argument_storage,
            position >= fixed_count,
        )?;
        arguments.push(ParameterBinding {
            layout: parameter.clone(),
            class,
            recipe,
        });
    }

    tracing::debug!(
        ?direction,
        argument_strategy = argument_strategy.name(),
        arguments = arguments.len(),
        in_memory_return,
        general_regs = argument_storage.general_used(),
        float_regs = argument_storage.float_used(),
        stack_bytes = argument_storage.stack_bytes(),
        "arranged calling sequence"
    );

    Ok(CallingSequence {
        arguments,
        return_binding,
        in_memory_return,
        argument_stack_bytes: argument_storage.stack_bytes(),
    })
}
