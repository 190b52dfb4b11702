//! Property-based tests for the calling-convention arranger.
//!
//! Uses `proptest` to generate random layouts and signatures and verify
//! invariants:
//! - Arrangement is deterministic (same inputs, identical sequences)
//! - Classification is stable and matches the aggregate eligibility rule
//! - Issued registers never exceed the per-file budgets and are never reused
//! - Stack ranges are aligned, monotonically non-decreasing, non-overlapping

use proptest::prelude::*;

use call_arranger::{
    AbiClass, ArrangeOptions, Direction, FunctionSignature, RecipeStep, RegisterKind,
    StorageCalculator, StorageLocation, TypeLayout, arch, arrange, classify,
};

fn scalar_strategy() -> impl Strategy<Value = TypeLayout> {
    prop_oneof![
        Just(TypeLayout::int8()),
        Just(TypeLayout::int16()),
        Just(TypeLayout::int32()),
        Just(TypeLayout::int64()),
        Just(TypeLayout::float32()),
        Just(TypeLayout::float64()),
        Just(TypeLayout::pointer()),
    ]
}

fn layout_strategy() -> impl Strategy<Value = TypeLayout> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(TypeLayout::group_of),
            (inner, 0u32..4).prop_map(|(element, count)| TypeLayout::sequence_of(element, count)),
        ]
    })
}

fn signature_strategy() -> impl Strategy<Value = FunctionSignature> {
    (
        prop::collection::vec(layout_strategy(), 0..8),
        prop::option::of(layout_strategy()),
    )
        .prop_map(|(parameters, return_layout)| FunctionSignature::new(parameters, return_layout))
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Downcall), Just(Direction::Upcall)]
}

/// Collect every register location issued across a set of bindings.
fn issued_registers(
    bindings: &[call_arranger::ParameterBinding],
) -> Vec<(RegisterKind, u8)> {
    bindings
        .iter()
        .flat_map(|binding| &binding.recipe)
        .filter_map(|step| match step {
            RecipeStep::MoveToStorage { location } | RecipeStep::MoveFromStorage { location } => {
                match location {
                    StorageLocation::Register { kind, index, .. } => Some((*kind, *index)),
                    StorageLocation::Stack { .. } => None,
                }
            }
            _ => None,
        })
        .collect()
}

proptest! {
    /// Arranging the same signature twice yields identical sequences.
    #[test]
    fn arrangement_is_deterministic(
        signature in signature_strategy(),
        direction in direction_strategy(),
        heap in any::<bool>(),
    ) {
        let options = ArrangeOptions {
            allow_heap_addressing: heap,
            variadic_argument_count: 0,
        };
        let first = arrange(&signature, direction, &options);
        let second = arrange(&signature, direction, &options);
        match (&first, &second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(format!("{a}"), format!("{b}")),
            _ => prop_assert!(false, "one call failed, the other succeeded"),
        }
    }

    /// Classification is a pure function of the layout.
    #[test]
    fn classification_is_stable(layout in layout_strategy()) {
        let first = classify(&layout).expect("generated layouts are valid");
        for _ in 0..3 {
            prop_assert_eq!(classify(&layout).expect("valid"), first);
        }
    }

    /// Byte arrays classify by the aggregate eligibility rule: sizes over a
    /// word and sizes 3/5/6/7 go by reference, the rest ride registers.
    #[test]
    fn byte_array_classification_matches_eligibility(count in 0u32..=16) {
        let layout = TypeLayout::sequence_of(TypeLayout::int8(), count);
        let class = classify(&layout).expect("valid");
        if arch::register_eligible(count) {
            prop_assert_eq!(class, AbiClass::StructRegister);
        } else {
            prop_assert_eq!(class, AbiClass::StructReference);
        }
    }

    /// No arrangement ever issues more registers than the architecture has,
    /// and no register is issued twice on the same side.
    #[test]
    fn register_budget_is_respected(
        signature in signature_strategy(),
        direction in direction_strategy(),
    ) {
        let Ok(sequence) = arrange(&signature, direction, &ArrangeOptions::default()) else {
            return Ok(());
        };

        let argument_regs = issued_registers(&sequence.arguments);
        let general: Vec<_> = argument_regs
            .iter()
            .filter(|(kind, _)| *kind == RegisterKind::General)
            .collect();
        let float: Vec<_> = argument_regs
            .iter()
            .filter(|(kind, _)| *kind == RegisterKind::Float)
            .collect();
        prop_assert!(general.len() <= arch::INT_ARGUMENT_REGS as usize);
        prop_assert!(float.len() <= arch::FLOAT_ARGUMENT_REGS as usize);
        for (kind, index) in &argument_regs {
            let limit = match kind {
                RegisterKind::General => arch::INT_ARGUMENT_REGS,
                RegisterKind::Float => arch::FLOAT_ARGUMENT_REGS,
            };
            prop_assert!(*index < limit);
        }

        // Issued once, never reused.
        let mut seen = argument_regs.clone();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), argument_regs.len());

        if let Some(return_binding) = &sequence.return_binding {
            let return_regs = issued_registers(std::slice::from_ref(return_binding));
            prop_assert!(return_regs.len() <= (arch::INT_RETURN_REGS + arch::FLOAT_RETURN_REGS) as usize);
            for (kind, index) in return_regs {
                let limit = match kind {
                    RegisterKind::General => arch::INT_RETURN_REGS,
                    RegisterKind::Float => arch::FLOAT_RETURN_REGS,
                };
                prop_assert!(index < limit);
            }
        }
    }

    /// Successive stack reservations are aligned, non-decreasing, and never
    /// overlap.
    #[test]
    fn stack_ranges_are_monotonic(
        requests in prop::collection::vec((1u32..=32, 0u32..=4), 1..32),
    ) {
        let mut calculator = StorageCalculator::for_arguments();
        let mut previous_end = 0u32;
        for (size, align_exp) in requests {
            let align = 1u32 << align_exp;
            let StorageLocation::Stack { offset, size: issued } =
                calculator.allocate_stack(size, align)
            else {
                prop_assert!(false, "stack allocation must yield a stack location");
                return Ok(());
            };
            prop_assert_eq!(issued, size);
            prop_assert_eq!(offset % align, 0, "offset {} not {}-aligned", offset, align);
            prop_assert!(offset >= previous_end, "range overlap at offset {}", offset);
            previous_end = offset + size;
        }
        prop_assert_eq!(calculator.stack_bytes(), previous_end);
    }

    /// Register-exhausted values fall back to full stack slots whose offsets
    /// advance one slot at a time.
    #[test]
    fn overflow_slots_advance_by_full_slots(extra in 1usize..8) {
        let mut calculator = StorageCalculator::for_arguments();
        for _ in 0..arch::INT_ARGUMENT_REGS {
            calculator.allocate(RegisterKind::General, 8);
        }
        for i in 0..extra {
            let location = calculator.allocate(RegisterKind::General, 4);
            let expected = u32::try_from(i).unwrap() * arch::STACK_SLOT_SIZE
                + arch::slot_sub_offset(4);
            prop_assert_eq!(
                location,
                StorageLocation::Stack { offset: expected, size: 4 }
            );
        }
    }
}
