//! Cache of computed calling sequences.
//!
//! Arrangement is pure but not free, and one signature is typically called
//! many times. [`SequenceCache`] shares one immutable [`CallingSequence`]
//! per distinct (signature, direction, options) key across threads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::arrange::{ArrangeOptions, CallingSequence, Direction, FunctionSignature, arrange};
use crate::error::Result;

type Key = (FunctionSignature, Direction, ArrangeOptions);

/// Concurrent lookup-or-build cache keyed by signature.
///
/// The build runs under the map lock, so each key is computed at most once
/// and readers only ever observe fully-built sequences. Failed arrangements
/// are not cached; the same malformed input fails identically on every call.
#[derive(Debug, Default)]
pub struct SequenceCache {
    sequences: Mutex<HashMap<Key, Arc<CallingSequence>>>,
}

impl SequenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached sequence for the key, arranging it first if absent.
    pub fn get_or_arrange(
        &self,
        signature: &FunctionSignature,
        direction: Direction,
        options: &ArrangeOptions,
    ) -> Result<Arc<CallingSequence>> {
        let mut sequences = self.sequences.lock().expect("cache mutex poisoned");
        let key = (signature.clone(), direction, *options);
        if let Some(sequence) = sequences.get(&key) {
            return Ok(Arc::clone(sequence));
        }
        let sequence = Arc::new(arrange(signature, direction, options)?);
        sequences.insert(key, Arc::clone(&sequence));
        Ok(sequence)
    }

    /// Number of cached sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.lock().expect("cache mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TypeLayout;

    #[test]
    fn same_key_shares_one_sequence() {
        let cache = SequenceCache::new();
        let signature =
            FunctionSignature::new(vec![TypeLayout::int32()], Some(TypeLayout::int32()));
        let options = ArrangeOptions::default();

        let first = cache
            .get_or_arrange(&signature, Direction::Downcall, &options)
            .unwrap();
        let second = cache
            .get_or_arrange(&signature, Direction::Downcall, &options)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn direction_and_options_split_keys() {
        let cache = SequenceCache::new();
        let signature =
            FunctionSignature::new(vec![TypeLayout::pointer()], Some(TypeLayout::int64()));

        cache
            .get_or_arrange(&signature, Direction::Downcall, &ArrangeOptions::default())
            .unwrap();
        cache
            .get_or_arrange(&signature, Direction::Upcall, &ArrangeOptions::default())
            .unwrap();
        cache
            .get_or_arrange(
                &signature,
                Direction::Downcall,
                &ArrangeOptions {
                    allow_heap_addressing: true,
                    variadic_argument_count: 0,
                },
            )
            .unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SequenceCache::new();
        let bad = FunctionSignature::new(
            vec![TypeLayout::Scalar {
                size: 3,
                align: 1,
                kind: crate::layout::ScalarKind::Integer,
            }],
            None,
        );
        assert!(
            cache
                .get_or_arrange(&bad, Direction::Downcall, &ArrangeOptions::default())
                .is_err()
        );
        assert!(cache.is_empty());
    }
}
