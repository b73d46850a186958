// SPDX-License-Identifier: MIT OR Apache-2.0
//! Choice index allocation for question nodes.
//!
//! Several edges can leave the same question and they arrive in arbitrary
//! order. The allocator hands each one a distinct index, honouring the
//! index proposed by the edge when it is valid and still free.

use crate::node::{DialogueChoice, NodeId};
use std::collections::{BTreeSet, HashMap};

/// Per-source index allocator
#[derive(Debug, Default)]
pub struct ChoiceIndexAllocator {
    consumed: HashMap<NodeId, BTreeSet<u32>>,
}

impl ChoiceIndexAllocator {
    /// Create an allocator with no consumed indices
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick an index for the next choice of `source`.
    ///
    /// A proposal is accepted when it is a non-negative integer that is not
    /// yet consumed for this source; otherwise the smallest free index is
    /// used.
    pub fn allocate(&mut self, source: &NodeId, proposed: Option<i64>) -> u32 {
        let consumed = self.consumed.entry(source.clone()).or_default();

        let accepted = proposed
            .and_then(|p| u32::try_from(p).ok())
            .filter(|p| !consumed.contains(p));

        let index = match accepted {
            Some(index) => index,
            None => {
                let free = (0..).find(|i| !consumed.contains(i)).unwrap_or(u32::MAX);
                if proposed.is_some() {
                    tracing::debug!(
                        source = %source,
                        proposed = ?proposed,
                        assigned = free,
                        "Reassigned choice index"
                    );
                }
                free
            }
        };

        consumed.insert(index);
        index
    }

    /// Indices handed out so far for a source
    pub fn consumed(&self, source: &NodeId) -> Option<&BTreeSet<u32>> {
        self.consumed.get(source)
    }

    /// Forget every allocation
    pub fn reset(&mut self) {
        self.consumed.clear();
    }
}

/// Sort choices by index and renumber them `0..n-1` in that order.
///
/// The sort is stable, so choices that share an index keep their relative
/// order.
pub fn compact_choices(choices: &mut [DialogueChoice]) {
    choices.sort_by_key(|c| c.index);
    for (position, choice) in choices.iter_mut().enumerate() {
        choice.index = position as u32;
    }
}

/// Whether choice indices already form `0..n-1` in ascending order
pub fn is_compact(choices: &[DialogueChoice]) -> bool {
    choices
        .iter()
        .enumerate()
        .all(|(position, choice)| choice.index as usize == position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(index: u32, next: &str) -> DialogueChoice {
        DialogueChoice {
            index,
            next_node: next.into(),
            ..DialogueChoice::default()
        }
    }

    #[test]
    fn test_collision_reassigned() {
        let source = NodeId::from("q");
        let mut allocator = ChoiceIndexAllocator::new();

        let first = allocator.allocate(&source, Some(2));
        let second = allocator.allocate(&source, Some(2));
        let third = allocator.allocate(&source, Some(0));

        assert_eq!(first, 2);
        assert_eq!(second, 0);
        assert_eq!(third, 1);

        let mut choices = vec![choice(first, "a"), choice(second, "b"), choice(third, "c")];
        compact_choices(&mut choices);
        let order: Vec<_> = choices.iter().map(|c| (c.index, c.next_node.as_str())).collect();
        assert_eq!(order, vec![(0, "b"), (1, "c"), (2, "a")]);
    }

    #[test]
    fn test_invalid_proposals_fall_back() {
        let source = NodeId::from("q");
        let mut allocator = ChoiceIndexAllocator::new();

        assert_eq!(allocator.allocate(&source, Some(-3)), 0);
        assert_eq!(allocator.allocate(&source, None), 1);
        assert_eq!(allocator.allocate(&source, Some(i64::MAX)), 2);
        assert_eq!(allocator.allocate(&source, Some(7)), 7);
        assert_eq!(allocator.allocate(&source, None), 3);
    }

    #[test]
    fn test_sources_are_independent() {
        let mut allocator = ChoiceIndexAllocator::new();
        assert_eq!(allocator.allocate(&"a".into(), Some(0)), 0);
        assert_eq!(allocator.allocate(&"b".into(), Some(0)), 0);
        assert_eq!(allocator.consumed(&"a".into()).map(BTreeSet::len), Some(1));

        allocator.reset();
        assert!(allocator.consumed(&"a".into()).is_none());
    }

    #[test]
    fn test_compaction_closes_gaps() {
        let mut choices = vec![choice(5, "x"), choice(1, "y"), choice(9, "z")];
        assert!(!is_compact(&choices));
        compact_choices(&mut choices);
        assert!(is_compact(&choices));
        assert_eq!(choices[0].next_node.as_str(), "y");
        assert_eq!(choices[2].next_node.as_str(), "z");
    }
}
