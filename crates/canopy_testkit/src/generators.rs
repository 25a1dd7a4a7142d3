//! Property-based test generators using proptest.
//!
//! Keys are drawn from a small space so that generated sequences revisit
//! the same nodes: re-parenting, removal of attached parents and late
//! arrival of missing parents all happen often.

use canopy_core::{CoreResult, HierarchyIndex, Transaction};
use proptest::prelude::*;

/// Largest key produced by [`key_strategy`].
pub const MAX_KEY: i32 = 24;

/// One mutation of a hierarchy index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyOp {
    /// Place a node.
    Set {
        /// Entity key.
        key: i32,
        /// Declared parent.
        parent: Option<i32>,
        /// Sibling order.
        order: i32,
    },
    /// Remove a node.
    Remove {
        /// Entity key.
        key: i32,
    },
}

impl HierarchyOp {
    /// Applies the operation to an index inside `txn`.
    pub fn apply(&self, index: &HierarchyIndex, txn: &mut Transaction) -> CoreResult<()> {
        match *self {
            Self::Set { key, parent, order } => index.set_hierarchy_for(txn, key, parent, order),
            Self::Remove { key } => index.remove_hierarchy_for(txn, key),
        }
    }

    /// Returns the key the operation targets.
    pub fn key(&self) -> i32 {
        match *self {
            Self::Set { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// Strategy for entity keys.
pub fn key_strategy() -> impl Strategy<Value = i32> {
    0..=MAX_KEY
}

/// Strategy for sibling orders; a narrow range forces ties.
pub fn order_strategy() -> impl Strategy<Value = i32> {
    -2..4
}

/// Strategy for a placement, self-parenting included.
pub fn set_strategy() -> impl Strategy<Value = HierarchyOp> {
    (
        key_strategy(),
        prop::option::weighted(0.8, key_strategy()),
        order_strategy(),
    )
        .prop_map(|(key, parent, order)| HierarchyOp::Set { key, parent, order })
}

/// Strategy for a single operation.
pub fn op_strategy() -> impl Strategy<Value = HierarchyOp> {
    prop_oneof![
        4 => set_strategy(),
        1 => key_strategy().prop_map(|key| HierarchyOp::Remove { key }),
    ]
}

/// Strategy for a sequence of operations.
pub fn op_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<HierarchyOp>> {
    prop::collection::vec(op_strategy(), min_ops..max_ops)
}

/// Strategy for a well-formed tree inserted in shuffled order.
///
/// Node `i` gets a parent among `0..i`, or none, so the declared structure
/// is acyclic; the shuffle makes children arrive before their parents.
pub fn shuffled_tree_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<HierarchyOp>> {
    (1..max_nodes)
        .prop_flat_map(|len| {
            let parents: Vec<BoxedStrategy<Option<i32>>> = (0..len)
                .map(|i| {
                    if i == 0 {
                        Just(None).boxed()
                    } else {
                        prop::option::weighted(0.9, 0..i as i32).boxed()
                    }
                })
                .collect();
            (parents, prop::collection::vec(order_strategy(), len))
        })
        .prop_map(|(parents, orders)| {
            parents
                .into_iter()
                .zip(orders)
                .enumerate()
                .map(|(key, (parent, order))| HierarchyOp::Set {
                    key: key as i32,
                    parent,
                    order,
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn keys_stay_in_range(ops in op_sequence_strategy(1, 50)) {
            for op in ops {
                prop_assert!((0..=MAX_KEY).contains(&op.key()));
            }
        }

        #[test]
        fn shuffled_tree_is_acyclic(ops in shuffled_tree_strategy(30)) {
            let mut keys = HashSet::new();
            for op in &ops {
                if let HierarchyOp::Set { key, parent, .. } = *op {
                    prop_assert!(keys.insert(key));
                    if let Some(parent) = parent {
                        prop_assert!(parent < key);
                    }
                }
            }
        }
    }
}
