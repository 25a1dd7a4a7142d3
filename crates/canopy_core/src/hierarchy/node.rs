//! Hierarchy nodes and sibling ordering.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Every indexed node, attached or orphaned, by entity key.
pub type ItemIndex = BTreeMap<i32, HierarchyNode>;

/// Ordered child keys of every attached node.
pub type LevelIndex = BTreeMap<i32, Vec<i32>>;

/// Ordered keys of the nodes without a parent.
pub type Roots = Vec<i32>;

/// Placement of one entity in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Unique key of the entity.
    pub entity_key: i32,
    /// Key of the declared parent; `None` places the node among the roots.
    pub parent_key: Option<i32>,
    /// Position among siblings.
    pub order: i32,
}

impl HierarchyNode {
    /// Creates a node.
    #[must_use]
    pub const fn new(entity_key: i32, parent_key: Option<i32>, order: i32) -> Self {
        Self {
            entity_key,
            parent_key,
            order,
        }
    }

    /// Returns true if the node declares no parent.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_key.is_none()
    }

    /// Sibling sort key: `order` first, ties broken by ascending entity key.
    #[must_use]
    pub const fn sort_key(&self) -> (i32, i32) {
        (self.order, self.entity_key)
    }
}

/// Where a key currently stands in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Not indexed.
    Absent,
    /// Reachable from the roots.
    Attached,
    /// Indexed, but some ancestor is missing.
    Orphan,
}

/// Locates `node` among `siblings` by sort key.
///
/// Returns `Ok(pos)` if the node is present at `pos`, `Err(pos)` with the
/// insertion point otherwise. A sibling missing from `items` is corruption.
pub(crate) fn sibling_position(
    siblings: &[i32],
    items: &ItemIndex,
    node: &HierarchyNode,
) -> CoreResult<Result<usize, usize>> {
    let target = node.sort_key();
    let mut missing = None;
    let found = siblings.binary_search_by(|sibling| match items.get(sibling) {
        Some(sibling) => sibling.sort_key().cmp(&target),
        None => {
            missing = Some(*sibling);
            Ordering::Less
        }
    });
    match missing {
        Some(key) => Err(CoreError::invariant_violation(format!(
            "sibling {key} is listed but not indexed"
        ))),
        None => Ok(found),
    }
}

/// Sorts keys by the sort key of their nodes.
pub(crate) fn sort_by_placement(keys: &mut [i32], items: &ItemIndex) -> CoreResult<()> {
    let mut missing = None;
    keys.sort_unstable_by_key(|key| match items.get(key) {
        Some(node) => node.sort_key(),
        None => {
            missing = Some(*key);
            (i32::MIN, *key)
        }
    });
    match missing {
        Some(key) => Err(CoreError::invariant_violation(format!(
            "key {key} is listed but not indexed"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(nodes: &[HierarchyNode]) -> ItemIndex {
        nodes.iter().map(|n| (n.entity_key, *n)).collect()
    }

    #[test]
    fn sort_key_breaks_ties_by_entity_key() {
        let a = HierarchyNode::new(5, None, 1);
        let b = HierarchyNode::new(3, None, 1);
        let c = HierarchyNode::new(1, None, 2);
        assert!(b.sort_key() < a.sort_key());
        assert!(a.sort_key() < c.sort_key());
    }

    #[test]
    fn position_finds_insertion_point() {
        let items = items(&[
            HierarchyNode::new(10, Some(1), 1),
            HierarchyNode::new(20, Some(1), 3),
            HierarchyNode::new(15, Some(1), 2),
        ]);
        let siblings = vec![10, 20];
        let pos = sibling_position(&siblings, &items, &items[&15]).unwrap();
        assert_eq!(pos, Err(1));
        let pos = sibling_position(&siblings, &items, &items[&20]).unwrap();
        assert_eq!(pos, Ok(1));
    }

    #[test]
    fn position_with_unindexed_sibling_is_fatal() {
        let items = items(&[HierarchyNode::new(10, None, 1)]);
        let err = sibling_position(&[99], &items, &items[&10]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn sort_by_placement_orders_siblings() {
        let items = items(&[
            HierarchyNode::new(4, Some(1), 2),
            HierarchyNode::new(9, Some(1), 1),
            HierarchyNode::new(2, Some(1), 2),
        ]);
        let mut keys = vec![4, 9, 2];
        sort_by_placement(&mut keys, &items).unwrap();
        assert_eq!(keys, vec![9, 2, 4]);
    }
}
