//! Read-side queries over one state of a hierarchy index.

use crate::bitmap::Bitmap;
use crate::hierarchy::node::{HierarchyNode, ItemIndex, LevelIndex, NodeState, Roots};
use std::collections::HashSet;

/// A consistent read-only view of a hierarchy index.
///
/// Obtained from [`HierarchyIndex::view`](crate::hierarchy::HierarchyIndex::view),
/// either of a published generation or of a transaction's working state.
/// The view borrows the containers, so it is cheap to copy and every query
/// runs against the same state.
///
/// Enumerations return keys in document order: depth-first, pre-order,
/// siblings sorted by `(order, entity_key)`. Every enumeration takes a list
/// of excluded keys; an excluded key and its whole subtree are neither
/// emitted nor descended into. Depth-bounded variants take `levels`, the
/// number of generations to descend below the query's anchor.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyView<'a> {
    pub(super) items: &'a ItemIndex,
    pub(super) roots: &'a Roots,
    pub(super) levels: &'a LevelIndex,
    pub(super) orphans: &'a Bitmap,
    dirty: bool,
}

impl<'a> HierarchyView<'a> {
    pub(super) fn new(
        items: &'a ItemIndex,
        roots: &'a Roots,
        levels: &'a LevelIndex,
        orphans: &'a Bitmap,
        dirty: bool,
    ) -> Self {
        Self {
            items,
            roots,
            levels,
            orphans,
            dirty,
        }
    }

    // ---- membership ----

    /// Returns the placement of `key`, attached or orphaned.
    #[must_use]
    pub fn node(&self, key: i32) -> Option<&'a HierarchyNode> {
        self.items.get(&key)
    }

    /// Returns the declared parent of `key`.
    #[must_use]
    pub fn parent_of(&self, key: i32) -> Option<i32> {
        self.items.get(&key).and_then(|node| node.parent_key)
    }

    /// Returns true if `key` is indexed.
    #[must_use]
    pub fn contains(&self, key: i32) -> bool {
        self.items.contains_key(&key)
    }

    /// Returns true if `key` is reachable from the roots.
    #[must_use]
    pub fn is_attached(&self, key: i32) -> bool {
        self.levels.contains_key(&key)
    }

    /// Returns true if `key` is indexed but unreachable.
    #[must_use]
    pub fn is_orphan(&self, key: i32) -> bool {
        self.orphans.contains(key)
    }

    /// Returns where `key` stands.
    #[must_use]
    pub fn state_of(&self, key: i32) -> NodeState {
        if self.is_attached(key) {
            NodeState::Attached
        } else if self.contains(key) {
            NodeState::Orphan
        } else {
            NodeState::Absent
        }
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn size_total(&self) -> usize {
        self.items.len()
    }

    /// Number of nodes reachable from the roots.
    #[must_use]
    pub fn size_attached(&self) -> usize {
        self.levels.len()
    }

    /// Number of orphaned nodes.
    #[must_use]
    pub fn size_orphans(&self) -> usize {
        self.orphans.len()
    }

    /// Returns the orphaned keys.
    #[must_use]
    pub fn orphans(&self) -> &'a Bitmap {
        self.orphans
    }

    /// Iterates every indexed node in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a HierarchyNode> + 'a {
        self.items.values()
    }

    /// Returns true if this state differs from the last persisted one.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ---- one level ----

    /// Returns the root keys in sibling order.
    #[must_use]
    pub fn root_keys(&self) -> &'a [i32] {
        self.roots
    }

    /// Returns the immediate children of an attached node, in sibling order.
    ///
    /// Orphans and absent keys have no children.
    #[must_use]
    pub fn children_of(&self, parent: i32) -> &'a [i32] {
        self.levels.get(&parent).map_or(&[][..], Vec::as_slice)
    }

    /// Immediate children of `parent`, skipping excluded subtrees.
    pub fn list_children(&self, parent: i32, excluded: &[i32]) -> Vec<i32> {
        self.collect(Anchor::Parent { parent, inclusive: false }, Some(1), excluded)
    }

    /// Counts the result of [`list_children`](Self::list_children).
    pub fn count_children(&self, parent: i32, excluded: &[i32]) -> usize {
        self.count(Anchor::Parent { parent, inclusive: false }, Some(1), excluded)
    }

    // ---- whole forest ----

    /// Every attached node.
    pub fn list_nodes_from_root(&self, excluded: &[i32]) -> Vec<i32> {
        self.collect(Anchor::Roots, None, excluded)
    }

    /// Counts the result of [`list_nodes_from_root`](Self::list_nodes_from_root).
    pub fn count_nodes_from_root(&self, excluded: &[i32]) -> usize {
        self.count(Anchor::Roots, None, excluded)
    }

    /// Attached nodes down to `levels` generations below the roots.
    ///
    /// `levels == 0` returns the roots only.
    pub fn list_nodes_from_root_down_to(&self, levels: u32, excluded: &[i32]) -> Vec<i32> {
        self.collect(Anchor::Roots, Some(levels), excluded)
    }

    /// Counts the result of
    /// [`list_nodes_from_root_down_to`](Self::list_nodes_from_root_down_to).
    pub fn count_nodes_from_root_down_to(&self, levels: u32, excluded: &[i32]) -> usize {
        self.count(Anchor::Roots, Some(levels), excluded)
    }

    // ---- subtree of a parent ----

    /// Every descendant of `parent`.
    pub fn list_nodes_from_parent(&self, parent: i32, excluded: &[i32]) -> Vec<i32> {
        self.collect(Anchor::Parent { parent, inclusive: false }, None, excluded)
    }

    /// Counts the result of [`list_nodes_from_parent`](Self::list_nodes_from_parent).
    pub fn count_nodes_from_parent(&self, parent: i32, excluded: &[i32]) -> usize {
        self.count(Anchor::Parent { parent, inclusive: false }, None, excluded)
    }

    /// `parent` followed by every descendant.
    pub fn list_nodes_from_parent_including_itself(
        &self,
        parent: i32,
        excluded: &[i32],
    ) -> Vec<i32> {
        self.collect(Anchor::Parent { parent, inclusive: true }, None, excluded)
    }

    /// Counts the result of
    /// [`list_nodes_from_parent_including_itself`](Self::list_nodes_from_parent_including_itself).
    pub fn count_nodes_from_parent_including_itself(&self, parent: i32, excluded: &[i32]) -> usize {
        self.count(Anchor::Parent { parent, inclusive: true }, None, excluded)
    }

    /// Descendants of `parent` down to `levels` generations below it.
    ///
    /// `levels == 0` returns nothing, `levels == 1` the immediate children.
    pub fn list_nodes_from_parent_down_to(
        &self,
        parent: i32,
        levels: u32,
        excluded: &[i32],
    ) -> Vec<i32> {
        self.collect(
            Anchor::Parent { parent, inclusive: false },
            Some(levels),
            excluded,
        )
    }

    /// Counts the result of
    /// [`list_nodes_from_parent_down_to`](Self::list_nodes_from_parent_down_to).
    pub fn count_nodes_from_parent_down_to(
        &self,
        parent: i32,
        levels: u32,
        excluded: &[i32],
    ) -> usize {
        self.count(
            Anchor::Parent { parent, inclusive: false },
            Some(levels),
            excluded,
        )
    }

    /// `parent` and its descendants down to `levels` generations below it.
    ///
    /// `levels == 0` returns `parent` alone.
    pub fn list_nodes_from_parent_including_itself_down_to(
        &self,
        parent: i32,
        levels: u32,
        excluded: &[i32],
    ) -> Vec<i32> {
        self.collect(
            Anchor::Parent { parent, inclusive: true },
            Some(levels),
            excluded,
        )
    }

    /// Counts the result of
    /// [`list_nodes_from_parent_including_itself_down_to`](Self::list_nodes_from_parent_including_itself_down_to).
    pub fn count_nodes_from_parent_including_itself_down_to(
        &self,
        parent: i32,
        levels: u32,
        excluded: &[i32],
    ) -> usize {
        self.count(
            Anchor::Parent { parent, inclusive: true },
            Some(levels),
            excluded,
        )
    }

    // ---- ancestry ----

    /// Ancestors of an attached `key`, root first, without `key` itself.
    ///
    /// Empty for roots, orphans and absent keys.
    pub fn parent_path(&self, key: i32) -> Vec<i32> {
        let mut path = self.parent_path_including_itself(key);
        path.pop();
        path
    }

    /// Ancestors of an attached `key`, root first, ending with `key`.
    ///
    /// Empty for orphans and absent keys.
    pub fn parent_path_including_itself(&self, key: i32) -> Vec<i32> {
        if !self.is_attached(key) {
            return Vec::new();
        }
        let mut path = vec![key];
        let mut current = self.parent_of(key);
        while let Some(parent) = current {
            path.push(parent);
            current = self.parent_of(parent);
        }
        path.reverse();
        path
    }

    /// Counts the result of [`parent_path`](Self::parent_path).
    pub fn count_parent_path(&self, key: i32) -> usize {
        if !self.is_attached(key) {
            return 0;
        }
        let mut count = 0;
        let mut current = self.parent_of(key);
        while let Some(parent) = current {
            count += 1;
            current = self.parent_of(parent);
        }
        count
    }

    // ---- walk ----

    fn collect(&self, anchor: Anchor, limit: Option<u32>, excluded: &[i32]) -> Vec<i32> {
        let mut keys = Vec::new();
        self.walk(anchor, limit, excluded, |key| keys.push(key));
        keys
    }

    fn count(&self, anchor: Anchor, limit: Option<u32>, excluded: &[i32]) -> usize {
        let mut count = 0;
        self.walk(anchor, limit, excluded, |_| count += 1);
        count
    }

    /// Pre-order walk from `anchor` with an explicit stack.
    ///
    /// Depth 0 is the roots or the parent itself. A node is emitted when its
    /// depth is within `limit` and descended into while below it.
    fn walk<F>(&self, anchor: Anchor, limit: Option<u32>, excluded: &[i32], mut emit: F)
    where
        F: FnMut(i32),
    {
        let excluded: HashSet<i32> = excluded.iter().copied().collect();
        let within = |depth: u32| limit.map_or(true, |limit| depth <= limit);

        let mut stack: Vec<(i32, u32)> = Vec::new();
        match anchor {
            Anchor::Roots => stack.extend(self.roots.iter().rev().map(|&key| (key, 0))),
            Anchor::Parent { parent, inclusive } => {
                if !self.is_reachable_avoiding(parent, &excluded) {
                    return;
                }
                if inclusive {
                    stack.push((parent, 0));
                } else {
                    stack.extend(self.children_of(parent).iter().rev().map(|&key| (key, 1)));
                }
            }
        }

        while let Some((key, depth)) = stack.pop() {
            if excluded.contains(&key) || !within(depth) {
                continue;
            }
            emit(key);
            if within(depth + 1) {
                stack.extend(
                    self.children_of(key)
                        .iter()
                        .rev()
                        .map(|&child| (child, depth + 1)),
                );
            }
        }
    }

    /// True if `key` is attached and neither it nor an ancestor is excluded.
    fn is_reachable_avoiding(&self, key: i32, excluded: &HashSet<i32>) -> bool {
        if !self.is_attached(key) {
            return false;
        }
        let mut current = Some(key);
        while let Some(key) = current {
            if excluded.contains(&key) {
                return false;
            }
            current = self.parent_of(key);
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Roots,
    Parent { parent: i32, inclusive: bool },
}
