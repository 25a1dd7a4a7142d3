//! Lazy depth-first traversal.

use crate::hierarchy::node::HierarchyNode;
use crate::hierarchy::view::HierarchyView;
use std::collections::HashSet;

/// Callback of a hierarchy traversal.
///
/// Each visited node comes with its absolute `level` (1 for roots), its
/// `distance` from the node the traversal started at (0 for that node),
/// and a [`Descend`] handle. Children are visited only if the visitor calls
/// [`Descend::traverse`]; dropping the handle skips the whole subtree.
pub trait HierarchyVisitor {
    /// Visits one node.
    fn visit(&mut self, node: &HierarchyNode, level: u32, distance: u32, children: Descend<'_>);
}

/// Continuation into the children of a visited node.
#[derive(Debug, Clone, Copy)]
pub struct Descend<'v> {
    view: HierarchyView<'v>,
    children: &'v [i32],
    level: u32,
    distance: u32,
    excluded: &'v HashSet<i32>,
}

impl<'v> Descend<'v> {
    /// Visits the children of the node, in sibling order.
    pub fn traverse<V: HierarchyVisitor + ?Sized>(self, visitor: &mut V) {
        visit_all(
            self.view,
            self.children,
            self.level + 1,
            self.distance + 1,
            self.excluded,
            visitor,
        );
    }

    /// Number of children, excluded ones included.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

fn visit_all<V: HierarchyVisitor + ?Sized>(
    view: HierarchyView<'_>,
    keys: &[i32],
    level: u32,
    distance: u32,
    excluded: &HashSet<i32>,
    visitor: &mut V,
) {
    for &key in keys {
        if excluded.contains(&key) {
            continue;
        }
        if let Some(node) = view.node(key) {
            let children = Descend {
                view,
                children: view.children_of(key),
                level,
                distance,
                excluded,
            };
            visitor.visit(node, level, distance, children);
        }
    }
}

impl HierarchyView<'_> {
    /// Walks the whole forest, roots first.
    pub fn traverse_hierarchy<V: HierarchyVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        excluded: &[i32],
    ) {
        let excluded: HashSet<i32> = excluded.iter().copied().collect();
        visit_all(*self, self.root_keys(), 1, 0, &excluded, visitor);
    }

    /// Walks the subtree of an attached `root`.
    ///
    /// With `excluding_root` the walk starts at the children of `root`,
    /// which are then at distance 0. Nothing is visited if `root` is not
    /// attached or is itself excluded.
    pub fn traverse_from_node<V: HierarchyVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        root: i32,
        excluding_root: bool,
        excluded: &[i32],
    ) {
        let excluded: HashSet<i32> = excluded.iter().copied().collect();
        if !self.is_attached(root) || excluded.contains(&root) {
            return;
        }
        let level = self.count_parent_path(root) as u32 + 1;
        if excluding_root {
            visit_all(*self, self.children_of(root), level + 1, 0, &excluded, visitor);
        } else {
            visit_all(*self, &[root], level, 0, &excluded, visitor);
        }
    }
}
