//! Naive reference model of a hierarchy.
//!
//! Keeps only the declared placements and derives everything else on
//! demand by brute force. Property tests compare the index against it.

use crate::generators::HierarchyOp;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Why the model rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRejection {
    /// A node was declared its own parent.
    SelfParenting,
    /// The removed key was not placed.
    NotFound,
}

/// Declared placements, keyed by entity key: `(parent, order)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceModel {
    nodes: BTreeMap<i32, (Option<i32>, i32)>,
}

impl ReferenceModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an operation, mirroring the index's preconditions.
    pub fn apply(&mut self, op: &HierarchyOp) -> Result<(), ModelRejection> {
        match *op {
            HierarchyOp::Set { key, parent, order } => {
                if parent == Some(key) {
                    return Err(ModelRejection::SelfParenting);
                }
                self.nodes.insert(key, (parent, order));
                Ok(())
            }
            HierarchyOp::Remove { key } => self
                .nodes
                .remove(&key)
                .map(|_| ())
                .ok_or(ModelRejection::NotFound),
        }
    }

    /// Number of placed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes declaring `parent`, sorted by `(order, key)`.
    fn declared_children(&self, parent: Option<i32>) -> Vec<i32> {
        let mut children: Vec<(i32, i32)> = self
            .nodes
            .iter()
            .filter(|(_, (p, _))| *p == parent)
            .map(|(&key, &(_, order))| (order, key))
            .collect();
        children.sort_unstable();
        children.into_iter().map(|(_, key)| key).collect()
    }

    /// Root keys in sibling order.
    pub fn roots(&self) -> Vec<i32> {
        self.declared_children(None)
    }

    /// Keys reachable from the roots.
    pub fn attached(&self) -> BTreeSet<i32> {
        let mut attached = BTreeSet::new();
        let mut pending = self.roots();
        while let Some(key) = pending.pop() {
            if attached.insert(key) {
                pending.extend(self.declared_children(Some(key)));
            }
        }
        attached
    }

    /// Placed keys that are not reachable.
    pub fn orphans(&self) -> Vec<i32> {
        let attached = self.attached();
        self.nodes
            .keys()
            .copied()
            .filter(|key| !attached.contains(key))
            .collect()
    }

    /// Children of an attached node in sibling order; empty otherwise.
    pub fn children_of(&self, parent: i32) -> Vec<i32> {
        if self.attached().contains(&parent) {
            self.declared_children(Some(parent))
        } else {
            Vec::new()
        }
    }

    /// Document-order enumeration of the forest, recursively.
    pub fn list_from_root(&self, levels: Option<u32>, excluded: &[i32]) -> Vec<i32> {
        let excluded: HashSet<i32> = excluded.iter().copied().collect();
        let mut out = Vec::new();
        for root in self.roots() {
            self.descend(root, 0, levels, &excluded, &mut out);
        }
        out
    }

    /// Document-order enumeration below `parent`, recursively.
    pub fn list_from_parent(
        &self,
        parent: i32,
        including_parent: bool,
        levels: Option<u32>,
        excluded: &[i32],
    ) -> Vec<i32> {
        let excluded: HashSet<i32> = excluded.iter().copied().collect();
        let mut out = Vec::new();
        if !self.attached().contains(&parent)
            || self.path(parent).iter().any(|k| excluded.contains(k))
        {
            return out;
        }
        if including_parent {
            self.descend(parent, 0, levels, &excluded, &mut out);
        } else {
            for child in self.declared_children(Some(parent)) {
                self.descend(child, 1, levels, &excluded, &mut out);
            }
        }
        out
    }

    /// Root-first ancestry of an attached key, the key included.
    pub fn path(&self, key: i32) -> Vec<i32> {
        if !self.attached().contains(&key) {
            return Vec::new();
        }
        let mut path = vec![key];
        let mut current = self.nodes.get(&key).and_then(|(parent, _)| *parent);
        while let Some(parent) = current {
            path.insert(0, parent);
            current = self.nodes.get(&parent).and_then(|(p, _)| *p);
        }
        path
    }

    fn descend(
        &self,
        key: i32,
        depth: u32,
        levels: Option<u32>,
        excluded: &HashSet<i32>,
        out: &mut Vec<i32>,
    ) {
        if excluded.contains(&key) || levels.is_some_and(|levels| depth > levels) {
            return;
        }
        out.push(key);
        for child in self.declared_children(Some(key)) {
            self.descend(child, depth + 1, levels, excluded, out);
        }
    }
}
