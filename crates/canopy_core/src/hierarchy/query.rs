//! Hierarchy queries as values.

use crate::hierarchy::view::HierarchyView;
use serde::{Deserialize, Serialize};

/// A hierarchy enumeration that can be stored, hashed and run later.
///
/// Excluded keys are kept sorted and unique, so two queries that differ
/// only in the order their exclusions were given compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyQuery {
    /// Attached nodes from the roots down.
    FromRoot {
        /// Generations below the roots; `None` is unbounded.
        levels: Option<u32>,
        /// Pruned subtrees.
        excluded: Vec<i32>,
    },
    /// Descendants of a parent.
    FromParent {
        /// Anchor of the subtree.
        parent: i32,
        /// Whether the parent itself is part of the result.
        including_parent: bool,
        /// Generations below the parent; `None` is unbounded.
        levels: Option<u32>,
        /// Pruned subtrees.
        excluded: Vec<i32>,
    },
    /// Immediate children of a parent.
    Children {
        /// The parent.
        parent: i32,
        /// Pruned children.
        excluded: Vec<i32>,
    },
    /// Ancestors of a node, root first.
    ParentPath {
        /// The node.
        key: i32,
        /// Whether the node itself ends the path.
        including_itself: bool,
    },
}

impl HierarchyQuery {
    /// Every attached node.
    pub fn from_root(excluded: &[i32]) -> Self {
        Self::FromRoot {
            levels: None,
            excluded: normalize(excluded),
        }
    }

    /// Attached nodes down to `levels` generations below the roots.
    pub fn from_root_down_to(levels: u32, excluded: &[i32]) -> Self {
        Self::FromRoot {
            levels: Some(levels),
            excluded: normalize(excluded),
        }
    }

    /// Descendants of `parent`, optionally bounded and including `parent`.
    pub fn from_parent(
        parent: i32,
        including_parent: bool,
        levels: Option<u32>,
        excluded: &[i32],
    ) -> Self {
        Self::FromParent {
            parent,
            including_parent,
            levels,
            excluded: normalize(excluded),
        }
    }

    /// Immediate children of `parent`.
    pub fn children(parent: i32, excluded: &[i32]) -> Self {
        Self::Children {
            parent,
            excluded: normalize(excluded),
        }
    }

    /// Ancestors of `key`.
    pub fn parent_path(key: i32, including_itself: bool) -> Self {
        Self::ParentPath {
            key,
            including_itself,
        }
    }

    /// Short name of the query kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FromRoot { .. } => "from_root",
            Self::FromParent { .. } => "from_parent",
            Self::Children { .. } => "children",
            Self::ParentPath { .. } => "parent_path",
        }
    }

    /// Runs the query, returning keys in document order.
    pub fn execute(&self, view: &HierarchyView<'_>) -> Vec<i32> {
        match self {
            Self::FromRoot { levels: None, excluded } => view.list_nodes_from_root(excluded),
            Self::FromRoot {
                levels: Some(levels),
                excluded,
            } => view.list_nodes_from_root_down_to(*levels, excluded),
            Self::FromParent {
                parent,
                including_parent,
                levels,
                excluded,
            } => match (including_parent, levels) {
                (false, None) => view.list_nodes_from_parent(*parent, excluded),
                (true, None) => view.list_nodes_from_parent_including_itself(*parent, excluded),
                (false, Some(levels)) => {
                    view.list_nodes_from_parent_down_to(*parent, *levels, excluded)
                }
                (true, Some(levels)) => view
                    .list_nodes_from_parent_including_itself_down_to(*parent, *levels, excluded),
            },
            Self::Children { parent, excluded } => view.list_children(*parent, excluded),
            Self::ParentPath {
                key,
                including_itself: false,
            } => view.parent_path(*key),
            Self::ParentPath {
                key,
                including_itself: true,
            } => view.parent_path_including_itself(*key),
        }
    }

    /// Counts the result without materializing it.
    pub fn count(&self, view: &HierarchyView<'_>) -> usize {
        match self {
            Self::FromRoot { levels: None, excluded } => view.count_nodes_from_root(excluded),
            Self::FromRoot {
                levels: Some(levels),
                excluded,
            } => view.count_nodes_from_root_down_to(*levels, excluded),
            Self::FromParent {
                parent,
                including_parent,
                levels,
                excluded,
            } => match (including_parent, levels) {
                (false, None) => view.count_nodes_from_parent(*parent, excluded),
                (true, None) => view.count_nodes_from_parent_including_itself(*parent, excluded),
                (false, Some(levels)) => {
                    view.count_nodes_from_parent_down_to(*parent, *levels, excluded)
                }
                (true, Some(levels)) => view
                    .count_nodes_from_parent_including_itself_down_to(*parent, *levels, excluded),
            },
            Self::Children { parent, excluded } => view.count_children(*parent, excluded),
            Self::ParentPath {
                key,
                including_itself,
            } => {
                let own = *including_itself && view.is_attached(*key);
                view.count_parent_path(*key) + usize::from(own)
            }
        }
    }
}

fn normalize(excluded: &[i32]) -> Vec<i32> {
    let mut keys = excluded.to_vec();
    keys.sort_unstable();
    keys.dedup();
    keys
}
