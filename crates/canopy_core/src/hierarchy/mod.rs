//! Transactional hierarchy index.
//!
//! Maps entity keys into a forest of ordered parent/child relations. The
//! index tolerates out-of-order construction: a child indexed before its
//! parent waits among the orphans and is attached, together with anything
//! placed under it meanwhile, once the parent becomes reachable.
//!
//! # Containers
//!
//! - item index: every indexed node, attached or orphaned
//! - roots: nodes without a parent, sorted by `(order, entity_key)`
//! - level index: sorted children of every attached node
//! - orphans: indexed nodes that are not reachable from the roots
//!
//! Each container lives in its own [`VersionedCell`](crate::VersionedCell),
//! so a commit republishes only what the transaction touched.
//!
//! # Reading
//!
//! [`HierarchyIndex::view`] gives a [`HierarchyView`] with the query
//! surface, [`HierarchyVisitor`] traversals and [`HierarchyView::verify`].

mod index;
mod node;
mod persistence;
mod query;
mod verify;
mod view;
mod visitor;

pub use index::HierarchyIndex;
pub use node::{HierarchyNode, ItemIndex, LevelIndex, NodeState, Roots};
pub use persistence::HierarchyStoragePart;
pub use query::HierarchyQuery;
pub use view::HierarchyView;
pub use visitor::{Descend, HierarchyVisitor};
