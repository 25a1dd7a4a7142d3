//! Benchmark utilities.

use canopy_core::{HierarchyIndex, HierarchyStore};
use canopy_testkit::{replay, HierarchyOp};

/// Operations building a complete tree of `count` nodes with the given fanout.
///
/// Node 0 is the only root. Siblings are ordered by key. Keys are issued in
/// descending order so every node arrives before its parent and is adopted
/// later.
pub fn reverse_tree_ops(count: usize, fanout: usize) -> Vec<HierarchyOp> {
    (0..count)
        .rev()
        .map(|i| HierarchyOp::Set {
            key: i as i32,
            parent: (i > 0).then(|| ((i - 1) / fanout) as i32),
            order: (i.saturating_sub(1) % fanout) as i32,
        })
        .collect()
}

/// Same tree as [`reverse_tree_ops`], parents first.
pub fn forward_tree_ops(count: usize, fanout: usize) -> Vec<HierarchyOp> {
    let mut ops = reverse_tree_ops(count, fanout);
    ops.reverse();
    ops
}

/// Store holding a committed complete tree.
pub fn tree_store(count: usize, fanout: usize) -> HierarchyStore {
    let store = HierarchyStore::new(HierarchyIndex::new());
    if let Err(err) = replay(&store, &forward_tree_ops(count, fanout)) {
        panic!("building benchmark tree failed: {err}");
    }
    store
}
