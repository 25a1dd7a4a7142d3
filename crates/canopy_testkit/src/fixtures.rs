//! Test fixtures and store helpers.

use crate::generators::HierarchyOp;
use canopy_core::{CoreError, CoreResult, HierarchyIndex, HierarchyStoragePart, HierarchyStore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Outcome of replaying a sequence of operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations that changed the index.
    pub applied: usize,
    /// Operations rejected as precondition violations.
    pub rejected: usize,
}

/// Applies `ops` in a single transaction and commits it.
///
/// Precondition violations (self-parenting, removing an absent key) are
/// counted and skipped; anything else aborts the replay.
pub fn replay(store: &HierarchyStore, ops: &[HierarchyOp]) -> CoreResult<ReplaySummary> {
    let index = store.current();
    let mut txn = store.begin();
    let mut summary = ReplaySummary::default();
    for op in ops {
        match op.apply(&index, &mut txn) {
            Ok(()) => summary.applied += 1,
            Err(CoreError::SelfParenting { .. } | CoreError::NodeNotFound { .. }) => {
                summary.rejected += 1
            }
            Err(err) => {
                store.rollback(&mut txn)?;
                return Err(err);
            }
        }
    }
    store.commit(&mut txn)?;
    Ok(summary)
}

/// Creates a store and replays `ops` into it.
pub fn store_with(ops: &[HierarchyOp]) -> CoreResult<HierarchyStore> {
    let store = HierarchyStore::new(HierarchyIndex::new());
    replay(&store, ops)?;
    Ok(store)
}

/// A small forest with one orphan:
///
/// ```text
/// 10           40
/// ├── 20       └── 50
/// │   └── 25
/// └── 30
/// 70 -> 60 (missing)
/// ```
pub fn sample_forest() -> CoreResult<HierarchyStore> {
    store_with(&sample_forest_ops())
}

/// The operations building [`sample_forest`], children before parents.
pub fn sample_forest_ops() -> Vec<HierarchyOp> {
    let set = |key, parent, order| HierarchyOp::Set { key, parent, order };
    vec![
        set(25, Some(20), 0),
        set(50, Some(40), 0),
        set(20, Some(10), 1),
        set(30, Some(10), 2),
        set(70, Some(60), 0),
        set(10, None, 1),
        set(40, None, 2),
    ]
}

/// A storage part written to a temporary directory.
pub struct TempPart {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TempPart {
    /// Encodes `part` into a fresh temporary file.
    pub fn write(part: &HierarchyStoragePart) -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("hierarchy.chix");
        let bytes = part
            .to_bytes()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(&path, bytes)?;
        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_forest_shape() {
        let store = sample_forest().unwrap();
        let index = store.current();
        let view = index.view(None);
        assert_eq!(view.root_keys(), &[10, 40]);
        assert_eq!(view.list_nodes_from_root(&[]), vec![10, 20, 25, 30, 40, 50]);
        assert_eq!(view.orphans().as_slice(), &[70]);
    }

    #[test]
    fn replay_counts_rejections() {
        let store = HierarchyStore::new(HierarchyIndex::new());
        let summary = replay(
            &store,
            &[
                HierarchyOp::Set {
                    key: 1,
                    parent: Some(1),
                    order: 0,
                },
                HierarchyOp::Remove { key: 3 },
                HierarchyOp::Set {
                    key: 1,
                    parent: None,
                    order: 0,
                },
            ],
        )
        .unwrap();
        assert_eq!(summary, ReplaySummary { applied: 1, rejected: 2 });
        assert_eq!(store.current().view(None).size_total(), 1);
    }

    #[test]
    fn temp_part_holds_encoded_bytes() {
        let store = sample_forest().unwrap();
        let part = store.current().create_storage_part(1).unwrap();
        let file = TempPart::write(&part).unwrap();

        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(HierarchyStoragePart::from_bytes(&bytes).unwrap(), part);
    }
}
