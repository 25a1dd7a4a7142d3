//! Property tests: the hierarchy index against the reference model.

use canopy_core::{HierarchyIndex, HierarchyStoragePart, HierarchyStore, NodeState};
use canopy_testkit::prelude::*;
use proptest::prelude::*;

/// Replays `ops` one commit at a time, checking the model after each.
fn replay_and_compare(
    ops: &[HierarchyOp],
) -> Result<(HierarchyStore, ReferenceModel), TestCaseError> {
    let store = HierarchyStore::new(HierarchyIndex::new());
    let mut model = ReferenceModel::new();

    for op in ops {
        let expected = model.apply(op);
        let actual = store.transaction(|txn, index| op.apply(index, txn));
        prop_assert_eq!(expected.is_ok(), actual.is_ok(), "{:?}: {:?}", op, actual);

        let index = store.current();
        let view = index.view(None);
        let (roots, orphans) = (model.roots(), model.orphans());
        prop_assert_eq!(view.root_keys(), roots.as_slice());
        prop_assert_eq!(view.orphans().as_slice(), orphans.as_slice());
        prop_assert_eq!(view.size_total(), model.len());
    }
    Ok((store, model))
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn index_matches_model(ops in op_sequence_strategy(1, 80)) {
        let (store, model) = replay_and_compare(&ops)?;
        let index = store.current();
        let view = index.view(None);

        prop_assert_eq!(view.list_nodes_from_root(&[]), model.list_from_root(None, &[]));
        for key in 0..=MAX_KEY {
            let children = model.children_of(key);
            prop_assert_eq!(view.children_of(key), children.as_slice());
            prop_assert_eq!(view.parent_path_including_itself(key), model.path(key));
            let expected_state = if !view.contains(key) {
                NodeState::Absent
            } else if model.attached().contains(&key) {
                NodeState::Attached
            } else {
                NodeState::Orphan
            };
            prop_assert_eq!(view.state_of(key), expected_state);
        }
    }

    #[test]
    fn sizes_add_up(ops in op_sequence_strategy(1, 80)) {
        let store = store_with(&ops).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let index = store.current();
        let view = index.view(None);

        prop_assert_eq!(view.size_attached() + view.size_orphans(), view.size_total());
        prop_assert_eq!(view.count_nodes_from_root(&[]), view.size_attached());
        for key in view.orphans().iter() {
            prop_assert!(!view.is_attached(key));
        }
        prop_assert!(view.verify().is_ok());
    }

    #[test]
    fn shuffled_tree_converges(ops in shuffled_tree_strategy(40)) {
        let store = store_with(&ops).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let index = store.current();
        let view = index.view(None);

        prop_assert!(view.orphans().is_empty());
        prop_assert_eq!(view.size_attached(), ops.len());
    }

    #[test]
    fn exclusion_removes_whole_subtrees(
        ops in op_sequence_strategy(1, 60),
        excluded in prop::collection::vec(key_strategy(), 0..4),
        levels in prop::option::of(0u32..4),
    ) {
        let (store, model) = replay_and_compare(&ops)?;
        let index = store.current();
        let view = index.view(None);

        let listed = match levels {
            Some(levels) => view.list_nodes_from_root_down_to(levels, &excluded),
            None => view.list_nodes_from_root(&excluded),
        };
        prop_assert_eq!(&listed, &model.list_from_root(levels, &excluded));
        for key in &listed {
            let path = view.parent_path_including_itself(*key);
            prop_assert!(path.iter().all(|k| !excluded.contains(k)));
        }

        for parent in 0..=MAX_KEY {
            for including in [false, true] {
                let listed = match (including, levels) {
                    (false, None) => view.list_nodes_from_parent(parent, &excluded),
                    (true, None) => view.list_nodes_from_parent_including_itself(parent, &excluded),
                    (false, Some(l)) => view.list_nodes_from_parent_down_to(parent, l, &excluded),
                    (true, Some(l)) => {
                        view.list_nodes_from_parent_including_itself_down_to(parent, l, &excluded)
                    }
                };
                prop_assert_eq!(
                    listed,
                    model.list_from_parent(parent, including, levels, &excluded)
                );
            }
        }
    }

    #[test]
    fn zero_levels_is_roots(ops in op_sequence_strategy(1, 60)) {
        let store = store_with(&ops).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let index = store.current();
        let view = index.view(None);
        prop_assert_eq!(view.list_nodes_from_root_down_to(0, &[]), view.root_keys().to_vec());
    }

    #[test]
    fn storage_part_round_trips(ops in op_sequence_strategy(1, 60)) {
        let store = store_with(&ops).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let index = store.current();
        let Some(part) = index.create_storage_part(7) else {
            prop_assert_eq!(index.view(None).size_total(), 0);
            return Ok(());
        };

        let bytes = part.to_bytes().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decoded = HierarchyStoragePart::from_bytes(&bytes)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&decoded, &part);

        let rebuilt = HierarchyIndex::from_storage_part(decoded);
        let (before, after) = (index.view(None), rebuilt.view(None));
        prop_assert_eq!(before.root_keys(), after.root_keys());
        prop_assert_eq!(before.list_nodes_from_root(&[]), after.list_nodes_from_root(&[]));
        prop_assert_eq!(before.orphans(), after.orphans());
        prop_assert!(after.verify().is_ok());
    }

    #[test]
    fn rolled_back_work_is_invisible(
        committed in op_sequence_strategy(1, 40),
        abandoned in op_sequence_strategy(1, 40),
    ) {
        let store = store_with(&committed).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let before = store.current();

        let mut txn = store.begin();
        for op in &abandoned {
            let _ = op.apply(&before, &mut txn);
        }
        store.rollback(&mut txn).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let after = store.current();
        prop_assert!(std::sync::Arc::ptr_eq(&before, &after));
        prop_assert_eq!(
            before.view(None).list_nodes_from_root(&[]),
            after.view(None).list_nodes_from_root(&[])
        );
    }
}

#[test]
fn out_of_order_scenario() {
    let store = store_with(&[
        HierarchyOp::Set {
            key: 5,
            parent: Some(1),
            order: 0,
        },
        HierarchyOp::Set {
            key: 1,
            parent: None,
            order: 0,
        },
    ])
    .unwrap();
    let index = store.current();
    let view = index.view(None);
    assert_eq!(view.root_keys(), &[1]);
    assert_eq!(view.children_of(1), &[5]);
    assert!(view.orphans().is_empty());
}

#[test]
fn cascading_removal_scenario() {
    let store = store_with(&[
        HierarchyOp::Set {
            key: 1,
            parent: None,
            order: 0,
        },
        HierarchyOp::Set {
            key: 2,
            parent: Some(1),
            order: 0,
        },
        HierarchyOp::Set {
            key: 3,
            parent: Some(2),
            order: 0,
        },
    ])
    .unwrap();
    replay(&store, &[HierarchyOp::Remove { key: 2 }]).unwrap();

    let index = store.current();
    let view = index.view(None);
    assert_eq!(view.orphans().as_slice(), &[3]);
    assert_eq!(view.root_keys(), &[1]);
    assert!(view.children_of(1).is_empty());
    assert!(!view.contains(2));
}
