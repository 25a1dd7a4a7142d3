//! Structural verification of a hierarchy view.

use crate::error::{CoreError, CoreResult};
use crate::hierarchy::node::HierarchyNode;
use crate::hierarchy::view::HierarchyView;
use std::collections::HashSet;

impl HierarchyView<'_> {
    /// Checks every structural invariant of the index.
    ///
    /// - roots and children arrays list indexed nodes whose declared parent
    ///   matches, sorted by `(order, entity_key)`;
    /// - a key has a children record iff it is reachable from the roots;
    /// - a key is an orphan iff it is indexed and unreachable, and no orphan
    ///   has a parent that is attached (it would have been adopted);
    /// - the orphan set is strictly ascending;
    /// - `size_total == size_attached + size_orphans`.
    ///
    /// Returns the first breach found as [`CoreError::InvariantViolation`].
    pub fn verify(&self) -> CoreResult<()> {
        if !self.orphans.is_normalized() {
            return Err(breach("orphan set is not sorted and deduplicated".to_string()));
        }
        self.verify_siblings(None, self.roots)?;
        for (&parent, children) in self.levels {
            if !self.items.contains_key(&parent) {
                return Err(breach(format!("children record of unindexed node {parent}")));
            }
            self.verify_siblings(Some(parent), children)?;
        }

        let reachable = self.reachable()?;
        if reachable.len() != self.levels.len() {
            return Err(breach(format!(
                "{} nodes reachable but {} children records",
                reachable.len(),
                self.levels.len()
            )));
        }
        if let Some(key) = self.levels.keys().find(|key| !reachable.contains(key)) {
            return Err(breach(format!("unreachable node {key} has a children record")));
        }

        for key in self.orphans.iter() {
            let node = self
                .items
                .get(&key)
                .ok_or_else(|| breach(format!("orphan {key} is not indexed")))?;
            if reachable.contains(&key) {
                return Err(breach(format!("orphan {key} is reachable")));
            }
            match node.parent_key {
                None => return Err(breach(format!("root {key} is listed as orphan"))),
                Some(parent) if reachable.contains(&parent) => {
                    return Err(breach(format!(
                        "orphan {key} was not adopted by attached parent {parent}"
                    )))
                }
                Some(_) => {}
            }
        }

        if self.items.len() != reachable.len() + self.orphans.len() {
            return Err(breach(format!(
                "{} nodes indexed but {} attached and {} orphaned",
                self.items.len(),
                reachable.len(),
                self.orphans.len()
            )));
        }
        Ok(())
    }

    fn verify_siblings(&self, parent: Option<i32>, siblings: &[i32]) -> CoreResult<()> {
        let mut previous: Option<&HierarchyNode> = None;
        for key in siblings {
            let node = self
                .items
                .get(key)
                .ok_or_else(|| breach(format!("listed node {key} is not indexed")))?;
            if node.parent_key != parent {
                return Err(breach(format!(
                    "node {key} declares parent {:?} but is listed under {parent:?}",
                    node.parent_key
                )));
            }
            if let Some(previous) = previous {
                if previous.sort_key() >= node.sort_key() {
                    return Err(breach(format!(
                        "siblings {} and {key} are out of order",
                        previous.entity_key
                    )));
                }
            }
            previous = Some(node);
        }
        Ok(())
    }

    /// Keys reachable from the roots; a key met twice is a breach.
    fn reachable(&self) -> CoreResult<HashSet<i32>> {
        let mut seen = HashSet::with_capacity(self.levels.len());
        let mut stack: Vec<i32> = self.roots.clone();
        while let Some(key) = stack.pop() {
            if !seen.insert(key) {
                return Err(breach(format!("node {key} is reachable twice")));
            }
            match self.levels.get(&key) {
                Some(children) => stack.extend_from_slice(children),
                None => {
                    return Err(breach(format!(
                        "reachable node {key} has no children record"
                    )))
                }
            }
        }
        Ok(seen)
    }
}

fn breach(message: String) -> CoreError {
    CoreError::invariant_violation(message)
}

#[cfg(test)]
mod tests {
    use crate::bitmap::Bitmap;
    use crate::hierarchy::{HierarchyIndex, HierarchyNode};
    use std::collections::BTreeMap;

    fn build(
        nodes: &[HierarchyNode],
        roots: Vec<i32>,
        levels: &[(i32, Vec<i32>)],
        orphans: Vec<i32>,
    ) -> HierarchyIndex {
        HierarchyIndex::from_parts(
            roots,
            levels.iter().cloned().collect(),
            nodes.iter().map(|n| (n.entity_key, *n)).collect::<BTreeMap<_, _>>(),
            Bitmap::from(orphans),
        )
    }

    fn assert_breach(index: &HierarchyIndex) {
        let err = index.view(None).verify().unwrap_err();
        assert!(err.is_fatal(), "{err}");
    }

    #[test]
    fn consistent_index_passes() {
        let index = build(
            &[
                HierarchyNode::new(1, None, 0),
                HierarchyNode::new(2, Some(1), 0),
                HierarchyNode::new(3, Some(8), 0),
            ],
            vec![1],
            &[(1, vec![2]), (2, vec![])],
            vec![3],
        );
        index.view(None).verify().unwrap();
    }

    #[test]
    fn empty_index_passes() {
        HierarchyIndex::new().view(None).verify().unwrap();
    }

    #[test]
    fn unsorted_roots_fail() {
        let index = build(
            &[HierarchyNode::new(1, None, 5), HierarchyNode::new(2, None, 0)],
            vec![1, 2],
            &[(1, vec![]), (2, vec![])],
            vec![],
        );
        assert_breach(&index);
    }

    #[test]
    fn wrong_parent_fails() {
        let index = build(
            &[
                HierarchyNode::new(1, None, 0),
                HierarchyNode::new(2, Some(7), 0),
            ],
            vec![1],
            &[(1, vec![2]), (2, vec![])],
            vec![],
        );
        assert_breach(&index);
    }

    #[test]
    fn missing_children_record_fails() {
        let index = build(
            &[
                HierarchyNode::new(1, None, 0),
                HierarchyNode::new(2, Some(1), 0),
            ],
            vec![1],
            &[(1, vec![2])],
            vec![],
        );
        assert_breach(&index);
    }

    #[test]
    fn orphan_with_attached_parent_fails() {
        let index = build(
            &[
                HierarchyNode::new(1, None, 0),
                HierarchyNode::new(2, Some(1), 0),
            ],
            vec![1],
            &[(1, vec![])],
            vec![2],
        );
        assert_breach(&index);
    }

    #[test]
    fn unaccounted_node_fails() {
        let index = build(
            &[
                HierarchyNode::new(1, None, 0),
                HierarchyNode::new(2, Some(9), 0),
            ],
            vec![1],
            &[(1, vec![])],
            vec![],
        );
        assert_breach(&index);
    }

    #[test]
    fn unsorted_orphans_fail() {
        let index = HierarchyIndex::from_parts(
            vec![],
            BTreeMap::new(),
            [
                HierarchyNode::new(2, Some(1), 0),
                HierarchyNode::new(9, Some(1), 0),
            ]
            .into_iter()
            .map(|n| (n.entity_key, n))
            .collect(),
            Bitmap::from_raw(vec![9, 2]),
        );
        assert_breach(&index);
    }

    #[test]
    fn stray_children_record_fails() {
        let index = build(
            &[
                HierarchyNode::new(1, None, 0),
                HierarchyNode::new(2, Some(9), 0),
            ],
            vec![1],
            &[(1, vec![]), (2, vec![])],
            vec![2],
        );
        assert_breach(&index);
    }
}
