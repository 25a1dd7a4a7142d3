//! Formulas over a published hierarchy generation.

use crate::bitmap::Bitmap;
use crate::config::CostModel;
use crate::formula::Formula;
use crate::hierarchy::{HierarchyIndex, HierarchyQuery};
use crate::store::GenerationStore;
use crate::types::CellVersion;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A hierarchy query bound to one published generation.
///
/// Holding the generation keeps its containers alive, so the result is the
/// same however late it is computed.
pub struct HierarchyFormula {
    index: Arc<HierarchyIndex>,
    query: HierarchyQuery,
    cost_model: CostModel,
    result: OnceLock<Bitmap>,
}

impl HierarchyFormula {
    /// Binds `query` to a generation.
    pub fn new(index: Arc<HierarchyIndex>, query: HierarchyQuery, cost_model: CostModel) -> Self {
        Self {
            index,
            query,
            cost_model,
            result: OnceLock::new(),
        }
    }

    /// Returns the bound query.
    pub fn query(&self) -> &HierarchyQuery {
        &self.query
    }

    /// Returns true once the result has been materialized.
    pub fn is_computed(&self) -> bool {
        self.result.get().is_some()
    }

    /// Counts the result, without materializing it if not yet computed.
    pub fn count(&self) -> usize {
        match self.result.get() {
            Some(result) => result.len(),
            None => self.query.count(&self.index.view(None)),
        }
    }

    /// Full SHA-256 digest the cache key is taken from.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"hierarchy:");
        hasher.update(self.query.kind().as_bytes());
        match &self.query {
            HierarchyQuery::FromRoot { levels, excluded } => {
                update_levels(&mut hasher, *levels);
                update_keys(&mut hasher, excluded);
            }
            HierarchyQuery::FromParent {
                parent,
                including_parent,
                levels,
                excluded,
            } => {
                hasher.update(parent.to_be_bytes());
                hasher.update([u8::from(*including_parent)]);
                update_levels(&mut hasher, *levels);
                update_keys(&mut hasher, excluded);
            }
            HierarchyQuery::Children { parent, excluded } => {
                hasher.update(parent.to_be_bytes());
                update_keys(&mut hasher, excluded);
            }
            HierarchyQuery::ParentPath {
                key,
                including_itself,
            } => {
                hasher.update(key.to_be_bytes());
                hasher.update([u8::from(*including_itself)]);
            }
        }
        hasher.update(self.index.id().as_u64().to_be_bytes());
        for cv in self.transactional_ids() {
            hasher.update(cv.cell.as_u64().to_be_bytes());
            hasher.update(cv.version.to_be_bytes());
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        digest
    }

    /// Nodes the query may visit before it is computed.
    fn scope(&self) -> usize {
        let view = self.index.view(None);
        match &self.query {
            HierarchyQuery::FromRoot { .. } | HierarchyQuery::FromParent { .. } => {
                view.size_attached()
            }
            HierarchyQuery::Children { parent, .. } => view.children_of(*parent).len(),
            HierarchyQuery::ParentPath { key, .. } => view.count_parent_path(*key) + 1,
        }
    }
}

fn update_levels(hasher: &mut Sha256, levels: Option<u32>) {
    match levels {
        Some(levels) => {
            hasher.update([1u8]);
            hasher.update(levels.to_be_bytes());
        }
        None => hasher.update([0u8]),
    }
}

fn update_keys(hasher: &mut Sha256, keys: &[i32]) {
    hasher.update((keys.len() as u64).to_be_bytes());
    for key in keys {
        hasher.update(key.to_be_bytes());
    }
}

impl Formula for HierarchyFormula {
    fn compute(&self) -> &Bitmap {
        self.result.get_or_init(|| {
            self.query
                .execute(&self.index.view(None))
                .into_iter()
                .collect()
        })
    }

    fn estimated_cost(&self) -> u64 {
        self.scope() as u64 * self.cost_model.estimate_per_node + self.cost_model.materialization
    }

    fn cost(&self) -> u64 {
        self.compute().len() as u64 * self.cost_model.compute_per_key
            + self.cost_model.materialization
    }

    fn hash(&self) -> u64 {
        let digest = self.digest();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }

    fn transactional_ids(&self) -> Vec<CellVersion> {
        vec![self.index.roots_id(), self.index.levels_id()]
    }
}

impl fmt::Debug for HierarchyFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchyFormula")
            .field("index", &self.index.id())
            .field("query", &self.query)
            .field("computed", &self.is_computed())
            .finish()
    }
}

impl GenerationStore<HierarchyIndex> {
    /// Binds `query` to the currently published generation.
    pub fn formula(&self, query: HierarchyQuery) -> HierarchyFormula {
        HierarchyFormula::new(self.current(), query, self.config().cost_model)
    }
}
