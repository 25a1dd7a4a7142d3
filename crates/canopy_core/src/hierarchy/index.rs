//! Transactional hierarchy index.

use crate::bitmap::Bitmap;
use crate::error::{CoreError, CoreResult};
use crate::hierarchy::node::{
    sibling_position, sort_by_placement, HierarchyNode, ItemIndex, LevelIndex, Roots,
};
use crate::hierarchy::persistence::HierarchyStoragePart;
use crate::hierarchy::view::HierarchyView;
use crate::transaction::{CommitSet, Generational, Transaction};
use crate::types::{CellVersion, IndexId};
use crate::versioned::VersionedCell;
use tracing::{debug, trace};

/// Parent/child tree over integer entity keys.
///
/// The index accepts nodes in any order. A node whose parent is not yet
/// reachable from the roots is parked among the orphans, together with
/// anything later placed under it, and attached as soon as the missing
/// ancestor appears.
///
/// Mutations take a [`Transaction`] and only touch its overlays. Reads go
/// through a [`HierarchyView`] obtained from [`view`](Self::view).
///
/// # Example
///
/// ```rust,ignore
/// let store = HierarchyStore::new(HierarchyIndex::new());
/// store.transaction(|txn, index| {
///     index.set_hierarchy_for(txn, 5, Some(1), 0)?; // parked as orphan
///     index.set_hierarchy_for(txn, 1, None, 0)?;    // adopts 5
///     Ok(())
/// })?;
///
/// let index = store.current();
/// assert_eq!(index.view(None).children_of(1), &[5]);
/// ```
#[derive(Debug, Clone)]
pub struct HierarchyIndex {
    id: IndexId,
    dirty: VersionedCell<bool>,
    items: VersionedCell<ItemIndex>,
    roots: VersionedCell<Roots>,
    levels: VersionedCell<LevelIndex>,
    orphans: VersionedCell<Bitmap>,
}

impl HierarchyIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::from_parts(
            Roots::new(),
            LevelIndex::new(),
            ItemIndex::new(),
            Bitmap::new(),
        )
    }

    /// Reconstructs an index from persisted containers as-is.
    ///
    /// Nothing is recomputed or re-sorted; the containers must come from a
    /// consistent snapshot. The result is not dirty.
    pub fn from_parts(
        roots: Roots,
        level_index: LevelIndex,
        item_index: ItemIndex,
        orphans: Bitmap,
    ) -> Self {
        Self {
            id: IndexId::next(),
            dirty: VersionedCell::new(false),
            items: VersionedCell::new(item_index),
            roots: VersionedCell::new(roots),
            levels: VersionedCell::new(level_index),
            orphans: VersionedCell::new(orphans),
        }
    }

    /// Reconstructs an index from a storage part.
    pub fn from_storage_part(part: HierarchyStoragePart) -> Self {
        Self::from_parts(part.roots, part.level_index, part.item_index, part.orphans)
    }

    /// Returns the stable identity shared by all generations of this index.
    #[must_use]
    pub fn id(&self) -> IndexId {
        self.id
    }

    /// Returns the identity and version of the roots container.
    #[must_use]
    pub fn roots_id(&self) -> CellVersion {
        self.roots.cell_version()
    }

    /// Returns the identity and version of the level index container.
    #[must_use]
    pub fn levels_id(&self) -> CellVersion {
        self.levels.cell_version()
    }

    /// Returns a read-only view as seen by `txn`, or the committed state.
    pub fn view<'a>(&'a self, txn: Option<&'a Transaction>) -> HierarchyView<'a> {
        HierarchyView::new(
            self.items.read(txn),
            self.roots.read(txn),
            self.levels.read(txn),
            self.orphans.read(txn),
            *self.dirty.read(txn),
        )
    }

    /// Returns true if the committed state changed since the last reset.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        *self.dirty.base()
    }

    /// Places `key` under `parent_key` at sibling position `order`.
    ///
    /// An existing placement of `key` is removed first, which orphans its
    /// former subtree; the subtree is re-adopted if `key` lands somewhere
    /// reachable. Declaring a node its own parent is rejected without any
    /// change.
    pub fn set_hierarchy_for(
        &self,
        txn: &mut Transaction,
        key: i32,
        parent_key: Option<i32>,
        order: i32,
    ) -> CoreResult<()> {
        if parent_key == Some(key) {
            return Err(CoreError::self_parenting(key));
        }
        txn.ensure_active()?;

        if self.items.read(Some(txn)).contains_key(&key) {
            self.remove_internal(txn, key)?;
        }

        let node = HierarchyNode::new(key, parent_key, order);
        self.items.write(txn, |items| {
            items.insert(key, node);
        })?;
        self.mark_dirty(txn)?;

        match parent_key {
            None => {
                self.insert_root(txn, &node)?;
                self.adopt_orphans(txn, key)?;
                trace!(key, order, "root placed");
            }
            Some(parent) if self.levels.read(Some(txn)).contains_key(&parent) => {
                self.insert_child(txn, parent, &node)?;
                self.adopt_orphans(txn, key)?;
                trace!(key, parent, order, "node attached");
            }
            Some(parent) => {
                self.orphans.write(txn, |orphans| {
                    orphans.insert(key);
                })?;
                trace!(key, parent, order, "node parked as orphan");
            }
        }
        Ok(())
    }

    /// Removes the placement of `key`.
    ///
    /// Every attached descendant becomes an orphan. Removing a key that is
    /// not indexed is rejected without any change.
    pub fn remove_hierarchy_for(&self, txn: &mut Transaction, key: i32) -> CoreResult<()> {
        txn.ensure_active()?;
        if !self.items.read(Some(txn)).contains_key(&key) {
            return Err(CoreError::node_not_found(key));
        }
        self.remove_internal(txn, key)?;
        trace!(key, "node removed");
        Ok(())
    }

    /// Clears the dirty flag after the committed state was persisted.
    pub fn reset_dirty(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.dirty.write(txn, |dirty| *dirty = false)
    }

    /// Returns a persistable snapshot of the committed state, or `None` if
    /// nothing changed since the last reset.
    pub fn create_storage_part(&self, index_id: u32) -> Option<HierarchyStoragePart> {
        if !self.is_dirty() {
            return None;
        }
        Some(HierarchyStoragePart {
            index_id,
            item_index: self.items.base().clone(),
            roots: self.roots.base().clone(),
            level_index: self.levels.base().clone(),
            orphans: self.orphans.base().clone(),
        })
    }

    fn mark_dirty(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.dirty.write(txn, |dirty| *dirty = true)
    }

    fn insert_root(&self, txn: &mut Transaction, node: &HierarchyNode) -> CoreResult<()> {
        let position = sibling_position(
            self.roots.read(Some(txn)),
            self.items.read(Some(txn)),
            node,
        )?;
        match position {
            Ok(_) => Err(CoreError::invariant_violation(format!(
                "root {} is already listed",
                node.entity_key
            ))),
            Err(pos) => self
                .roots
                .write(txn, |roots| roots.insert(pos, node.entity_key)),
        }
    }

    fn insert_child(
        &self,
        txn: &mut Transaction,
        parent: i32,
        node: &HierarchyNode,
    ) -> CoreResult<()> {
        let levels = self.levels.read(Some(txn));
        let siblings = levels.get(&parent).map_or(&[][..], Vec::as_slice);
        match sibling_position(siblings, self.items.read(Some(txn)), node)? {
            Ok(_) => Err(CoreError::invariant_violation(format!(
                "node {} is already a child of {parent}",
                node.entity_key
            ))),
            Err(pos) => self.levels.write(txn, |levels| {
                levels
                    .entry(parent)
                    .or_default()
                    .insert(pos, node.entity_key);
            }),
        }
    }

    /// Attaches the orphans waiting for `key`, and transitively theirs.
    ///
    /// Each attached node gets its children record here, even when empty.
    fn adopt_orphans(&self, txn: &mut Transaction, key: i32) -> CoreResult<()> {
        let mut pending = vec![key];
        let mut adopted = 0usize;

        while let Some(parent) = pending.pop() {
            let mut children = {
                let items = self.items.read(Some(txn));
                let mut children = Vec::new();
                for orphan in self.orphans.read(Some(txn)).iter() {
                    let node = items.get(&orphan).ok_or_else(|| {
                        CoreError::invariant_violation(format!("orphan {orphan} is not indexed"))
                    })?;
                    if node.parent_key == Some(parent) {
                        children.push(orphan);
                    }
                }
                children
            };
            sort_by_placement(&mut children, self.items.read(Some(txn)))?;

            if !children.is_empty() {
                self.orphans.write(txn, |orphans| {
                    for child in &children {
                        orphans.remove(*child);
                    }
                })?;
                adopted += children.len();
                pending.extend_from_slice(&children);
            }

            let previous = self.levels.write(txn, |levels| levels.insert(parent, children))?;
            if previous.is_some() {
                return Err(CoreError::invariant_violation(format!(
                    "node {parent} was attached twice"
                )));
            }
        }

        if adopted > 0 {
            debug!(key, adopted, "orphans adopted");
        }
        Ok(())
    }

    /// Detaches `key`, orphans its subtree and drops it from the item index.
    fn remove_internal(&self, txn: &mut Transaction, key: i32) -> CoreResult<HierarchyNode> {
        let node = *self
            .items
            .read(Some(txn))
            .get(&key)
            .ok_or_else(|| CoreError::node_not_found(key))?;

        match node.parent_key {
            None => self.detach_root(txn, &node)?,
            Some(parent) if self.levels.read(Some(txn)).contains_key(&parent) => {
                self.detach_child(txn, parent, &node)?
            }
            Some(_) => {
                let removed = self.orphans.write(txn, |orphans| orphans.remove(key))?;
                if !removed {
                    return Err(CoreError::invariant_violation(format!(
                        "node {key} is neither attached nor orphaned"
                    )));
                }
            }
        }

        let former_children = self.levels.write(txn, |levels| levels.remove(&key))?;
        if let Some(children) = former_children {
            self.orphan_subtree(txn, children)?;
        }

        self.items.write(txn, |items| {
            items.remove(&key);
        })?;
        self.mark_dirty(txn)?;
        Ok(node)
    }

    fn detach_root(&self, txn: &mut Transaction, node: &HierarchyNode) -> CoreResult<()> {
        let position = sibling_position(
            self.roots.read(Some(txn)),
            self.items.read(Some(txn)),
            node,
        )?;
        match position {
            Ok(pos) => self.roots.write(txn, |roots| {
                roots.remove(pos);
            }),
            Err(_) => Err(CoreError::invariant_violation(format!(
                "root {} is missing from the root list",
                node.entity_key
            ))),
        }
    }

    fn detach_child(
        &self,
        txn: &mut Transaction,
        parent: i32,
        node: &HierarchyNode,
    ) -> CoreResult<()> {
        let levels = self.levels.read(Some(txn));
        let siblings = levels.get(&parent).map_or(&[][..], Vec::as_slice);
        match sibling_position(siblings, self.items.read(Some(txn)), node)? {
            Ok(pos) => self.levels.write(txn, |levels| {
                if let Some(children) = levels.get_mut(&parent) {
                    children.remove(pos);
                }
            }),
            Err(_) => Err(CoreError::invariant_violation(format!(
                "node {} is missing from the children of {parent}",
                node.entity_key
            ))),
        }
    }

    /// Moves a detached subtree into the orphan set, dropping its records.
    fn orphan_subtree(&self, txn: &mut Transaction, children: Vec<i32>) -> CoreResult<()> {
        let mut pending = children;
        let mut orphaned = Vec::new();

        while let Some(child) = pending.pop() {
            orphaned.push(child);
            let grandchildren = self.levels.write(txn, |levels| levels.remove(&child))?;
            match grandchildren {
                Some(grandchildren) => pending.extend(grandchildren),
                None => {
                    return Err(CoreError::invariant_violation(format!(
                        "attached node {child} has no children record"
                    )))
                }
            }
        }

        if !orphaned.is_empty() {
            debug!(count = orphaned.len(), "subtree orphaned");
            self.orphans.write(txn, |orphans| {
                for key in orphaned {
                    orphans.insert(key);
                }
            })?;
        }
        Ok(())
    }
}

impl Default for HierarchyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Generational for HierarchyIndex {
    fn cell_versions(&self) -> Vec<CellVersion> {
        vec![
            self.dirty.cell_version(),
            self.items.cell_version(),
            self.roots.cell_version(),
            self.levels.cell_version(),
            self.orphans.cell_version(),
        ]
    }

    fn verify(&self, txn: &Transaction) -> CoreResult<()> {
        self.view(Some(txn)).verify()
    }

    /// Publishes every touched container; untouched ones are shared.
    fn merge_generation(&self, commit: &mut CommitSet) -> CoreResult<Self> {
        Ok(Self {
            id: self.id,
            dirty: self.dirty.merge_and_publish(commit)?,
            items: self.items.merge_and_publish(commit)?,
            roots: self.roots.merge_and_publish(commit)?,
            levels: self.levels.merge_and_publish(commit)?,
            orphans: self.orphans.merge_and_publish(commit)?,
        })
    }
}
