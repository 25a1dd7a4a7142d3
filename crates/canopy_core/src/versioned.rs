//! Versioned cells: per-object snapshot isolation.
//!
//! A [`VersionedCell`] holds an immutable committed base behind an `Arc`.
//! Writes go to a working copy owned by the writing [`Transaction`]; the
//! base is never mutated. At commit the working copy becomes the base of a
//! *new* cell with the same identity and the next version, leaving the old
//! cell (and every reader holding it) untouched.
//!
//! ```rust,ignore
//! let cell = VersionedCell::new(vec![1, 2]);
//! let mut txn = ctx.begin();
//! cell.write(&mut txn, |v| v.push(3))?;
//!
//! assert_eq!(cell.read(None), &vec![1, 2]);
//! assert_eq!(cell.read(Some(&txn)), &vec![1, 2, 3]);
//!
//! let mut set = ctx.commit(&mut txn)?;
//! let next = cell.merge_and_publish(&mut set)?;
//! assert_eq!(next.read(None), &vec![1, 2, 3]);
//! ```

use crate::error::{CoreError, CoreResult};
use crate::transaction::{CommitSet, Transaction};
use crate::types::{CellId, CellVersion};
use std::fmt;
use std::sync::Arc;

/// A committed value plus the machinery to overlay transactional writes.
pub struct VersionedCell<T> {
    id: CellId,
    version: u64,
    base: Arc<T>,
}

impl<T> VersionedCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cell with a fresh identity around a committed value.
    pub fn new(value: T) -> Self {
        Self {
            id: CellId::next(),
            version: 0,
            base: Arc::new(value),
        }
    }

    /// Returns the identity of this cell.
    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Returns the version of the committed base.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the identity and version of the committed base.
    #[must_use]
    pub fn cell_version(&self) -> CellVersion {
        CellVersion {
            cell: self.id,
            version: self.version,
        }
    }

    /// Returns the committed base, ignoring any transaction.
    #[must_use]
    pub fn base(&self) -> &T {
        &self.base
    }

    /// Reads the value as seen by `txn`.
    ///
    /// Without a transaction, or with one that never wrote this cell, the
    /// committed base is returned. Otherwise the transaction sees its own
    /// working copy.
    pub fn read<'a>(&'a self, txn: Option<&'a Transaction>) -> &'a T {
        txn.and_then(|txn| txn.layer::<T>(self.id))
            .unwrap_or(self.base.as_ref())
    }

    /// Applies a mutation to the transaction's working copy.
    ///
    /// The working copy is cloned from the base on first write.
    pub fn write<R, F>(&self, txn: &mut Transaction, mutation: F) -> CoreResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let base = &self.base;
        let layer = txn.layer_mut_or_insert_with(self.id, self.version, || T::clone(base))?;
        Ok(mutation(layer))
    }

    /// Produces the cell of the next generation.
    ///
    /// Takes this cell's overlay out of the commit set, if any. Untouched
    /// cells come back sharing the same base. An overlay cloned from a base
    /// other than this one means a concurrent commit replaced it, which is
    /// reported as a conflict rather than silently overwritten.
    pub fn merge_and_publish(&self, commit: &mut CommitSet) -> CoreResult<Self> {
        match commit.take::<T>(self.id)? {
            None => Ok(self.clone()),
            Some((base_version, _)) if base_version != self.version => {
                Err(CoreError::transaction_conflict(self.id))
            }
            Some((_, value)) => Ok(Self {
                id: self.id,
                version: self.version + 1,
                base: Arc::new(value),
            }),
        }
    }

    /// Drops the transaction's working copy; the base is untouched.
    pub fn discard(&self, txn: &mut Transaction) {
        txn.remove_layer(self.id);
    }
}

impl<T> Clone for VersionedCell<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            version: self.version,
            base: Arc::clone(&self.base),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for VersionedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedCell")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("base", &self.base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionContext;

    #[test]
    fn read_without_transaction_sees_base() {
        let cell = VersionedCell::new(vec![1, 2]);
        assert_eq!(cell.read(None), &vec![1, 2]);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn transaction_reads_its_own_writes() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(vec![1, 2]);
        let mut txn = ctx.begin();

        cell.write(&mut txn, |v| v.push(3)).unwrap();

        assert_eq!(cell.read(Some(&txn)), &vec![1, 2, 3]);
        assert_eq!(cell.read(None), &vec![1, 2]);
    }

    #[test]
    fn other_transactions_do_not_see_overlays() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(0_u32);
        let mut writer = ctx.begin();
        let reader = ctx.begin();

        cell.write(&mut writer, |v| *v = 9).unwrap();

        assert_eq!(cell.read(Some(&reader)), &0);
        assert_eq!(cell.read(Some(&writer)), &9);
    }

    #[test]
    fn merge_publishes_new_version_and_keeps_old() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(String::from("a"));
        let mut txn = ctx.begin();
        cell.write(&mut txn, |v| v.push('b')).unwrap();

        let mut set = ctx.commit(&mut txn).unwrap();
        let next = cell.merge_and_publish(&mut set).unwrap();

        assert_eq!(next.id(), cell.id());
        assert_eq!(next.version(), 1);
        assert_eq!(next.read(None), "ab");
        assert_eq!(cell.read(None), "a");
        assert!(set.is_empty());
    }

    #[test]
    fn untouched_cell_shares_base() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(vec![5_i32]);
        let mut txn = ctx.begin();
        let mut set = ctx.commit(&mut txn).unwrap();

        let next = cell.merge_and_publish(&mut set).unwrap();
        assert_eq!(next.version(), 0);
        assert!(Arc::ptr_eq(&next.base, &cell.base));
    }

    #[test]
    fn stale_overlay_conflicts() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(0_u32);

        let mut first = ctx.begin();
        let mut second = ctx.begin();
        cell.write(&mut first, |v| *v = 1).unwrap();
        cell.write(&mut second, |v| *v = 2).unwrap();

        let mut set = ctx.commit(&mut first).unwrap();
        let next = cell.merge_and_publish(&mut set).unwrap();

        let mut set = ctx.commit(&mut second).unwrap();
        let err = next.merge_and_publish(&mut set).unwrap_err();
        assert!(matches!(err, CoreError::TransactionConflict { cell: id } if id == cell.id()));
        assert_eq!(next.read(None), &1);
    }

    #[test]
    fn discard_drops_overlay() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(1_u8);
        let mut txn = ctx.begin();
        cell.write(&mut txn, |v| *v = 2).unwrap();

        cell.discard(&mut txn);
        assert_eq!(cell.read(Some(&txn)), &1);
        assert!(txn.touched_cells().is_empty());
    }

    #[test]
    fn write_requires_active_transaction() {
        let ctx = TransactionContext::new();
        let cell = VersionedCell::new(1_u8);
        let mut txn = ctx.begin();
        ctx.rollback(&mut txn).unwrap();

        assert!(cell.write(&mut txn, |v| *v = 2).is_err());
    }
}
