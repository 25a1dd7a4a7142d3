//! Transaction context.

use crate::error::{CoreError, CoreResult};
use crate::transaction::state::{Layer, Transaction};
use crate::types::{CellId, TransactionId};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Tracks active transactions and drives commit and rollback generically.
///
/// The context never touches committed data. Commit hands back the drained
/// overlays as a [`CommitSet`]; turning those into a new generation is the
/// job of whoever owns the cells (see
/// [`Generational`](crate::transaction::Generational)).
pub struct TransactionContext {
    /// Next transaction ID.
    next_txid: AtomicU64,
    /// Active transactions.
    active_txns: RwLock<Vec<TransactionId>>,
}

impl TransactionContext {
    /// Creates a new transaction context.
    pub fn new() -> Self {
        Self {
            next_txid: AtomicU64::new(1),
            active_txns: RwLock::new(Vec::new()),
        }
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> Transaction {
        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        self.active_txns.write().push(txid);
        debug!(%txid, "transaction started");
        Transaction::new(txid)
    }

    /// Commits a transaction, returning its overlays.
    ///
    /// The transaction is finished afterwards whether or not the caller
    /// manages to publish the returned set.
    pub fn commit(&self, txn: &mut Transaction) -> CoreResult<CommitSet> {
        self.ensure_tracked(txn)?;

        let txid = txn.id();
        let layers = match txn.take_layers() {
            Ok(layers) => layers,
            Err(err) => {
                self.finish(txn, false);
                return Err(err);
            }
        };
        self.finish(txn, true);
        debug!(%txid, cells = layers.len(), "transaction committed");

        Ok(CommitSet {
            transaction_id: txid,
            layers,
        })
    }

    /// Rolls back a transaction.
    ///
    /// All overlays are discarded. Committed bases were never touched, so
    /// nothing else needs undoing.
    pub fn rollback(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.ensure_tracked(txn)?;

        let discarded = txn.touched_cells().len();
        txn.clear_layers();
        self.finish(txn, false);
        debug!(txid = %txn.id(), discarded, "transaction rolled back");
        Ok(())
    }

    /// Returns the number of active transactions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_txns.read().len()
    }

    fn ensure_tracked(&self, txn: &Transaction) -> CoreResult<()> {
        txn.ensure_active()?;
        if !self.active_txns.read().contains(&txn.id()) {
            return Err(CoreError::invalid_operation(format!(
                "{} does not belong to this context",
                txn.id()
            )));
        }
        Ok(())
    }

    fn finish(&self, txn: &mut Transaction, committed: bool) {
        let txid = txn.id();
        self.active_txns.write().retain(|&id| id != txid);
        if committed {
            txn.mark_committed();
        } else {
            txn.mark_aborted();
        }
    }
}

impl Default for TransactionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("active_count", &self.active_count())
            .finish_non_exhaustive()
    }
}

/// The overlays of a committed transaction, waiting to be merged.
///
/// Each versioned cell takes its own overlay out during
/// [`merge_and_publish`](crate::versioned::VersionedCell::merge_and_publish).
/// A set that still holds overlays after a generation was merged belongs to
/// cells the generation does not know about, which is a programming error.
pub struct CommitSet {
    transaction_id: TransactionId,
    layers: HashMap<CellId, Layer>,
}

impl CommitSet {
    /// Returns the ID of the transaction the overlays came from.
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Returns the number of overlays not yet merged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if every overlay was merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns true if the set holds an overlay for the cell.
    #[must_use]
    pub fn contains(&self, cell: CellId) -> bool {
        self.layers.contains_key(&cell)
    }

    /// Removes the overlay of a cell, returning its base version and value.
    pub(crate) fn take<T: Any>(&mut self, cell: CellId) -> CoreResult<Option<(u64, T)>> {
        let Some(layer) = self.layers.remove(&cell) else {
            return Ok(None);
        };
        let base_version = layer.base_version;
        layer
            .value
            .downcast::<T>()
            .map(|value| Some((base_version, *value)))
            .map_err(|_| {
                CoreError::invariant_violation(format!("overlay of {cell} has an unexpected type"))
            })
    }

    /// Fails if any overlay was left unmerged.
    pub fn ensure_consumed(&self) -> CoreResult<()> {
        if self.layers.is_empty() {
            return Ok(());
        }
        let mut cells: Vec<_> = self.layers.keys().map(ToString::to_string).collect();
        cells.sort();
        Err(CoreError::invariant_violation(format!(
            "{} left unmerged overlays for {}",
            self.transaction_id,
            cells.join(", ")
        )))
    }
}

impl fmt::Debug for CommitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitSet")
            .field("transaction_id", &self.transaction_id)
            .field("pending", &self.layers.len())
            .finish()
    }
}
