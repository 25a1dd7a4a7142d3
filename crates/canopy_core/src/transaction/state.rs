//! Transaction state.

use crate::error::{CoreError, CoreResult};
use crate::types::{CellId, TransactionId};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    Aborted,
}

/// A transaction-local working copy of one versioned cell.
#[derive(Debug)]
pub(crate) struct Layer {
    /// Version of the cell base the working copy was cloned from.
    pub(crate) base_version: u64,
    /// The working copy itself.
    pub(crate) value: Box<dyn Any + Send + Sync>,
}

/// An active transaction.
///
/// The transaction owns one overlay per versioned cell it has written to.
/// Overlays are private: they are only visible through reads that pass this
/// transaction, and they disappear on commit (moved into a
/// [`CommitSet`](crate::transaction::CommitSet)) or rollback (dropped).
pub struct Transaction {
    /// Transaction ID.
    id: TransactionId,
    /// Current state.
    state: TransactionState,
    /// Overlays keyed by cell identity.
    layers: HashMap<CellId, Layer>,
    /// Cells registered as written, in first-write order.
    touched: Vec<CellId>,
}

impl Transaction {
    /// Creates a new transaction.
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            layers: HashMap::new(),
            touched: Vec::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the cells this transaction has written to.
    #[must_use]
    pub fn touched_cells(&self) -> &[CellId] {
        &self.touched
    }

    /// Returns true if the transaction holds an overlay for the cell.
    #[must_use]
    pub fn has_layer(&self, cell: CellId) -> bool {
        self.layers.contains_key(&cell)
    }

    /// Iterates the base version each overlay was cloned from.
    pub(crate) fn layer_base_versions(&self) -> impl Iterator<Item = (CellId, u64)> + '_ {
        self.layers
            .iter()
            .map(|(cell, layer)| (*cell, layer.base_version))
    }

    /// Returns the overlay of a cell, if one was created.
    pub(crate) fn layer<T: Any>(&self, cell: CellId) -> Option<&T> {
        self.layers
            .get(&cell)
            .and_then(|layer| layer.value.downcast_ref::<T>())
    }

    /// Returns the overlay of a cell, creating it from `init` on first write.
    pub(crate) fn layer_mut_or_insert_with<T, F>(
        &mut self,
        cell: CellId,
        base_version: u64,
        init: F,
    ) -> CoreResult<&mut T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.ensure_active()?;
        if !self.layers.contains_key(&cell) {
            self.register_write(cell);
            self.layers.insert(
                cell,
                Layer {
                    base_version,
                    value: Box::new(init()),
                },
            );
        }
        self.layers
            .get_mut(&cell)
            .and_then(|layer| layer.value.downcast_mut::<T>())
            .ok_or_else(|| {
                CoreError::invariant_violation(format!("overlay of {cell} has an unexpected type"))
            })
    }

    /// Records that the cell was written by this transaction.
    pub(crate) fn register_write(&mut self, cell: CellId) {
        if !self.touched.contains(&cell) {
            self.touched.push(cell);
        }
    }

    /// Drops the overlay of a single cell.
    pub(crate) fn remove_layer(&mut self, cell: CellId) -> Option<Layer> {
        self.touched.retain(|touched| *touched != cell);
        self.layers.remove(&cell)
    }

    /// Moves every overlay out of the transaction.
    ///
    /// Fails if the write registry and the overlays disagree.
    pub(crate) fn take_layers(&mut self) -> CoreResult<HashMap<CellId, Layer>> {
        if self.touched.len() != self.layers.len()
            || self.touched.iter().any(|cell| !self.layers.contains_key(cell))
        {
            return Err(CoreError::invariant_violation(format!(
                "{} registered {} cells but holds {} overlays",
                self.id,
                self.touched.len(),
                self.layers.len()
            )));
        }
        self.touched.clear();
        Ok(std::mem::take(&mut self.layers))
    }

    /// Drops all overlays.
    pub(crate) fn clear_layers(&mut self) {
        self.touched.clear();
        self.layers.clear();
    }

    /// Marks the transaction as committed.
    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
    }

    /// Marks the transaction as aborted.
    pub(crate) fn mark_aborted(&mut self) {
        self.state = TransactionState::Aborted;
    }

    /// Ensures the transaction is active.
    pub(crate) fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}
