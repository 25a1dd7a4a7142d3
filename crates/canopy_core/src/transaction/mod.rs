//! Transactions over versioned cells.
//!
//! Canopy isolates transactions optimistically:
//! - **Isolation**: every write lands in a transaction-private overlay; readers
//!   of a published generation never see it
//! - **Atomicity**: a commit publishes all touched cells as one new generation
//!   or nothing at all
//! - **Consistency**: structural invariants are checked before publication
//! - **Conflicts**: an overlay built on a superseded base is rejected at commit

mod context;
mod state;

pub use context::{CommitSet, TransactionContext};
pub use state::{Transaction, TransactionState};

use crate::error::CoreResult;
use crate::types::CellVersion;

/// A structure made of versioned cells that can advance to a new generation.
///
/// Implementors are immutable once published; a commit produces a new value
/// sharing every untouched cell with its predecessor.
pub trait Generational: Send + Sync + Sized {
    /// Identity and version of every cell the structure is built from.
    fn cell_versions(&self) -> Vec<CellVersion>;

    /// Checks the structure as seen through the transaction's overlays.
    ///
    /// Returns an invariant violation if publishing the overlays would
    /// produce a corrupt generation.
    fn verify(&self, txn: &Transaction) -> CoreResult<()>;

    /// Builds the next generation from the overlays of a committed
    /// transaction, taking each cell's overlay out of the set.
    fn merge_generation(&self, commit: &mut CommitSet) -> CoreResult<Self>;
}
