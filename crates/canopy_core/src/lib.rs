//! # Canopy Core
//!
//! Transactional hierarchy index for embedded document stores.
//!
//! This crate provides:
//! - Versioned cells with transaction-private overlays (MVCC)
//! - Transactions and a generation store that publishes commits atomically
//! - A hierarchy index that converges under out-of-order construction
//! - Hierarchy queries, lazy traversal and structural verification
//! - Formulas feeding query results to an outer set-algebra engine
//! - Storage parts for persisting committed generations
//!
//! ## Example
//!
//! ```rust
//! use canopy_core::{HierarchyIndex, HierarchyStore};
//!
//! let store = HierarchyStore::new(HierarchyIndex::new());
//! store
//!     .transaction(|txn, index| {
//!         index.set_hierarchy_for(txn, 5, Some(1), 0)?;
//!         index.set_hierarchy_for(txn, 1, None, 0)
//!     })
//!     .unwrap();
//!
//! let index = store.current();
//! let view = index.view(None);
//! assert_eq!(view.root_keys(), &[1]);
//! assert_eq!(view.children_of(1), &[5]);
//! assert!(view.orphans().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bitmap;
mod config;
mod error;
mod stats;
mod store;
mod types;
mod versioned;

pub mod formula;
pub mod hierarchy;
pub mod transaction;

pub use bitmap::Bitmap;
pub use config::{Config, CostModel};
pub use error::{CoreError, CoreResult};
pub use formula::{Formula, HierarchyFormula};
pub use hierarchy::{
    Descend, HierarchyIndex, HierarchyNode, HierarchyQuery, HierarchyStoragePart, HierarchyView,
    HierarchyVisitor, NodeState,
};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::GenerationStore;
pub use transaction::{CommitSet, Generational, Transaction, TransactionContext, TransactionState};
pub use types::{CellId, CellVersion, IndexId, TransactionId};
pub use versioned::VersionedCell;

/// Generation store publishing hierarchy index generations.
pub type HierarchyStore = GenerationStore<HierarchyIndex>;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
