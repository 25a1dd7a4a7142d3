//! Core type definitions for Canopy.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global source of cell identities. Identities are never reused.
static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

/// Global source of index identities.
static NEXT_INDEX_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Identity of a versioned cell.
///
/// A cell keeps its identity across generations; only its version changes
/// when a transaction publishes a new base for it. Transaction overlays are
/// keyed by this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u64);

impl CellId {
    /// Creates a cell ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a fresh, process-unique cell ID.
    pub(crate) fn next() -> Self {
        Self(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell:{}", self.0)
    }
}

/// Stable numeric identity of a hierarchy index.
///
/// Shared by every generation of the same index, so formula cache keys can
/// tell indexes apart while cell versions tell generations apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexId(pub u64);

impl IndexId {
    /// Creates an index ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a fresh, process-unique index ID.
    pub(crate) fn next() -> Self {
        Self(NEXT_INDEX_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idx:{}", self.0)
    }
}

/// A cell identity paired with the version of its committed base.
///
/// Two equal values always denote the same immutable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellVersion {
    /// The cell identity.
    pub cell: CellId,
    /// The version of the cell's committed base.
    pub version: u64,
}

impl fmt::Display for CellVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.cell, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_ordering() {
        let t1 = TransactionId::new(1);
        let t2 = TransactionId::new(2);
        assert!(t1 < t2);
    }

    #[test]
    fn cell_ids_are_unique() {
        let a = CellId::next();
        let b = CellId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", TransactionId::new(9)), "txn:9");
        assert_eq!(format!("{}", CellId::new(42)), "cell:42");
        assert_eq!(format!("{}", IndexId::new(3)), "idx:3");
        let cv = CellVersion {
            cell: CellId::new(5),
            version: 2,
        };
        assert_eq!(cv.to_string(), "cell:5@2");
    }
}
