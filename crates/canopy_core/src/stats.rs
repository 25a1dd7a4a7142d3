//! Store statistics.
//!
//! Counters are atomic and can be read while transactions are in flight.
//!
//! ```rust,ignore
//! let store = HierarchyStore::new(HierarchyIndex::new());
//! store.transaction(|txn, index| index.set_hierarchy_for(txn, 1, None, 0))?;
//!
//! let stats = store.stats().snapshot();
//! assert_eq!(stats.transactions_committed, 1);
//! assert_eq!(stats.generations_published, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction and generation counters of a store.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Total number of transactions started.
    transactions_started: AtomicU64,
    /// Total number of transactions committed.
    transactions_committed: AtomicU64,
    /// Total number of transactions rolled back, including refused commits.
    transactions_rolled_back: AtomicU64,
    /// Commits rejected because a base was superseded.
    conflicts: AtomicU64,
    /// Commits rejected because an invariant did not hold.
    invariant_violations: AtomicU64,
    /// Generations made visible to readers.
    generations_published: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_transaction_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_generation(&self) {
        self.generations_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of transactions started.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions committed.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions rolled back.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns the number of commits rejected as conflicting.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Returns the number of commits rejected for breaking an invariant.
    pub fn invariant_violations(&self) -> u64 {
        self.invariant_violations.load(Ordering::Relaxed)
    }

    /// Returns the number of generations published.
    pub fn generations_published(&self) -> u64 {
        self.generations_published.load(Ordering::Relaxed)
    }

    /// Returns a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_rolled_back: self.transactions_rolled_back(),
            conflicts: self.conflicts(),
            invariant_violations: self.invariant_violations(),
            generations_published: self.generations_published(),
        }
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Total number of transactions started.
    pub transactions_started: u64,
    /// Total number of transactions committed.
    pub transactions_committed: u64,
    /// Total number of transactions rolled back.
    pub transactions_rolled_back: u64,
    /// Commits rejected as conflicting.
    pub conflicts: u64,
    /// Commits rejected for breaking an invariant.
    pub invariant_violations: u64,
    /// Generations published.
    pub generations_published: u64,
}
