//! Generation store: publication of committed generations.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::stats::StoreStats;
use crate::transaction::{Generational, Transaction, TransactionContext};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Holds the current generation of a [`Generational`] structure.
///
/// Readers take an `Arc` of the current generation and keep a consistent,
/// immutable snapshot for as long as they hold it. Writers work inside a
/// [`Transaction`]; [`commit`](Self::commit) turns the transaction's overlays
/// into the next generation and swaps it in with a single pointer store, so
/// no reader can observe some cells at the new generation and others at the
/// old one.
///
/// Commits are serialized by an internal lock. Transactions themselves never
/// block each other.
pub struct GenerationStore<T: Generational> {
    config: Config,
    context: TransactionContext,
    current: RwLock<Arc<T>>,
    commit_lock: Mutex<()>,
    stats: StoreStats,
}

impl<T: Generational> GenerationStore<T> {
    /// Creates a store publishing `initial` as its first generation.
    pub fn new(initial: T) -> Self {
        Self::with_config(initial, Config::default())
    }

    /// Creates a store with a custom configuration.
    pub fn with_config(initial: T, config: Config) -> Self {
        Self {
            config,
            context: TransactionContext::new(),
            current: RwLock::new(Arc::new(initial)),
            commit_lock: Mutex::new(()),
            stats: StoreStats::new(),
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the store statistics.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Returns the currently published generation.
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Returns the number of active transactions.
    pub fn active_count(&self) -> usize {
        self.context.active_count()
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> Transaction {
        self.stats.record_transaction_start();
        self.context.begin()
    }

    /// Commits a transaction and publishes the resulting generation.
    ///
    /// The commit is refused, and the transaction rolled back, if one of its
    /// overlays was built on a base that a concurrent commit has replaced, or
    /// if the transaction's view breaks a structural invariant. Nothing is
    /// published in either case.
    pub fn commit(&self, txn: &mut Transaction) -> CoreResult<Arc<T>> {
        let _commit_guard = self.commit_lock.lock();
        let current = self.current();

        if let Err(err) = self.check_bases(&current, txn) {
            if err.is_fatal() {
                self.stats.record_invariant_violation();
            } else {
                self.stats.record_conflict();
            }
            return Err(self.refuse(txn, err));
        }
        if self.config.verify_on_commit {
            if let Err(err) = current.verify(txn) {
                self.stats.record_invariant_violation();
                return Err(self.refuse(txn, err));
            }
        }

        let txid = txn.id();
        let mut commit = self.context.commit(txn)?;
        let next = current.merge_generation(&mut commit).and_then(|next| {
            commit.ensure_consumed()?;
            Ok(Arc::new(next))
        });
        let next = match next {
            Ok(next) => next,
            Err(err) => {
                warn!(%txid, error = %err, "merge failed, generation not published");
                if err.is_fatal() {
                    self.stats.record_invariant_violation();
                } else {
                    self.stats.record_conflict();
                }
                return Err(err);
            }
        };

        *self.current.write() = Arc::clone(&next);
        self.stats.record_transaction_commit();
        self.stats.record_generation();
        debug!(%txid, "generation published");
        Ok(next)
    }

    /// Rolls back a transaction.
    pub fn rollback(&self, txn: &mut Transaction) -> CoreResult<()> {
        self.context.rollback(txn)?;
        self.stats.record_transaction_rollback();
        Ok(())
    }

    /// Runs `f` in a new transaction against the current generation.
    ///
    /// Commits if `f` succeeds, rolls back otherwise.
    pub fn transaction<F, R>(&self, f: F) -> CoreResult<R>
    where
        F: FnOnce(&mut Transaction, &T) -> CoreResult<R>,
    {
        let generation = self.current();
        let mut txn = self.begin();
        match f(&mut txn, &generation) {
            Ok(result) => {
                self.commit(&mut txn)?;
                Ok(result)
            }
            Err(e) => {
                // Try to roll back, but don't mask the original error
                let _ = self.rollback(&mut txn);
                Err(e)
            }
        }
    }

    /// Fails if an overlay was cloned from a base other than the current one.
    fn check_bases(&self, current: &T, txn: &Transaction) -> CoreResult<()> {
        let versions: HashMap<_, _> = current
            .cell_versions()
            .into_iter()
            .map(|cv| (cv.cell, cv.version))
            .collect();
        for (cell, base_version) in txn.layer_base_versions() {
            match versions.get(&cell) {
                Some(&version) if version == base_version => {}
                Some(_) => return Err(CoreError::transaction_conflict(cell)),
                None => {
                    return Err(CoreError::invariant_violation(format!(
                        "{} wrote {cell}, which is not part of this store",
                        txn.id()
                    )))
                }
            }
        }
        Ok(())
    }

    fn refuse(&self, txn: &mut Transaction, err: CoreError) -> CoreError {
        warn!(txid = %txn.id(), error = %err, "commit refused");
        if self.context.rollback(txn).is_ok() {
            self.stats.record_transaction_rollback();
        }
        err
    }
}

impl<T: Generational> fmt::Debug for GenerationStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationStore")
            .field("config", &self.config)
            .field("active_count", &self.active_count())
            .finish_non_exhaustive()
    }
}
