//! Stress tests for Canopy.
//!
//! These runs verify behavior under many commits and concurrent access.

use canopy_core::{CoreError, CoreResult, HierarchyIndex, HierarchyStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Commits retried after a conflict.
    pub retries: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, retries: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            retries,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Retries: {}", self.retries);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Children per node in generated trees.
    pub fanout: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            fanout: 8,
        }
    }
}

/// Parent of node `i` in a complete tree with the given fanout; node 0 is the root.
fn parent_in_tree(i: usize, fanout: usize) -> Option<i32> {
    (i > 0).then(|| ((i - 1) / fanout) as i32)
}

/// Builds a complete tree bottom-up, one commit per node.
///
/// Every node but the root arrives before its parent, so each commit parks
/// or adopts orphans.
pub fn stress_reverse_build(store: &HierarchyStore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in (0..config.operations).rev() {
        let parent = parent_in_tree(i, config.fanout);
        match store.transaction(|txn, index| index.set_hierarchy_for(txn, i as i32, parent, 0)) {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, 0, start.elapsed())
}

/// Runs a closure in a transaction, retrying on conflicts.
fn with_retry<F>(store: &HierarchyStore, mut f: F, retries: &AtomicUsize) -> CoreResult<()>
where
    F: FnMut(&mut canopy_core::Transaction, &HierarchyIndex) -> CoreResult<()>,
{
    loop {
        match store.transaction(&mut f) {
            Err(CoreError::TransactionConflict { .. }) => {
                retries.fetch_add(1, Ordering::Relaxed);
            }
            other => return other,
        }
    }
}

/// Concurrent writers placing disjoint keys under a shared root.
///
/// Every commit touches the item index, so concurrent transactions collide
/// and are retried until they publish.
pub fn stress_concurrent_writers(
    store: Arc<HierarchyStore>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let retries = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let _ = store.transaction(|txn, index| index.set_hierarchy_for(txn, 0, None, 0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let retries = Arc::clone(&retries);

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = (1 + t * ops_per_thread + i) as i32;
                    let result = with_retry(
                        &store,
                        |txn, index| index.set_hierarchy_for(txn, key, Some(0), i as i32),
                        &retries,
                    );
                    match result {
                        Ok(()) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        retries.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Readers verifying published generations while a writer keeps committing.
///
/// A failed read is a generation that does not pass verification.
pub fn stress_readers_during_writes(
    store: Arc<HierarchyStore>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    let start = Instant::now();

    let readers: Vec<_> = (0..config.threads)
        .map(|_| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let done = Arc::clone(&done);

            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let generation = store.current();
                    let view = generation.view(None);
                    if view.verify().is_ok()
                        && view.size_total() == view.size_attached() + view.size_orphans()
                    {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    let mut write_failures = 0usize;
    for i in (0..config.operations).rev() {
        let parent = parent_in_tree(i, config.fanout);
        if store
            .transaction(|txn, index| index.set_hierarchy_for(txn, i as i32, parent, 0))
            .is_err()
        {
            write_failures += 1;
        }
    }
    done.store(true, Ordering::Release);

    for handle in readers {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed) + write_failures,
        0,
        start.elapsed(),
    )
}

/// Alternates committed and rolled back transactions.
pub fn stress_transaction_aborts(
    store: &HierarchyStore,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let should_fail = i % 2 == 0;

        let result = store.transaction(|txn, index| {
            index.set_hierarchy_for(txn, i as i32, None, 0)?;
            if should_fail {
                Err(CoreError::invalid_operation("intentional"))
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, 0, start.elapsed())
}
