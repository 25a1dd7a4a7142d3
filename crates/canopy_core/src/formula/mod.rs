//! Lazily evaluated set computations.
//!
//! A formula describes a result without producing it. The outer query
//! engine combines formulas, asks them for cost hints while planning, and
//! uses their cache keys to reuse results computed against the same
//! generation of the same containers. A formula computes its result at most
//! once.

mod hierarchy;

pub use hierarchy::HierarchyFormula;

use crate::bitmap::Bitmap;
use crate::types::CellVersion;

/// A deferred, cacheable set computation.
pub trait Formula: Send + Sync {
    /// Materializes the result, computing it on first call.
    fn compute(&self) -> &Bitmap;

    /// Cost hint available without computing anything.
    fn estimated_cost(&self) -> u64;

    /// Cost of the actual result; computes it if needed.
    fn cost(&self) -> u64;

    /// Stable cache key of this computation over its inputs.
    ///
    /// Two formulas with the same key produce the same result.
    fn hash(&self) -> u64;

    /// Containers, with their versions, the result depends on.
    fn transactional_ids(&self) -> Vec<CellVersion>;
}
