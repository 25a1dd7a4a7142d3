//! Store configuration.

/// Per-key constants used by formulas to report planner costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    /// Estimated cost of visiting one node before the formula is computed.
    pub estimate_per_node: u64,
    /// Actual cost charged per key in a computed result.
    pub compute_per_key: u64,
    /// Fixed cost of materializing a bitmap.
    pub materialization: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            estimate_per_node: 12,
            compute_per_key: 7,
            materialization: 1,
        }
    }
}

/// Configuration for a generation store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to check structural invariants of a transaction's view
    /// before its commit is published.
    pub verify_on_commit: bool,

    /// Cost constants handed to formulas built from published generations.
    pub cost_model: CostModel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_on_commit: true,
            cost_model: CostModel::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether commits verify structural invariants.
    ///
    /// Only bulk loads of trusted snapshots should turn this off.
    #[must_use]
    pub const fn verify_on_commit(mut self, value: bool) -> Self {
        self.verify_on_commit = value;
        self
    }

    /// Sets the formula cost model.
    #[must_use]
    pub const fn cost_model(mut self, model: CostModel) -> Self {
        self.cost_model = model;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.verify_on_commit);
        assert_eq!(config.cost_model, CostModel::default());
    }

    #[test]
    fn builder_pattern() {
        let model = CostModel {
            estimate_per_node: 1,
            compute_per_key: 2,
            materialization: 3,
        };
        let config = Config::new().verify_on_commit(false).cost_model(model);

        assert!(!config.verify_on_commit);
        assert_eq!(config.cost_model.compute_per_key, 2);
    }
}
