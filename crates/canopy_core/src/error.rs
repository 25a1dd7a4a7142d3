//! Error types for Canopy core.

use crate::types::CellId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Canopy core operations.
///
/// Two families exist. Precondition violations (`SelfParenting`,
/// `NodeNotFound`, `InvalidOperation`) are rejected before any mutation and
/// can be corrected by the caller. `InvariantViolation` signals corruption:
/// it is never retried and a commit that produces it publishes nothing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node was declared as its own parent.
    #[error("node {key} cannot be its own parent")]
    SelfParenting {
        /// The offending entity key.
        key: i32,
    },

    /// The node has no placement in the hierarchy.
    #[error("node {key} is not present in the hierarchy")]
    NodeNotFound {
        /// The entity key that was not found.
        key: i32,
    },

    /// An internal structural invariant does not hold.
    #[error("hierarchy invariant violated: {message}")]
    InvariantViolation {
        /// Description of the breach.
        message: String,
    },

    /// The overlay of a transaction was built on a superseded base.
    #[error("transaction conflict on {cell}: base was replaced by a concurrent commit")]
    TransactionConflict {
        /// The versioned cell where the conflict was detected.
        cell: CellId,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Storage part could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the encoding failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a self-parenting error.
    pub fn self_parenting(key: i32) -> Self {
        Self::SelfParenting { key }
    }

    /// Creates a node not found error.
    pub fn node_not_found(key: i32) -> Self {
        Self::NodeNotFound { key }
    }

    /// Creates an invariant violation error.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Creates a transaction conflict error.
    pub fn transaction_conflict(cell: CellId) -> Self {
        Self::TransactionConflict { cell }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Returns true if the error indicates corruption rather than misuse.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CoreError::self_parenting(7).to_string(),
            "node 7 cannot be its own parent"
        );
        assert_eq!(
            CoreError::node_not_found(3).to_string(),
            "node 3 is not present in the hierarchy"
        );
        assert_eq!(
            CoreError::transaction_conflict(CellId::new(4)).to_string(),
            "transaction conflict on cell:4: base was replaced by a concurrent commit"
        );
    }

    #[test]
    fn only_invariant_violations_are_fatal() {
        assert!(CoreError::invariant_violation("broken").is_fatal());
        assert!(!CoreError::self_parenting(1).is_fatal());
        assert!(!CoreError::node_not_found(1).is_fatal());
        assert!(!CoreError::transaction_conflict(CellId::new(1)).is_fatal());
    }
}
