//! Verify command implementation.

use super::load;
use crate::error::{CliError, CliResult};
use canopy_core::HierarchyIndex;
use std::path::Path;
use tracing::{debug, warn};

/// Result of verifying a storage part.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of indexed nodes.
    pub node_count: usize,
    /// First structural breach, if any.
    pub breach: Option<String>,
}

impl VerifyResult {
    /// Returns true if no breach was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.breach.is_none()
    }
}

/// Rebuilds the index from the part at `path` and checks its structure.
pub fn verify(path: &Path) -> CliResult<VerifyResult> {
    let part = load(path)?;
    let index = HierarchyIndex::from_storage_part(part);
    let view = index.view(None);
    debug!(nodes = view.size_total(), "verifying storage part");

    let breach = view.verify().err().map(|err| err.to_string());
    Ok(VerifyResult {
        node_count: view.size_total(),
        breach,
    })
}

/// Runs the verify command.
pub fn run(path: &Path) -> CliResult<()> {
    println!("Verifying storage part at {}...", path.display());
    let result = verify(path)?;
    match result.breach {
        None => {
            println!("  ✓ {} nodes consistent", result.node_count);
            Ok(())
        }
        Some(message) => {
            warn!(%message, "storage part failed verification");
            println!("  ✗ {message}");
            Err(CliError::VerificationFailed { message })
        }
    }
}
