//! CLI command implementations.

pub mod inspect;
pub mod tree;
pub mod verify;

use crate::error::{CliError, CliResult};
use canopy_core::HierarchyStoragePart;
use std::path::Path;
use tracing::debug;

/// Reads and decodes a storage part file.
pub fn load(path: &Path) -> CliResult<HierarchyStoragePart> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "storage part read");
    Ok(HierarchyStoragePart::from_bytes(&bytes)?)
}
