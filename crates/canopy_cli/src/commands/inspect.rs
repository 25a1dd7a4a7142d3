//! Inspect command implementation.

use super::load;
use crate::error::{CliError, CliResult};
use canopy_core::HierarchyStoragePart;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

/// Storage part inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Storage part path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Index identifier recorded in the part.
    pub index_id: u32,
    /// Number of indexed nodes.
    pub node_count: usize,
    /// Number of nodes reachable from a root.
    pub attached_count: usize,
    /// Number of orphans.
    pub orphan_count: usize,
    /// Root keys in sibling order.
    pub roots: Vec<i32>,
    /// Orphan keys, ascending.
    pub orphans: Vec<i32>,
    /// Depth of the deepest attached node (1 for roots, 0 if empty).
    pub max_depth: u32,
}

impl InspectResult {
    fn from_part(path: &Path, file_size: u64, part: &HierarchyStoragePart) -> Self {
        Self {
            path: path.display().to_string(),
            file_size,
            index_id: part.index_id,
            node_count: part.item_index.len(),
            attached_count: part.level_index.len(),
            orphan_count: part.orphans.len(),
            roots: part.roots.clone(),
            orphans: part.orphans.as_slice().to_vec(),
            max_depth: max_depth(part),
        }
    }

    /// Renders the result in the requested format.
    pub fn render(&self, format: &str) -> CliResult<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(self)?),
            "text" => Ok(self.render_text()),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Storage part: {}", self.path);
        let _ = writeln!(out, "  Index id:   {}", self.index_id);
        let _ = writeln!(out, "  File size:  {} bytes", self.file_size);
        let _ = writeln!(out, "  Nodes:      {}", self.node_count);
        let _ = writeln!(out, "  Attached:   {}", self.attached_count);
        let _ = writeln!(out, "  Orphans:    {}", self.orphan_count);
        let _ = writeln!(out, "  Max depth:  {}", self.max_depth);
        let _ = writeln!(out, "  Roots:      {}", join(&self.roots));
        if !self.orphans.is_empty() {
            let _ = writeln!(out, "  Orphan keys: {}", join(&self.orphans));
        }
        out
    }
}

fn join(keys: &[i32]) -> String {
    keys.iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Depth of the deepest node reachable from the roots.
///
/// A key met twice is not descended again, so cyclic parts terminate.
fn max_depth(part: &HierarchyStoragePart) -> u32 {
    let mut deepest = 0;
    let mut seen = HashSet::new();
    let mut stack: Vec<(i32, u32)> = part.roots.iter().map(|&key| (key, 1)).collect();
    while let Some((key, depth)) = stack.pop() {
        if !seen.insert(key) {
            continue;
        }
        deepest = deepest.max(depth);
        if let Some(children) = part.level_index.get(&key) {
            stack.extend(children.iter().map(|&child| (child, depth + 1)));
        }
    }
    deepest
}

/// Builds the inspection result for the part at `path`.
pub fn inspect(path: &Path) -> CliResult<InspectResult> {
    let part = load(path)?;
    let file_size = std::fs::metadata(path)
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    Ok(InspectResult::from_part(path, file_size, &part))
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> CliResult<()> {
    let result = inspect(path)?;
    print!("{}", result.render(format)?);
    Ok(())
}
