//! Tree command implementation.

use super::load;
use crate::error::{CliError, CliResult};
use canopy_core::{Descend, HierarchyIndex, HierarchyNode, HierarchyVisitor};
use std::fmt::Write as _;
use std::path::Path;

/// Renders visited nodes as an indented outline.
struct TreePrinter {
    max_distance: Option<u32>,
    out: String,
}

impl HierarchyVisitor for TreePrinter {
    fn visit(&mut self, node: &HierarchyNode, _level: u32, distance: u32, children: Descend<'_>) {
        let indent = "  ".repeat(distance as usize);
        let _ = writeln!(self.out, "{indent}{} (order {})", node.entity_key, node.order);
        if self.max_distance.is_none_or(|max| distance < max) {
            children.traverse(self);
        } else if children.child_count() > 0 {
            let _ = writeln!(self.out, "{indent}  ... {} more", children.child_count());
        }
    }
}

/// Renders the attached hierarchy, or the subtree under `root`.
///
/// `levels` bounds how many levels below the starting nodes are shown.
/// The part is verified first; a cyclic or inconsistent part is refused.
pub fn render(path: &Path, levels: Option<u32>, root: Option<i32>) -> CliResult<String> {
    let index = HierarchyIndex::from_storage_part(load(path)?);
    let view = index.view(None);
    view.verify().map_err(|err| CliError::VerificationFailed {
        message: err.to_string(),
    })?;
    let mut printer = TreePrinter {
        max_distance: levels,
        out: String::new(),
    };

    match root {
        Some(root) => view.traverse_from_node(&mut printer, root, false, &[]),
        None => view.traverse_hierarchy(&mut printer, &[]),
    }
    if root.is_none() && view.size_orphans() > 0 {
        let _ = writeln!(printer.out, "orphans: {}", view.size_orphans());
    }
    Ok(printer.out)
}

/// Runs the tree command.
pub fn run(path: &Path, levels: Option<u32>, root: Option<i32>) -> CliResult<()> {
    print!("{}", render(path, levels, root)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::HierarchyStoragePart;
    use canopy_testkit::{sample_forest, TempPart};

    fn sample_part() -> TempPart {
        let part = sample_forest().unwrap().current().create_storage_part(1).unwrap();
        TempPart::write(&part).unwrap()
    }

    #[test]
    fn full_tree() {
        let file = sample_part();
        let out = render(file.path(), None, None).unwrap();
        let expected = "\
10 (order 1)
  20 (order 1)
    25 (order 0)
  30 (order 2)
40 (order 2)
  50 (order 0)
orphans: 1
";
        assert_eq!(out, expected);
    }

    #[test]
    fn limited_levels_summarize_children() {
        let file = sample_part();
        let out = render(file.path(), Some(0), None).unwrap();
        let expected = "\
10 (order 1)
  ... 2 more
40 (order 2)
  ... 1 more
orphans: 1
";
        assert_eq!(out, expected);
    }

    #[test]
    fn subtree_from_root() {
        let file = sample_part();
        let out = render(file.path(), None, Some(20)).unwrap();
        assert_eq!(out, "20 (order 1)\n  25 (order 0)\n");
    }

    #[test]
    fn orphan_root_prints_nothing() {
        let file = sample_part();
        assert!(render(file.path(), None, Some(70)).unwrap().is_empty());
    }

    #[test]
    fn cyclic_part_is_refused() {
        let part = HierarchyStoragePart {
            index_id: 1,
            item_index: [(1, HierarchyNode::new(1, None, 0))].into_iter().collect(),
            roots: vec![1],
            level_index: [(1, vec![1])].into_iter().collect(),
            orphans: Default::default(),
        };
        let file = TempPart::write(&part).unwrap();

        let err = render(file.path(), None, None).unwrap_err();
        assert!(matches!(err, CliError::VerificationFailed { .. }));
    }
}
