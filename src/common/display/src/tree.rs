//! Tree display utilities for query plans.

use std::fmt::{self, Write};

/// A node that can be rendered as part of a plan tree.
pub trait TreeDisplay {
    /// One-line label for this node, e.g. `Repartition(Hash, 4)`.
    fn display_label(&self) -> String;

    /// Child nodes, in input order.
    fn display_children(&self) -> Vec<&dyn TreeDisplay>;
}

/// Render a tree with box-drawing connectors, one node per line.
///
/// ```text
/// Join(Inner)
/// ├─ Filter(...)
/// │  └─ InMemoryScan(left)
/// └─ InMemoryScan(right)
/// ```
pub fn render_tree(root: &dyn TreeDisplay) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_root(&mut out, root);
    out
}

fn write_root(out: &mut String, root: &dyn TreeDisplay) -> fmt::Result {
    writeln!(out, "{}", root.display_label())?;
    write_children(out, root, "")
}

fn write_children(out: &mut String, node: &dyn TreeDisplay, prefix: &str) -> fmt::Result {
    let children = node.display_children();
    let last = children.len().saturating_sub(1);
    for (i, child) in children.into_iter().enumerate() {
        let is_last = i == last;
        let connector = if is_last { "└─ " } else { "├─ " };
        writeln!(out, "{prefix}{connector}{}", child.display_label())?;

        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
        write_children(out, child, &child_prefix)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        label: &'static str,
        children: Vec<TestNode>,
    }

    impl TestNode {
        fn leaf(label: &'static str) -> Self {
            Self {
                label,
                children: vec![],
            }
        }
    }

    impl TreeDisplay for TestNode {
        fn display_label(&self) -> String {
            self.label.to_string()
        }

        fn display_children(&self) -> Vec<&dyn TreeDisplay> {
            self.children.iter().map(|c| c as &dyn TreeDisplay).collect()
        }
    }

    #[test]
    fn test_render_tree() {
        let tree = TestNode {
            label: "Join",
            children: vec![
                TestNode {
                    label: "Filter",
                    children: vec![TestNode::leaf("ScanLeft")],
                },
                TestNode::leaf("ScanRight"),
            ],
        };

        let rendered = render_tree(&tree);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Join",
                "├─ Filter",
                "│  └─ ScanLeft",
                "└─ ScanRight",
            ]
        );
    }

    #[test]
    fn test_render_single_node() {
        assert_eq!(render_tree(&TestNode::leaf("Scan")), "Scan\n");
    }
}
