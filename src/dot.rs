use std::fmt::{self, Write};

use crate::node::TreeNode;

/// Writes the tree hanging off `root` as a Graphviz digraph: a fixed
/// preamble and postamble around one `parent -> child;` line per edge,
/// values in their `Display` form, left edge before right, each subtree
/// emitted right after its edge. A single isolated root comes out as one
/// node-only line instead of zero edges. Pure read-only consumer.
pub fn write_dot<N, W>(root: Option<&N>, out: &mut W) -> fmt::Result
where
    N: TreeNode,
    W: Write,
{
    out.write_str("digraph btree {\n")?;
    match root {
        Some(node) if node.left().is_none() && node.right().is_none() => {
            writeln!(out, "{};", node.value())?;
        }
        Some(node) => edges(node, out)?,
        None => {}
    }
    out.write_str("}\n")
}

fn edges<N, W>(node: &N, out: &mut W) -> fmt::Result
where
    N: TreeNode,
    W: Write,
{
    if let Some(left) = node.left() {
        writeln!(out, "{} -> {};", node.value(), left.value())?;
        edges(left, out)?;
    }
    if let Some(right) = node.right() {
        writeln!(out, "{} -> {};", node.value(), right.value())?;
        edges(right, out)?;
    }
    Ok(())
}

/// [`write_dot`] into a fresh `String`.
pub fn dot_string<N: TreeNode>(root: Option<&N>) -> String {
    let mut out = String::new();
    write_dot(root, &mut out).expect("writing to a String cannot fail");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bst::Tree;
    use crate::rbtree::RedBlackTree;

    #[test]
    fn three_nodes_render_as_two_edges() {
        let mut tree = Tree::new();
        for v in [2, 1, 3] {
            tree.insert(v);
        }
        assert_eq!(
            dot_string(tree.root()),
            "digraph btree {\n2 -> 1;\n2 -> 3;\n}\n"
        );
    }

    #[test]
    fn single_node_renders_as_a_node_line() {
        let mut tree = Tree::new();
        tree.insert(42);
        assert_eq!(dot_string(tree.root()), "digraph btree {\n42;\n}\n");
    }

    #[test]
    fn empty_tree_renders_bare_markers() {
        let tree: Tree<i32> = Tree::new();
        assert_eq!(dot_string(tree.root()), "digraph btree {\n}\n");
    }

    #[test]
    fn red_black_nodes_render_through_the_same_view() {
        let mut tree = RedBlackTree::new();
        for v in [2, 1, 3] {
            tree.insert(v);
        }
        assert_eq!(
            dot_string(tree.root()),
            "digraph btree {\n2 -> 1;\n2 -> 3;\n}\n"
        );
    }

    #[test]
    fn rendering_does_not_disturb_the_tree() {
        let mut tree = Tree::new();
        for v in ["b", "a", "c"] {
            tree.insert(v);
        }
        let first = dot_string(tree.root());
        let second = dot_string(tree.root());
        assert_eq!(first, second);
        assert_eq!(tree.len(), 3);
    }
}
