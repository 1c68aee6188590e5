use std::cmp::Ordering;
use std::fmt;
use std::ptr::NonNull;

use log::trace;

use crate::element::Element;
use crate::iter::InOrder;
use crate::node::{self, Links, TreeNode};

/// Node color. Absent children are never stored; they read as black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// A node of the red-black tree.
pub struct RbNode<T> {
    value: T,
    color: Color,
    parent: Option<NonNull<RbNode<T>>>,
    left: Option<NonNull<RbNode<T>>>,
    right: Option<NonNull<RbNode<T>>>,
}

impl<T> RbNode<T> {
    fn alloc(value: T, parent: Option<NonNull<RbNode<T>>>) -> NonNull<RbNode<T>> {
        NonNull::from(Box::leak(Box::new(RbNode {
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        })))
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn left(&self) -> Option<&RbNode<T>> {
        // SAFETY: child links point at live nodes owned by the same tree,
        // which outlives this borrow.
        self.left.map(|n| unsafe { &*n.as_ptr() })
    }

    pub fn right(&self) -> Option<&RbNode<T>> {
        // SAFETY: as in `left`.
        self.right.map(|n| unsafe { &*n.as_ptr() })
    }
}

impl<T> Links for RbNode<T> {
    fn parent_link(&self) -> Option<NonNull<Self>> {
        self.parent
    }

    fn left_link(&self) -> Option<NonNull<Self>> {
        self.left
    }

    fn right_link(&self) -> Option<NonNull<Self>> {
        self.right
    }
}

impl<T: Element> TreeNode for RbNode<T> {
    type Value = T;

    fn value(&self) -> &T {
        RbNode::value(self)
    }

    fn left(&self) -> Option<&Self> {
        RbNode::left(self)
    }

    fn right(&self) -> Option<&Self> {
        RbNode::right(self)
    }
}

/// Color a link reads as: absent children are black.
///
/// SAFETY: `link` must be absent or point at a live node.
unsafe fn color_of<T>(link: Option<NonNull<RbNode<T>>>) -> Color {
    match link {
        None => Color::Black,
        // SAFETY: guaranteed by caller.
        Some(node) => unsafe { node.as_ref() }.color,
    }
}

/// SAFETY: both nodes must be live and distinct.
unsafe fn swap_colors<T>(mut a: NonNull<RbNode<T>>, mut b: NonNull<RbNode<T>>) {
    // SAFETY: guaranteed by caller.
    unsafe {
        let color = a.as_ref().color;
        a.as_mut().color = b.as_ref().color;
        b.as_mut().color = color;
    }
}

/// Recolors a black node red and its two red children black, preserving the
/// subtree's black height. The precondition is asserted; violating it means
/// the structure was already corrupt.
///
/// SAFETY: `n` must be a live node whose links are live.
unsafe fn push_black<T>(mut n: NonNull<RbNode<T>>) {
    // SAFETY: guaranteed by caller.
    unsafe {
        assert_eq!(n.as_ref().color, Color::Black, "push_black on a red node");
        assert_eq!(
            color_of(n.as_ref().left),
            Color::Red,
            "push_black without a red left child"
        );
        assert_eq!(
            color_of(n.as_ref().right),
            Color::Red,
            "push_black without a red right child"
        );

        n.as_mut().color = Color::Red;
        if let Some(mut left) = n.as_ref().left {
            left.as_mut().color = Color::Black;
        }
        if let Some(mut right) = n.as_ref().right {
            right.as_mut().color = Color::Black;
        }
    }
}

/// Inverse of [`push_black`]: a red node with two black children turns
/// black, the children red. Insertion fixup never needs it; the
/// deletion-side protocol would.
///
/// SAFETY: as for [`push_black`].
#[allow(dead_code)]
unsafe fn pull_black<T>(mut n: NonNull<RbNode<T>>) {
    // SAFETY: guaranteed by caller.
    unsafe {
        assert_eq!(n.as_ref().color, Color::Red, "pull_black on a black node");
        assert_eq!(
            color_of(n.as_ref().left),
            Color::Black,
            "pull_black without a black left child"
        );
        assert_eq!(
            color_of(n.as_ref().right),
            Color::Black,
            "pull_black without a black right child"
        );

        n.as_mut().color = Color::Black;
        if let Some(mut left) = n.as_ref().left {
            left.as_mut().color = Color::Red;
        }
        if let Some(mut right) = n.as_ref().right {
            right.as_mut().color = Color::Red;
        }
    }
}

/// Binary search tree with red-black coloring. Insertion rebalances with
/// local rotations and color flips; the root is black after every insert.
/// No deletion on this variant.
pub struct RedBlackTree<T> {
    root: Option<NonNull<RbNode<T>>>,
    len: usize,
}

// SAFETY: the tree owns every node it points at and hands out references
// only through `&self`/`&mut self` methods.
unsafe impl<T: Send> Send for RedBlackTree<T> {}
unsafe impl<T: Sync> Sync for RedBlackTree<T> {}

impl<T> RedBlackTree<T> {
    pub fn new() -> Self {
        RedBlackTree { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> Option<&RbNode<T>> {
        // SAFETY: the root is owned by this tree and outlives the borrow.
        self.root.map(|n| unsafe { &*n.as_ptr() })
    }

    pub fn height(&self) -> usize {
        // SAFETY: the root link satisfies `subtree_height`'s contract.
        unsafe { node::subtree_height(self.root) }
    }

    /// Lazy in-order iteration over node handles, smallest value first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: InOrder::new(self.root),
        }
    }

    /// Calls `visitor` once per node, in order. Single synchronous pass.
    pub fn traverse<F: FnMut(&RbNode<T>)>(&self, mut visitor: F) {
        for node in self.iter() {
            visitor(node);
        }
    }
}

impl<T: Element> RedBlackTree<T> {
    /// Inserts `value` as a red node via the ordinary search-tree descent,
    /// then restores the color invariant walking upward. Inserting a value
    /// already present mutates nothing and hands back the existing node
    /// with `false`.
    pub fn insert(&mut self, value: T) -> (&RbNode<T>, bool) {
        let Some(root) = self.root else {
            let child = RbNode::alloc(value, None);
            self.root = Some(child);
            self.len = 1;
            // SAFETY: freshly linked into this tree.
            unsafe { self.add_fixup(child) };
            // SAFETY: owned by the tree, which outlives the borrow.
            return (unsafe { &*child.as_ptr() }, true);
        };

        let mut current = root;
        loop {
            // SAFETY: reachable from the root, hence live; &mut self
            // excludes other references.
            let node = unsafe { &mut *current.as_ptr() };
            match value.cmp(&node.value) {
                Ordering::Equal => return (&*node, false),
                Ordering::Less => match node.left {
                    Some(left) => current = left,
                    None => {
                        let child = RbNode::alloc(value, Some(current));
                        node.left = Some(child);
                        self.len += 1;
                        // SAFETY: freshly linked into this tree.
                        unsafe { self.add_fixup(child) };
                        // SAFETY: as above.
                        return (unsafe { &*child.as_ptr() }, true);
                    }
                },
                Ordering::Greater => match node.right {
                    Some(right) => current = right,
                    None => {
                        let child = RbNode::alloc(value, Some(current));
                        node.right = Some(child);
                        self.len += 1;
                        // SAFETY: freshly linked into this tree.
                        unsafe { self.add_fixup(child) };
                        // SAFETY: as above.
                        return (unsafe { &*child.as_ptr() }, true);
                    }
                },
            }
        }
    }

    /// Looks `value` up without mutating. An empty tree is a valid no-match.
    pub fn find(&self, value: &T) -> Option<&RbNode<T>> {
        let mut current = self.root?;
        loop {
            // SAFETY: reachable from the root, hence live.
            let node = unsafe { current.as_ref() };
            match value.cmp(&node.value) {
                Ordering::Equal => return Some(node),
                Ordering::Less => current = node.left?,
                Ordering::Greater => current = node.right?,
            }
        }
    }

    /// Restores the color invariant after linking the red node `n`, walking
    /// upward. Each iteration that continues rebinds `n` strictly closer to
    /// the root, so the walk is bounded by the tree height.
    ///
    /// SAFETY: `n` must be a node of this tree.
    unsafe fn add_fixup(&mut self, mut n: NonNull<RbNode<T>>) {
        // SAFETY: every link walked here stays inside this tree.
        unsafe {
            while n.as_ref().color == Color::Red {
                if self.root == Some(n) {
                    n.as_mut().color = Color::Black;
                    return;
                }
                let Some(mut w) = n.as_ref().parent else {
                    unreachable!("non-root node without a parent");
                };
                if color_of(w.as_ref().left) == Color::Black {
                    // red node hanging off a black left slot: rotate the
                    // red link over to the left
                    self.flip_left(w);
                    n = w;
                    let Some(parent) = n.as_ref().parent else {
                        unreachable!("flipped node lost its parent");
                    };
                    w = parent;
                }
                if w.as_ref().color == Color::Black {
                    return;
                }
                let Some(g) = w.as_ref().parent else {
                    unreachable!("red node at the root");
                };
                if color_of(g.as_ref().right) == Color::Black {
                    trace!("add_fixup: rotating right at {}", g.as_ref().value);
                    self.flip_right(g);
                    return;
                }
                trace!("add_fixup: pushing black at {}", g.as_ref().value);
                push_black(g);
                n = g;
            }
        }
    }

    /// Swaps colors with the right child, then rotates left.
    ///
    /// SAFETY: `n` must be a node of this tree with a right child.
    unsafe fn flip_left(&mut self, n: NonNull<RbNode<T>>) {
        // SAFETY: guaranteed by caller.
        unsafe {
            let Some(right) = n.as_ref().right else {
                unreachable!("flip_left without a right child");
            };
            swap_colors(n, right);
            self.rotate_left(n);
        }
    }

    /// Swaps colors with the left child, then rotates right.
    ///
    /// SAFETY: `n` must be a node of this tree with a left child.
    unsafe fn flip_right(&mut self, n: NonNull<RbNode<T>>) {
        // SAFETY: guaranteed by caller.
        unsafe {
            let Some(left) = n.as_ref().left else {
                unreachable!("flip_right without a left child");
            };
            swap_colors(n, left);
            self.rotate_right(n);
        }
    }

    /// Promotes `n`'s right child into `n`'s place (re-parenting through
    /// `n`'s former parent, or taking over the root); `n` becomes the
    /// promoted node's left child and the promoted node's former left
    /// subtree becomes `n`'s right subtree.
    ///
    /// SAFETY: `n` must be a node of this tree with a right child.
    unsafe fn rotate_left(&mut self, mut n: NonNull<RbNode<T>>) {
        // SAFETY: guaranteed by caller; all links stay inside this tree.
        unsafe {
            let Some(mut promoted) = n.as_ref().right else {
                unreachable!("rotate_left without a right child");
            };
            let parent = n.as_ref().parent;

            let middle = promoted.as_ref().left;
            n.as_mut().right = middle;
            if let Some(mut middle) = middle {
                middle.as_mut().parent = Some(n);
            }

            promoted.as_mut().left = Some(n);
            n.as_mut().parent = Some(promoted);

            promoted.as_mut().parent = parent;
            match parent {
                None => self.root = Some(promoted),
                Some(mut parent) => {
                    let parent = parent.as_mut();
                    if parent.left == Some(n) {
                        parent.left = Some(promoted);
                    } else {
                        parent.right = Some(promoted);
                    }
                }
            }
        }
    }

    /// Mirror image of [`rotate_left`].
    ///
    /// SAFETY: `n` must be a node of this tree with a left child.
    unsafe fn rotate_right(&mut self, mut n: NonNull<RbNode<T>>) {
        // SAFETY: guaranteed by caller; all links stay inside this tree.
        unsafe {
            let Some(mut promoted) = n.as_ref().left else {
                unreachable!("rotate_right without a left child");
            };
            let parent = n.as_ref().parent;

            let middle = promoted.as_ref().right;
            n.as_mut().left = middle;
            if let Some(mut middle) = middle {
                middle.as_mut().parent = Some(n);
            }

            promoted.as_mut().right = Some(n);
            n.as_mut().parent = Some(promoted);

            promoted.as_mut().parent = parent;
            match parent {
                None => self.root = Some(promoted),
                Some(mut parent) => {
                    let parent = parent.as_mut();
                    if parent.left == Some(n) {
                        parent.left = Some(promoted);
                    } else {
                        parent.right = Some(promoted);
                    }
                }
            }
        }
    }
}

impl<T> Default for RedBlackTree<T> {
    fn default() -> Self {
        RedBlackTree::new()
    }
}

impl<T> Drop for RedBlackTree<T> {
    fn drop(&mut self) {
        // SAFETY: the tree exclusively owns every reachable node.
        unsafe { node::free_subtree(self.root) }
    }
}

impl<T: Element> fmt::Debug for RedBlackTree<T> {
    /// One line per node, `r: value` or `b: value`, children indented one
    /// space per level, left before right.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY contract: `link` is absent or a live node of the borrowed
        // tree.
        unsafe fn dump<T: Element>(
            link: Option<NonNull<RbNode<T>>>,
            depth: usize,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            let Some(node) = link else {
                return Ok(());
            };
            // SAFETY: guaranteed by caller.
            let node = unsafe { node.as_ref() };
            let tag = match node.color {
                Color::Red => 'r',
                Color::Black => 'b',
            };
            writeln!(f, "{:depth$}{tag}: {}", "", node.value)?;
            // SAFETY: child links satisfy the same contract.
            unsafe {
                dump(node.left, depth + 1, f)?;
                dump(node.right, depth + 1, f)
            }
        }
        // SAFETY: the root link satisfies `dump`'s contract.
        unsafe { dump(self.root, 0, f) }
    }
}

/// In-order iterator over a [`RedBlackTree`], see [`RedBlackTree::iter`].
pub struct Iter<'a, T> {
    inner: InOrder<'a, RbNode<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a RbNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
        let _ = TermLogger::init(
            LevelFilter::Trace,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        );
    }

    fn values(tree: &RedBlackTree<i32>) -> Vec<i32> {
        tree.iter().map(|n| *n.value()).collect()
    }

    #[test]
    fn new_tree_is_empty() {
        let tree: RedBlackTree<i32> = RedBlackTree::new();
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.find(&1).is_none());
        assert!(tree.iter().next().is_none());
    }

    #[test]
    fn small_tree_has_black_root_and_red_children() {
        let mut tree = RedBlackTree::new();
        for i in 1..=3 {
            assert!(tree.insert(i).1);
        }
        let root = tree.root().unwrap();
        assert_eq!(*root.value(), 2);
        assert_eq!(root.color(), Color::Black);
        assert_eq!(root.left().unwrap().color(), Color::Red);
        assert_eq!(root.right().unwrap().color(), Color::Red);
        for i in 1..=3 {
            assert!(tree.find(&i).is_some());
        }
    }

    #[test]
    fn fourth_insert_pushes_black_and_keeps_the_root_black() {
        init_logging();
        let mut tree = RedBlackTree::new();
        for i in 1..=4 {
            tree.insert(i);
        }
        let root = tree.root().unwrap();
        assert_eq!((*root.value(), root.color()), (2, Color::Black));
        let left = root.left().unwrap();
        assert_eq!((*left.value(), left.color()), (1, Color::Black));
        let right = root.right().unwrap();
        assert_eq!((*right.value(), right.color()), (4, Color::Black));
        let inner = right.left().unwrap();
        assert_eq!((*inner.value(), inner.color()), (3, Color::Red));
        assert!(right.right().is_none());
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn ascending_inserts_stay_ordered() {
        init_logging();
        let mut tree = RedBlackTree::new();
        for i in 1..=10 {
            assert!(tree.insert(i).1);
        }
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.root().unwrap().color(), Color::Black);
        assert_eq!(values(&tree), (1..=10).collect::<Vec<_>>());
        for i in 1..=10 {
            assert!(tree.find(&i).is_some());
        }
        assert!(tree.find(&11).is_none());
    }

    #[test]
    fn descending_inserts_stay_ordered() {
        let mut tree = RedBlackTree::new();
        for i in (1..=10).rev() {
            assert!(tree.insert(i).1);
        }
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.root().unwrap().color(), Color::Black);
        assert_eq!(values(&tree), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn mixed_inserts_stay_ordered() {
        let mut tree = RedBlackTree::new();
        for v in [7, 3, 11, 1, 5, 9, 13] {
            tree.insert(v);
        }
        let root = tree.root().unwrap();
        assert_eq!((*root.value(), root.color()), (7, Color::Black));
        assert_eq!(values(&tree), vec![1, 3, 5, 7, 9, 11, 13]);
        for v in [7, 3, 11, 1, 5, 9, 13] {
            assert!(tree.find(&v).is_some());
        }
    }

    #[test]
    fn duplicate_insert_is_a_noop() {
        let mut tree = RedBlackTree::new();
        assert!(tree.insert(7).1);
        let (node, created) = tree.insert(7);
        assert_eq!(*node.value(), 7);
        assert!(!created);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn push_and_pull_black_invert_each_other() {
        let mut tree = RedBlackTree::new();
        for i in 1..=3 {
            tree.insert(i);
        }
        let root = tree.root.unwrap();
        // SAFETY: the root and its children are live nodes of `tree`.
        unsafe {
            push_black(root);
            assert_eq!(root.as_ref().color, Color::Red);
            assert_eq!(color_of(root.as_ref().left), Color::Black);
            assert_eq!(color_of(root.as_ref().right), Color::Black);

            pull_black(root);
            assert_eq!(root.as_ref().color, Color::Black);
            assert_eq!(color_of(root.as_ref().left), Color::Red);
            assert_eq!(color_of(root.as_ref().right), Color::Red);
        }
    }

    #[test]
    fn debug_dump_shows_colors() {
        let mut tree = RedBlackTree::new();
        for i in 1..=3 {
            tree.insert(i);
        }
        assert_eq!(format!("{tree:?}"), "b: 2\n r: 1\n r: 3\n");
    }
}
