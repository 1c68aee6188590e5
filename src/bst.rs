use std::cmp::Ordering;
use std::ptr::NonNull;

use crate::element::Element;
use crate::iter::InOrder;
use crate::node::{self, Links, TreeNode};

/// A node of the plain search tree. Handles to nodes borrow the tree, so a
/// live handle can never dangle.
pub struct Node<T> {
    value: T,
    parent: Option<NonNull<Node<T>>>,
    left: Option<NonNull<Node<T>>>,
    right: Option<NonNull<Node<T>>>,
}

impl<T> Node<T> {
    fn alloc(value: T, parent: Option<NonNull<Node<T>>>) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node {
            value,
            parent,
            left: None,
            right: None,
        })))
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn left(&self) -> Option<&Node<T>> {
        // SAFETY: child links point at live nodes owned by the same tree,
        // which outlives this borrow.
        self.left.map(|n| unsafe { &*n.as_ptr() })
    }

    pub fn right(&self) -> Option<&Node<T>> {
        // SAFETY: as in `left`.
        self.right.map(|n| unsafe { &*n.as_ptr() })
    }
}

impl<T> Links for Node<T> {
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

impl<T: Element> TreeNode for Node<T> {
    type Value = T;

    fn value(&self) -> &T {
        Node::value(self)
    }

    fn left(&self) -> Option<&Self> {
        Node::left(self)
    }

    fn right(&self) -> Option<&Self> {
        Node::right(self)
    }
}

/// Ordered binary search tree with parent links and a cached element count.
///
/// Left subtrees hold strictly smaller values, right subtrees strictly
/// larger ones; every child's parent link points back at the node holding
/// it. Single-writer: the caller serializes access if the tree is shared.
pub struct Tree<T> {
    root: Option<NonNull<Node<T>>>,
    len: usize,
}

// SAFETY: the tree owns every node it points at and hands out references
// only through `&self`/`&mut self` methods.
unsafe impl<T: Send> Send for Tree<T> {}
unsafe impl<T: Sync> Sync for Tree<T> {}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Tree { root: None, len: 0 }
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> Option<&Node<T>> {
        // SAFETY: the root is owned by this tree and outlives the borrow.
        self.root.map(|n| unsafe { &*n.as_ptr() })
    }

    /// Height of the tree: 0 when empty, 1 for a single node.
    pub fn height(&self) -> usize {
        // SAFETY: the root link satisfies `subtree_height`'s contract.
        unsafe { node::subtree_height(self.root) }
    }

    /// Whether the root's child subtrees differ in height by less than 2.
    ///
    /// Only the root is inspected; deeper imbalance is not flagged.
    pub fn is_balanced(&self) -> bool {
        match self.root {
            None => true,
            Some(root) => {
                // SAFETY: as in `height`.
                let root = unsafe { root.as_ref() };
                let left = unsafe { node::subtree_height(root.left) } as isize;
                let right = unsafe { node::subtree_height(root.right) } as isize;
                (left - right).abs() < 2
            }
        }
    }

    /// Lazy in-order iteration over node handles, smallest value first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: InOrder::new(self.root),
        }
    }

    /// Calls `visitor` once per node, in order. Single synchronous pass.
    pub fn traverse<F: FnMut(&Node<T>)>(&self, mut visitor: F) {
        for node in self.iter() {
            visitor(node);
        }
    }
}

impl<T: Element> Tree<T> {
    /// Inserts `value`, returning a handle to its node and whether a new
    /// node was created. Inserting a value already present mutates nothing
    /// and hands back the existing node with `false`.
    pub fn insert(&mut self, value: T) -> (&Node<T>, bool) {
        let Some(root) = self.root else {
            let child = Node::alloc(value, None);
            self.root = Some(child);
            self.len = 1;
            // SAFETY: freshly allocated and now owned by the tree.
            return (unsafe { &*child.as_ptr() }, true);
        };

        let mut current = root;
        loop {
            // SAFETY: `current` is reachable from the root, hence live; the
            // &mut self receiver excludes other references.
            let node = unsafe { &mut *current.as_ptr() };
            match value.cmp(&node.value) {
                Ordering::Equal => return (&*node, false),
                Ordering::Less => match node.left {
                    Some(left) => current = left,
                    None => {
                        let child = Node::alloc(value, Some(current));
                        node.left = Some(child);
                        self.len += 1;
                        // SAFETY: as above.
                        return (unsafe { &*child.as_ptr() }, true);
                    }
                },
                Ordering::Greater => match node.right {
                    Some(right) => current = right,
                    None => {
                        let child = Node::alloc(value, Some(current));
                        node.right = Some(child);
                        self.len += 1;
                        // SAFETY: as above.
                        return (unsafe { &*child.as_ptr() }, true);
                    }
                },
            }
        }
    }

    /// Looks `value` up without mutating. An empty tree is a valid no-match.
    pub fn find(&self, value: &T) -> Option<&Node<T>> {
        // SAFETY: the node is owned by this tree; the returned borrow ties
        // it to &self.
        self.find_ptr(value).map(|n| unsafe { &*n.as_ptr() })
    }

    fn find_ptr(&self, value: &T) -> Option<NonNull<Node<T>>> {
        let mut current = self.root?;
        loop {
            // SAFETY: reachable from the root, hence live.
            let node = unsafe { current.as_ref() };
            match value.cmp(&node.value) {
                Ordering::Equal => return Some(current),
                Ordering::Less => current = node.left?,
                Ordering::Greater => current = node.right?,
            }
        }
    }

    /// Removes `value` if present. A node with at most one child is spliced
    /// out directly; an interior node instead takes over its in-order
    /// successor's value and the successor (which has at most one child) is
    /// spliced. Returns whether anything was removed.
    pub fn remove(&mut self, value: &T) -> bool {
        let Some(target) = self.find_ptr(value) else {
            return false;
        };

        // SAFETY: `target` is owned by this tree; &mut self gives exclusive
        // access to every node.
        unsafe {
            match (target.as_ref().left, target.as_ref().right) {
                (Some(_), Some(right)) => {
                    let mut successor = right;
                    while let Some(next) = successor.as_ref().left {
                        successor = next;
                    }
                    // The successor's value moves into the doomed slot; the
                    // removed value rides out with the spliced node.
                    let (node, succ) = (&mut *target.as_ptr(), &mut *successor.as_ptr());
                    std::mem::swap(&mut node.value, &mut succ.value);
                    self.splice(successor);
                }
                _ => self.splice(target),
            }
        }
        self.len -= 1;
        true
    }

    /// Unlinks `target` by routing its single child (or nothing) to its
    /// parent's slot, then frees it.
    ///
    /// SAFETY: `target` must be a node of this tree with at most one child.
    unsafe fn splice(&mut self, target: NonNull<Node<T>>) {
        let (child, parent) = {
            // SAFETY: guaranteed by caller.
            let node = unsafe { target.as_ref() };
            debug_assert!(node.left.is_none() || node.right.is_none());
            (node.left.or(node.right), node.parent)
        };

        match parent {
            None => self.root = child,
            Some(mut parent) => {
                // SAFETY: a node's parent link always points at the node
                // holding it.
                let parent = unsafe { parent.as_mut() };
                if parent.left == Some(target) {
                    parent.left = child;
                } else {
                    parent.right = child;
                }
            }
        }
        if let Some(mut child) = child {
            // SAFETY: the child is live; it is re-parented, not freed.
            unsafe { child.as_mut() }.parent = parent;
        }

        // SAFETY: `target` is no longer reachable from the tree.
        drop(unsafe { Box::from_raw(target.as_ptr()) });
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::new()
    }
}

impl<T> Drop for Tree<T> {
    fn drop(&mut self) {
        // SAFETY: the tree exclusively owns every reachable node.
        unsafe { node::free_subtree(self.root) }
    }
}

/// In-order iterator over a [`Tree`], see [`Tree::iter`].
pub struct Iter<'a, T> {
    inner: InOrder<'a, Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
