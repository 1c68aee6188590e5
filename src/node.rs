use std::fmt;
use std::ptr::NonNull;

/// Read-only view of a tree node, for consumers that walk the structure
/// without mutating it (e.g. the dot renderer).
pub trait TreeNode {
    type Value: fmt::Display;

    fn value(&self) -> &Self::Value;
    fn left(&self) -> Option<&Self>;
    fn right(&self) -> Option<&Self>;
}

/// Raw link structure shared by both node kinds. Children are owning links,
/// the parent link is a non-owning back reference.
pub(crate) trait Links: Sized {
    fn parent_link(&self) -> Option<NonNull<Self>>;
    fn left_link(&self) -> Option<NonNull<Self>>;
    fn right_link(&self) -> Option<NonNull<Self>>;
}

/// Height of the subtree hanging off `link`: 0 for an absent link, otherwise
/// 1 plus the taller child subtree.
///
/// SAFETY: `link` must be absent or point at a live node whose reachable
/// child links are all live.
pub(crate) unsafe fn subtree_height<N: Links>(link: Option<NonNull<N>>) -> usize {
    match link {
        None => 0,
        Some(node) => {
            // SAFETY: guaranteed by caller.
            let node = unsafe { node.as_ref() };
            // SAFETY: child links of a live node satisfy the same contract.
            1 + unsafe { subtree_height(node.left_link()).max(subtree_height(node.right_link())) }
        }
    }
}

/// Frees every node of the subtree hanging off `link`, following owning
/// child links only (parent links are never followed).
///
/// SAFETY: the caller must hand over exclusive ownership of the subtree, and
/// every node in it must have been allocated with `Box::new`.
pub(crate) unsafe fn free_subtree<N: Links>(link: Option<NonNull<N>>) {
    if let Some(node) = link {
        // SAFETY: guaranteed by caller; nothing else points at the subtree.
        let node = unsafe { Box::from_raw(node.as_ptr()) };
        // SAFETY: the children are exclusively owned through `node`.
        unsafe {
            free_subtree(node.left_link());
            free_subtree(node.right_link());
        }
    }
}
