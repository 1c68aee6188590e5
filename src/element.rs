use std::fmt;

/// Ordering contract for tree elements: a total order plus a printable form.
///
/// For any two values exactly one of less / equal / greater holds, which is
/// what the tree's descend logic relies on. The blanket impl covers integers,
/// chars, strings, and any user type with `Ord + Display`.
pub trait Element: Ord + fmt::Display {}

impl<T: Ord + fmt::Display> Element for T {}
