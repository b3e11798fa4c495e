use thiserror::Error;

/// Errors reported by [`RbTreeMap`](crate::RbTreeMap) operations.
///
/// A failed operation never mutates the map.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    #[error("key not found")]
    NotFound,
    /// The handle was issued by a different map.
    #[error("handle belongs to a different map")]
    ForeignHandle,
    /// The handle's node has been removed, or relocated by a removal.
    #[error("handle refers to a node that is no longer present")]
    StaleHandle,
}

/// A broken structural invariant found by
/// [`RbTreeMap::check_invariants`](crate::RbTreeMap::check_invariants).
///
/// These are defects in the tree code, never caller errors. Positions are
/// arena slots.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("root at slot {0} is red")]
    RedRoot(u32),
    #[error("root at slot {0} has a parent")]
    RootHasParent(u32),
    #[error("red node at slot {child} has a red parent at slot {parent}")]
    RedRed { parent: u32, child: u32 },
    #[error("black-height mismatch under slot {node}: left {left}, right {right}")]
    BlackHeight { node: u32, left: usize, right: usize },
    #[error("key order violated at slot {0}")]
    Order(u32),
    #[error("child at slot {child} does not point back to parent at slot {parent}")]
    BrokenLink { parent: u32, child: u32 },
    #[error("reachable node count {reachable} differs from arena length {len}")]
    Len { reachable: usize, len: usize },
}
