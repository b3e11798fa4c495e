//! Ordered maps built on binary search trees.
//!
//! [`RbTreeMap`] is a red-black tree with parent links kept in an arena.
//! [`UnbalancedBst`] is the same interface without rebalancing, kept as a
//! baseline for tests and benchmarks.

mod bst;
mod check;
mod error;
mod iter;
mod node;
mod rb;

use std::collections::BTreeMap;

pub use bst::UnbalancedBst;
pub use error::{InvariantViolation, MapError};
pub use iter::{Iter, Keys, Values};
pub use node::Handle;
pub use rb::RbTreeMap;

/// Ordered map interface.
///
/// - Keys are unique.
/// - `insert` overwrites the existing value and returns the old one.
/// - `lower_bound` returns the smallest `(k, v)` with `k >= key`.
pub trait OrderedMap {
    type Key: Ord;
    type Value;

    fn new() -> Self;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn lower_bound(&self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)>;
}

impl<K: Ord, V> OrderedMap for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        BTreeMap::new()
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.range(key..).next()
    }
}
