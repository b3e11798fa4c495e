use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use log::{debug, trace};

use crate::OrderedMap;
use crate::error::MapError;
use crate::iter::{Iter, Keys, Values};
use crate::node::{Color, Handle, Id, LEFT, Node, RIGHT, id};

static NEXT_OWNER: AtomicU32 = AtomicU32::new(0);

fn next_owner() -> u32 {
    NEXT_OWNER.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Red-black tree map.
///
/// Nodes are stored in an arena and linked by `u32` ids; parent links are
/// plain ids, so there are no ownership cycles. Deleted slots go on a free
/// list and are reused by later inserts; live nodes never move, so a
/// [`Handle`] stays valid until its own node is deleted. Every public operation
/// leaves the tree satisfying the order, color, black-height and linkage
/// invariants (see [`RbTreeMap::check_invariants`]).
pub struct RbTreeMap<K, V> {
    /// `None` marks a vacant slot whose id is on `free`.
    pub(crate) nodes: Vec<Option<Node<K, V>>>,
    free: Vec<Id>,
    pub(crate) root: Id,
    len: usize,
    owner: u32,
    next_stamp: u64,
}

impl<K, V> RbTreeMap<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: Id::NIL,
            len: 0,
            owner: next_owner(),
            next_stamp: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every entry. Stamps keep counting, so handles taken before
    /// the clear stay stale even after their slots are reused.
    pub fn clear(&mut self) {
        debug!(
            "clearing red-black map with {} nodes ({} free slots)",
            self.len,
            self.free.len()
        );
        self.nodes.clear();
        self.free.clear();
        self.root = Id::NIL;
        self.len = 0;
    }

    #[inline(always)]
    pub(crate) fn node(&self, x: Id) -> &Node<K, V> {
        debug_assert!(!x.is_nil());
        match &self.nodes[x.idx()] {
            Some(node) => node,
            None => unreachable!("linked id {} names a vacant slot", x.raw()),
        }
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, x: Id) -> &mut Node<K, V> {
        debug_assert!(!x.is_nil());
        match &mut self.nodes[x.idx()] {
            Some(node) => node,
            None => unreachable!("linked id {} names a vacant slot", x.raw()),
        }
    }

    /// Absent children count as black.
    #[inline(always)]
    pub(crate) fn color(&self, x: Id) -> Color {
        if x.is_nil() {
            Color::Black
        } else {
            self.node(x).color
        }
    }

    #[inline(always)]
    fn set_color(&mut self, x: Id, color: Color) {
        self.node_mut(x).color = color;
    }

    #[inline(always)]
    fn parent(&self, x: Id) -> Id {
        self.node(x).p
    }

    /// Which child slot of `p` holds `x`.
    #[inline(always)]
    fn dir_of(&self, p: Id, x: Id) -> usize {
        usize::from(self.node(p).ch[RIGHT] == x)
    }

    fn handle(&self, x: Id) -> Handle {
        Handle {
            owner: self.owner,
            id: x,
            stamp: self.node(x).stamp,
        }
    }

    fn resolve(&self, h: Handle) -> Result<Id, MapError> {
        if h.owner != self.owner {
            return Err(MapError::ForeignHandle);
        }
        match self.nodes.get(h.id.idx()) {
            Some(Some(node)) if node.stamp == h.stamp => Ok(h.id),
            _ => Err(MapError::StaleHandle),
        }
    }

    /// Leftmost node under `x` (`x` must not be `NIL`).
    pub(crate) fn min_from(&self, mut x: Id) -> Id {
        while !self.node(x).ch[LEFT].is_nil() {
            x = self.node(x).ch[LEFT];
        }
        x
    }

    /// Rightmost node under `x` (`x` must not be `NIL`).
    pub(crate) fn max_from(&self, mut x: Id) -> Id {
        while !self.node(x).ch[RIGHT].is_nil() {
            x = self.node(x).ch[RIGHT];
        }
        x
    }

    /// Next node in key order, stepping toward `dir`: `RIGHT` gives the
    /// successor, `LEFT` the predecessor.
    pub(crate) fn step(&self, mut x: Id, dir: usize) -> Id {
        let c = self.node(x).ch[dir];
        if !c.is_nil() {
            return if dir == RIGHT {
                self.min_from(c)
            } else {
                self.max_from(c)
            };
        }
        let mut y = self.parent(x);
        while !y.is_nil() && self.node(y).ch[dir] == x {
            x = y;
            y = self.parent(y);
        }
        y
    }

    pub(crate) fn first_id(&self) -> Id {
        if self.root.is_nil() {
            Id::NIL
        } else {
            self.min_from(self.root)
        }
    }

    pub(crate) fn last_id(&self) -> Id {
        if self.root.is_nil() {
            Id::NIL
        } else {
            self.max_from(self.root)
        }
    }

    /// Moves `x` down toward `dir`, promoting its child on the other side.
    ///
    /// `rotate(x, LEFT)` is the classic left rotation and requires a right
    /// child; `rotate(x, RIGHT)` is its mirror.
    fn rotate(&mut self, x: Id, dir: usize) {
        let y = self.node(x).ch[dir ^ 1];
        debug_assert!(!y.is_nil(), "rotation needs a child to promote");
        let b = self.node(y).ch[dir];

        self.node_mut(x).ch[dir ^ 1] = b;
        if !b.is_nil() {
            self.node_mut(b).p = x;
        }

        let p = self.parent(x);
        self.node_mut(y).p = p;
        if p.is_nil() {
            self.root = y;
        } else {
            let d = self.dir_of(p, x);
            self.node_mut(p).ch[d] = y;
        }

        self.node_mut(y).ch[dir] = x;
        self.node_mut(x).p = y;
    }

    /// Puts the subtree rooted at `v` where `u` was. `v`'s children are
    /// left untouched; `v` may be `NIL`.
    fn transplant(&mut self, u: Id, v: Id) {
        let p = self.parent(u);
        if p.is_nil() {
            self.root = v;
        } else {
            let d = self.dir_of(p, u);
            self.node_mut(p).ch[d] = v;
        }
        if !v.is_nil() {
            self.node_mut(v).p = p;
        }
    }

    fn insert_fixup(&mut self, mut z: Id) {
        while self.color(self.parent(z)).is_red() {
            let p = self.parent(z);
            // A red parent is never the root, so the grandparent exists.
            let g = self.parent(p);
            let side = self.dir_of(g, p);
            let uncle = self.node(g).ch[side ^ 1];

            if self.color(uncle).is_red() {
                trace!("insert_fixup: red uncle, recolor at {}", g.raw());
                self.set_color(p, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(g, Color::Red);
                z = g;
                continue;
            }

            if self.node(p).ch[side ^ 1] == z {
                trace!("insert_fixup: inner grandchild {}", z.raw());
                z = p;
                self.rotate(z, side);
            }

            trace!("insert_fixup: outer grandchild {}", z.raw());
            let p = self.parent(z);
            self.set_color(p, Color::Black);
            self.set_color(g, Color::Red);
            self.rotate(g, side ^ 1);
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Restores black-height after a black node left the position now held
    /// by `x`. `x` may be `NIL`, so its parent is passed explicitly.
    fn delete_fixup(&mut self, mut x: Id, mut parent: Id) {
        while x != self.root && self.color(x).is_black() {
            let side = self.dir_of(parent, x);
            let mut w = self.node(parent).ch[side ^ 1];
            debug_assert!(!w.is_nil(), "doubly black node without a sibling");

            if self.color(w).is_red() {
                trace!("delete_fixup: red sibling {}", w.raw());
                self.set_color(w, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                w = self.node(parent).ch[side ^ 1];
            }

            let near = self.node(w).ch[side];
            let far = self.node(w).ch[side ^ 1];
            if self.color(near).is_black() && self.color(far).is_black() {
                trace!("delete_fixup: black nephews, push up from {}", parent.raw());
                self.set_color(w, Color::Red);
                x = parent;
                parent = self.parent(x);
                continue;
            }

            if self.color(far).is_black() {
                trace!("delete_fixup: red near nephew {}", near.raw());
                self.set_color(near, Color::Black);
                self.set_color(w, Color::Red);
                self.rotate(w, side ^ 1);
                w = self.node(parent).ch[side ^ 1];
            }

            trace!("delete_fixup: red far nephew under {}", w.raw());
            let parent_color = self.color(parent);
            self.set_color(w, parent_color);
            self.set_color(parent, Color::Black);
            let far = self.node(w).ch[side ^ 1];
            self.set_color(far, Color::Black);
            self.rotate(parent, side);
            x = self.root;
            break;
        }
        if !x.is_nil() {
            self.set_color(x, Color::Black);
        }
    }

    /// Unlinks `z` from the tree and rebalances. `z` stays in the arena.
    fn unlink(&mut self, z: Id) {
        let [zl, zr] = self.node(z).ch;
        let mut removed = self.color(z);
        let x;
        let x_parent;

        if zl.is_nil() {
            x = zr;
            x_parent = self.parent(z);
            self.transplant(z, zr);
        } else if zr.is_nil() {
            x = zl;
            x_parent = self.parent(z);
            self.transplant(z, zl);
        } else {
            let y = self.min_from(zr);
            removed = self.color(y);
            x = self.node(y).ch[RIGHT];
            if self.parent(y) == z {
                x_parent = y;
            } else {
                x_parent = self.parent(y);
                self.transplant(y, x);
                self.node_mut(y).ch[RIGHT] = zr;
                self.node_mut(zr).p = y;
            }
            self.transplant(z, y);
            self.node_mut(y).ch[LEFT] = zl;
            self.node_mut(zl).p = y;
            let z_color = self.color(z);
            self.set_color(y, z_color);
        }

        if removed.is_black() {
            self.delete_fixup(x, x_parent);
        }
    }

    /// Stores `node` in a free slot if there is one, else at the end.
    fn alloc(&mut self, node: Node<K, V>) -> Id {
        self.len += 1;
        if let Some(x) = self.free.pop() {
            trace!("arena: reusing slot {}", x.raw());
            self.nodes[x.idx()] = Some(node);
            return x;
        }
        let x = id(self.nodes.len());
        self.nodes.push(Some(node));
        x
    }

    /// Takes the unlinked node `z` out of the arena and frees its slot.
    /// No other node moves.
    fn release(&mut self, z: Id) -> Node<K, V> {
        trace!("arena: releasing slot {}", z.raw());
        let Some(node) = self.nodes[z.idx()].take() else {
            unreachable!("released id {} names a vacant slot", z.raw());
        };
        self.free.push(z);
        self.len -= 1;
        node
    }

    fn delete_id(&mut self, z: Id) -> (K, V) {
        self.unlink(z);
        let node = self.release(z);
        (node.key, node.value)
    }

    /// Removes the node named by `handle` and returns its entry.
    pub fn delete(&mut self, handle: Handle) -> Result<(K, V), MapError> {
        let z = self.resolve(handle)?;
        Ok(self.delete_id(z))
    }

    pub fn min(&self) -> Option<Handle> {
        let x = self.first_id();
        (!x.is_nil()).then(|| self.handle(x))
    }

    pub fn max(&self) -> Option<Handle> {
        let x = self.last_id();
        (!x.is_nil()).then(|| self.handle(x))
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let x = self.first_id();
        (!x.is_nil()).then(|| self.pair(x))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let x = self.last_id();
        (!x.is_nil()).then(|| self.pair(x))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let x = self.first_id();
        (!x.is_nil()).then(|| self.delete_id(x))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let x = self.last_id();
        (!x.is_nil()).then(|| self.delete_id(x))
    }

    /// Node holding the next larger key, or `None` if `handle` is the maximum.
    pub fn successor(&self, handle: Handle) -> Result<Option<Handle>, MapError> {
        let x = self.step(self.resolve(handle)?, RIGHT);
        Ok((!x.is_nil()).then(|| self.handle(x)))
    }

    /// Node holding the next smaller key, or `None` if `handle` is the minimum.
    pub fn predecessor(&self, handle: Handle) -> Result<Option<Handle>, MapError> {
        let x = self.step(self.resolve(handle)?, LEFT);
        Ok((!x.is_nil()).then(|| self.handle(x)))
    }

    pub fn key(&self, handle: Handle) -> Result<&K, MapError> {
        Ok(&self.node(self.resolve(handle)?).key)
    }

    pub fn value(&self, handle: Handle) -> Result<&V, MapError> {
        Ok(&self.node(self.resolve(handle)?).value)
    }

    pub fn value_mut(&mut self, handle: Handle) -> Result<&mut V, MapError> {
        let x = self.resolve(handle)?;
        Ok(&mut self.node_mut(x).value)
    }

    pub fn entry(&self, handle: Handle) -> Result<(&K, &V), MapError> {
        Ok(self.pair(self.resolve(handle)?))
    }

    pub(crate) fn pair(&self, x: Id) -> (&K, &V) {
        let node = self.node(x);
        (&node.key, &node.value)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut best = 0;
        let mut stack = Vec::new();
        if !self.root.is_nil() {
            stack.push((self.root, 1));
        }
        while let Some((x, depth)) = stack.pop() {
            best = best.max(depth);
            let children = self.node(x).ch;
            for c in children {
                if !c.is_nil() {
                    stack.push((c, depth + 1));
                }
            }
        }
        best
    }

    /// Black nodes on the leftmost root-to-leaf path (0 when empty).
    pub fn black_height(&self) -> usize {
        let mut count = 0;
        let mut x = self.root;
        while !x.is_nil() {
            if self.node(x).color.is_black() {
                count += 1;
            }
            x = self.node(x).ch[LEFT];
        }
        count
    }
}

impl<K: Ord, V> RbTreeMap<K, V> {
    fn find(&self, key: &K) -> Id {
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = self.node(cur);
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.ch[LEFT],
                Ordering::Greater => cur = node.ch[RIGHT],
                Ordering::Equal => return cur,
            }
        }
        Id::NIL
    }

    /// Inserts `key` and returns the previous value if it was present.
    ///
    /// An existing key keeps its node; only the value is replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_handle(key, value).1
    }

    /// Like [`insert`](Self::insert), also returning the handle of the node
    /// that now holds `key`.
    pub fn insert_handle(&mut self, key: K, value: V) -> (Handle, Option<V>) {
        let mut p = Id::NIL;
        let mut dir = LEFT;
        let mut cur = self.root;
        while !cur.is_nil() {
            match key.cmp(&self.node(cur).key) {
                Ordering::Less => dir = LEFT,
                Ordering::Greater => dir = RIGHT,
                Ordering::Equal => {
                    let old = std::mem::replace(&mut self.node_mut(cur).value, value);
                    return (self.handle(cur), Some(old));
                }
            }
            p = cur;
            cur = self.node(cur).ch[dir];
        }

        let stamp = self.next_stamp;
        self.next_stamp += 1;
        let z = self.alloc(Node::new(key, value, p, stamp));
        if p.is_nil() {
            self.root = z;
        } else {
            self.node_mut(p).ch[dir] = z;
        }
        self.insert_fixup(z);
        (self.handle(z), None)
    }

    pub fn lookup(&self, key: &K) -> Result<Handle, MapError> {
        let x = self.find(key);
        if x.is_nil() {
            Err(MapError::NotFound)
        } else {
            Ok(self.handle(x))
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let x = self.find(key);
        (!x.is_nil()).then(|| &self.node(x).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let x = self.find(key);
        if x.is_nil() {
            None
        } else {
            Some(&mut self.node_mut(x).value)
        }
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let x = self.find(key);
        (!x.is_nil()).then(|| self.pair(x))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        !self.find(key).is_nil()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).ok().map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &K) -> Result<(K, V), MapError> {
        let x = self.find(key);
        if x.is_nil() {
            return Err(MapError::NotFound);
        }
        Ok(self.delete_id(x))
    }

    /// Smallest entry whose key is `>= key`.
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        let mut cur = self.root;
        let mut candidate = Id::NIL;
        while !cur.is_nil() {
            let node = self.node(cur);
            if key <= &node.key {
                candidate = cur;
                cur = node.ch[LEFT];
            } else {
                cur = node.ch[RIGHT];
            }
        }
        (!candidate.is_nil()).then(|| self.pair(candidate))
    }
}

impl<K, V> Default for RbTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for RbTreeMap<K, V> {
    /// The clone is a distinct map: handles from `self` are foreign to it.
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            free: self.free.clone(),
            root: self.root,
            len: self.len,
            owner: next_owner(),
            next_stamp: self.next_stamp,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for RbTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V> OrderedMap for RbTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        RbTreeMap::new()
    }

    fn len(&self) -> usize {
        RbTreeMap::len(self)
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value> {
        RbTreeMap::get(self, key)
    }

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        RbTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value> {
        RbTreeMap::remove(self, key)
    }

    fn lower_bound(&self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)> {
        RbTreeMap::lower_bound(self, key)
    }
}
