use std::cmp::Ordering;

use crate::OrderedMap;

/// Plain binary search tree with no rebalancing.
///
/// Kept as a baseline: sorted input degrades it into a linked list of
/// height `n`, which is exactly what [`RbTreeMap`](crate::RbTreeMap) avoids.
pub struct UnbalancedBst<K, V> {
    root: Link<K, V>,
    len: usize,
}

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }
}

/// Detaches the leftmost node under `link`, splicing its right child into
/// its place.
fn detach_min<K, V>(link: &mut Link<K, V>) -> Link<K, V> {
    let mut cur = link;
    while cur.as_ref().is_some_and(|node| node.left.is_some()) {
        cur = &mut cur.as_mut()?.left;
    }
    let mut min = cur.take()?;
    *cur = min.right.take();
    Some(min)
}

impl<K, V> Drop for UnbalancedBst<K, V> {
    /// Sorted input makes the tree a chain as deep as it is long, so nodes
    /// are freed from an explicit stack.
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

impl<K: Ord, V> UnbalancedBst<K, V> {
    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut best = 0;
        let mut stack: Vec<(&Node<K, V>, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 1));
        }
        while let Some((node, depth)) = stack.pop() {
            best = best.max(depth);
            for child in [node.left.as_deref(), node.right.as_deref()]
                .into_iter()
                .flatten()
            {
                stack.push((child, depth + 1));
            }
        }
        best
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }
}

impl<K: Ord, V> OrderedMap for UnbalancedBst<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        Self { root: None, len: 0 }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        let mut cur = &mut self.root;
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = &mut node.left,
                Ordering::Greater => cur = &mut node.right,
                Ordering::Equal => return Some(std::mem::replace(&mut node.value, value)),
            }
        }
        *cur = Some(Box::new(Node::new(key, value)));
        self.len += 1;
        None
    }

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value> {
        let mut cur = &mut self.root;
        loop {
            match key.cmp(&cur.as_deref()?.key) {
                Ordering::Equal => break,
                Ordering::Less => cur = &mut cur.as_mut()?.left,
                Ordering::Greater => cur = &mut cur.as_mut()?.right,
            }
        }

        let mut node = cur.take()?;
        let mut right = node.right.take();
        *cur = match detach_min(&mut right) {
            None => node.left.take(),
            Some(mut succ) => {
                succ.left = node.left.take();
                succ.right = right;
                Some(succ)
            }
        };
        self.len -= 1;
        Some(node.value)
    }

    fn lower_bound(&self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)> {
        let mut cur = self.root.as_deref();
        let mut candidate = None;
        while let Some(node) = cur {
            if key <= &node.key {
                candidate = Some(node);
                cur = node.left.as_deref();
            } else {
                cur = node.right.as_deref();
            }
        }
        candidate.map(|n| (&n.key, &n.value))
    }
}

pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut cur: Option<&'a Node<K, V>>) {
        while let Some(node) = cur {
            self.stack.push(node);
            cur = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}
