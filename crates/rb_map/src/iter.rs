use std::iter::FusedIterator;

use crate::node::{Id, LEFT, RIGHT};
use crate::rb::RbTreeMap;

/// Ascending iterator over the entries of an [`RbTreeMap`].
///
/// Walks successor links from both ends, so it is double-ended and never
/// allocates. The map is borrowed for the iterator's lifetime, which rules
/// out structural changes mid-walk.
pub struct Iter<'a, K, V> {
    map: &'a RbTreeMap<K, V>,
    front: Id,
    back: Id,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(map: &'a RbTreeMap<K, V>) -> Self {
        Self {
            map,
            front: map.first_id(),
            back: map.last_id(),
            remaining: map.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = self.map.step(x, RIGHT);
        }
        Some(self.map.pair(x))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = self.map.step(x, LEFT);
        }
        Some(self.map.pair(x))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a RbTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::RbTreeMap;

    fn sample() -> RbTreeMap<u32, char> {
        [(5, 'e'), (1, 'a'), (3, 'c'), (2, 'b'), (4, 'd')]
            .into_iter()
            .collect()
    }

    #[test]
    fn ascending_and_descending() {
        let map = sample();
        let up: Vec<u32> = map.keys().copied().collect();
        assert_eq!(up, vec![1, 2, 3, 4, 5]);
        let down: Vec<char> = map.values().rev().copied().collect();
        assert_eq!(down, vec!['e', 'd', 'c', 'b', 'a']);
    }

    #[test]
    fn ends_meet_in_the_middle() {
        let map = sample();
        let mut it = map.iter();
        assert_eq!(it.len(), 5);
        assert_eq!(it.next(), Some((&1, &'a')));
        assert_eq!(it.next_back(), Some((&5, &'e')));
        assert_eq!(it.next(), Some((&2, &'b')));
        assert_eq!(it.next_back(), Some((&4, &'d')));
        assert_eq!(it.len(), 1);
        assert_eq!(it.next(), Some((&3, &'c')));
        assert_eq!(it.next_back(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn restartable_from_the_map() {
        let map = sample();
        let first: Vec<_> = (&map).into_iter().collect();
        let second: Vec<_> = map.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn key_and_value_views_clone_and_stay_exhausted() {
        let map = sample();
        let mut keys = map.keys();
        keys.next();
        let rest: Vec<u32> = keys.clone().copied().collect();
        assert_eq!(rest, vec![2, 3, 4, 5]);
        assert_eq!(keys.len(), 4);

        let mut values = map.values();
        let all: Vec<char> = values.clone().copied().collect();
        assert_eq!(all, vec!['a', 'b', 'c', 'd', 'e']);
        assert_eq!(values.by_ref().count(), 5);
        assert_eq!(values.next(), None);
        assert_eq!(values.next_back(), None);
        assert_eq!(keys.by_ref().count(), 4);
        assert_eq!(keys.next(), None);
    }

    #[test]
    fn empty_map_yields_nothing() {
        let map: RbTreeMap<u32, u32> = RbTreeMap::new();
        assert_eq!(map.iter().next(), None);
        assert_eq!(map.iter().next_back(), None);
        assert_eq!(map.keys().len(), 0);
    }
}
