pub(crate) const LEFT: usize = 0;
pub(crate) const RIGHT: usize = 1;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Id(u32);

impl Id {
    pub(crate) const NIL: Self = Self(u32::MAX);

    #[inline(always)]
    pub(crate) fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline(always)]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub(crate) fn raw(self) -> u32 {
        self.0
    }
}

#[inline(always)]
pub(crate) fn id(v: usize) -> Id {
    debug_assert!(v < u32::MAX as usize);
    Id(v as u32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    #[inline(always)]
    pub(crate) fn is_red(self) -> bool {
        matches!(self, Self::Red)
    }

    #[inline(always)]
    pub(crate) fn is_black(self) -> bool {
        matches!(self, Self::Black)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) color: Color,
    /// `[left, right]`.
    pub(crate) ch: [Id; 2],
    /// Non-owning back link; `NIL` for the root.
    pub(crate) p: Id,
    pub(crate) stamp: u64,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, parent: Id, stamp: u64) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            ch: [Id::NIL, Id::NIL],
            p: parent,
            stamp,
        }
    }
}

/// Names one node of a specific [`RbTreeMap`](crate::RbTreeMap).
///
/// Handles are cheap to copy and survive rebalancing as well as the deletion
/// of other nodes. A handle stops being valid only once its own node is
/// deleted; using it then yields
/// [`MapError::StaleHandle`](crate::MapError::StaleHandle), even after the
/// slot has been reused by a later insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) owner: u32,
    pub(crate) id: Id,
    pub(crate) stamp: u64,
}
