use crate::error::InvariantViolation;
use crate::node::{Id, LEFT, RIGHT};
use crate::rb::RbTreeMap;

impl<K: Ord, V> RbTreeMap<K, V> {
    /// Verifies every structural invariant and returns the number of black
    /// nodes on each root-to-leaf path.
    ///
    /// Runs in `O(n)`; meant for tests and debugging. Any error is a defect
    /// in the tree code.
    pub fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        if self.root.is_nil() {
            return if self.is_empty() {
                Ok(0)
            } else {
                Err(InvariantViolation::Len {
                    reachable: 0,
                    len: self.len(),
                })
            };
        }

        let root = self.node(self.root);
        if !root.p.is_nil() {
            return Err(InvariantViolation::RootHasParent(self.root.raw()));
        }
        if root.color.is_red() {
            return Err(InvariantViolation::RedRoot(self.root.raw()));
        }

        let mut reachable = 0;
        let black_height = self.check_subtree(self.root, None, None, &mut reachable)?;
        let occupied = self.nodes.iter().filter(|slot| slot.is_some()).count();
        if reachable != self.len() || occupied != self.len() {
            return Err(InvariantViolation::Len {
                reachable,
                len: self.len(),
            });
        }
        Ok(black_height)
    }

    /// Black nodes on every path from `x` down to a `NIL` leaf, with each key
    /// checked against the open bounds `(lo, hi)`.
    fn check_subtree(
        &self,
        x: Id,
        lo: Option<&K>,
        hi: Option<&K>,
        reachable: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        if x.is_nil() {
            return Ok(0);
        }
        *reachable += 1;
        let node = self.node(x);
        if lo.is_some_and(|lo| &node.key <= lo) || hi.is_some_and(|hi| &node.key >= hi) {
            return Err(InvariantViolation::Order(x.raw()));
        }

        for c in node.ch {
            if c.is_nil() {
                continue;
            }
            if self.node(c).p != x {
                return Err(InvariantViolation::BrokenLink {
                    parent: x.raw(),
                    child: c.raw(),
                });
            }
            if node.color.is_red() && self.node(c).color.is_red() {
                return Err(InvariantViolation::RedRed {
                    parent: x.raw(),
                    child: c.raw(),
                });
            }
        }

        let left = self.check_subtree(node.ch[LEFT], lo, Some(&node.key), reachable)?;
        let right = self.check_subtree(node.ch[RIGHT], Some(&node.key), hi, reachable)?;
        if left != right {
            return Err(InvariantViolation::BlackHeight {
                node: x.raw(),
                left,
                right,
            });
        }
        Ok(left + usize::from(node.color.is_black()))
    }
}
