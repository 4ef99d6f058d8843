//! Bitmask-internal nodes (spec.md §4.4): a 256-bit presence bitmap plus
//! a dense, rank-ordered array of child references and per-child
//! descendant counts, preceded by an optional skip chain of shared
//! prefix bytes.

use crate::bitmap::Bitmap256;
use crate::node::ptr::NodePtr;
use crate::node::skip::SkipPath;
use crate::node::{cap_descendants, COALESCE_CAP};

pub(crate) struct InternalNode<V> {
    pub(crate) skip: SkipPath,
    bitmap: Bitmap256,
    children: Vec<NodePtr<V>>,
    child_descendants: Vec<u16>,
    descendants: u16,
}

impl<V> InternalNode<V> {
    pub(crate) fn empty(skip: SkipPath) -> Self {
        InternalNode {
            skip,
            bitmap: Bitmap256::new(),
            children: Vec::new(),
            child_descendants: Vec::new(),
            descendants: 0,
        }
    }

    /// Build the two-child node a prefix-split produces (spec.md §4.4).
    pub(crate) fn with_two_children(
        skip: SkipPath,
        byte_a: u8,
        child_a: NodePtr<V>,
        desc_a: u16,
        byte_b: u8,
        child_b: NodePtr<V>,
        desc_b: u16,
    ) -> Self {
        let mut node = InternalNode::empty(skip);
        node.insert_child(byte_a, child_a, desc_a);
        node.insert_child(byte_b, child_b, desc_b);
        node
    }

    pub(crate) fn popcount(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn descendants(&self) -> u16 {
        self.descendants
    }

    pub(crate) fn has_child(&self, byte: u8) -> bool {
        self.bitmap.test(byte)
    }

    pub(crate) fn get(&self, byte: u8) -> Option<&NodePtr<V>> {
        if self.bitmap.test(byte) {
            Some(&self.children[self.bitmap.rank(byte)])
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, byte: u8) -> Option<&mut NodePtr<V>> {
        if self.bitmap.test(byte) {
            let slot = self.bitmap.rank(byte);
            Some(&mut self.children[slot])
        } else {
            None
        }
    }

    /// Insert a brand-new child at `byte`; panics if one is already present.
    pub(crate) fn insert_child(&mut self, byte: u8, node: NodePtr<V>, descendants: u16) {
        debug_assert!(!self.bitmap.test(byte), "child slot already occupied");
        let slot = self.bitmap.rank(byte);
        self.bitmap.set(byte);
        self.children.insert(slot, node);
        self.child_descendants.insert(slot, descendants);
        self.recompute_descendants();
    }

    /// Remove and return the child at `byte`; panics if absent.
    pub(crate) fn remove_child(&mut self, byte: u8) -> (NodePtr<V>, u16) {
        debug_assert!(self.bitmap.test(byte), "removing absent child");
        let slot = self.bitmap.rank(byte);
        self.bitmap.clear(byte);
        let node = self.children.remove(slot);
        let desc = self.child_descendants.remove(slot);
        self.recompute_descendants();
        (node, desc)
    }

    /// Overwrite the count attached to an existing child after its
    /// subtree changed shape, and re-derive this node's own descendant
    /// counter from the (possibly still-capped) per-child counts.
    pub(crate) fn set_child_descendants(&mut self, byte: u8, count: u16) {
        let slot = self.bitmap.rank(byte);
        self.child_descendants[slot] = count;
        self.recompute_descendants();
    }

    /// Recompute this node's own descendant counter by summing the
    /// per-child counters. If any child counter is itself the
    /// [`COALESCE_CAP`] sentinel (exact count unknown, > COMPACT_MAX),
    /// this node's own counter stays capped too — a capped subtree can
    /// only shrink back to an exact count once it is rebuilt from a
    /// fresh leaf, never by arithmetic alone.
    ///
    /// This walks at most 256 children, so it is bounded by the trie's
    /// branching factor rather than by subtree size — not the literal
    /// O(1) increment/decrement spec.md's Design Notes sketch, but a
    /// simpler and equally correct way to keep the same invariant.
    fn recompute_descendants(&mut self) {
        if self.child_descendants.iter().any(|&d| d == COALESCE_CAP) {
            self.descendants = COALESCE_CAP;
        } else {
            let sum: usize = self.child_descendants.iter().map(|&d| d as usize).sum();
            self.descendants = cap_descendants(sum);
        }
    }

    /// If exactly one child remains, return its dispatch byte. Used by
    /// erase to decide whether this node should collapse away.
    pub(crate) fn single_child_byte(&self) -> Option<u8> {
        if self.popcount() == 1 {
            self.bitmap.min_set()
        } else {
            None
        }
    }

    /// Remove and return the sole remaining child (caller must have
    /// checked [`single_child_byte`] first and discards this node).
    pub(crate) fn take_single_child(&mut self) -> (u8, NodePtr<V>) {
        let byte = self.single_child_byte().expect("not a single-child node");
        let (node, _desc) = self.remove_child(byte);
        (byte, node)
    }

    pub(crate) fn first_child(&self) -> Option<(u8, &NodePtr<V>)> {
        let b = self.bitmap.min_set()?;
        Some((b, &self.children[self.bitmap.rank(b)]))
    }

    pub(crate) fn last_child(&self) -> Option<(u8, &NodePtr<V>)> {
        let b = self.bitmap.max_set()?;
        Some((b, &self.children[self.bitmap.rank(b)]))
    }

    /// First child whose dispatch byte is strictly greater than `byte`.
    pub(crate) fn child_after(&self, byte: u8) -> Option<(u8, &NodePtr<V>)> {
        let b = self.bitmap.next_set_after(byte)?;
        Some((b, &self.children[self.bitmap.rank(b)]))
    }

    /// Last child whose dispatch byte is strictly less than `byte`.
    pub(crate) fn child_before(&self, byte: u8) -> Option<(u8, &NodePtr<V>)> {
        let b = self.bitmap.prev_set_before(byte)?;
        Some((b, &self.children[self.bitmap.rank(b)]))
    }

    /// First child whose dispatch byte is greater-than-or-equal to `byte`.
    pub(crate) fn child_from(&self, byte: u8) -> Option<(u8, &NodePtr<V>)> {
        let b = self.bitmap.next_set_from(byte)?;
        Some((b, &self.children[self.bitmap.rank(b)]))
    }

    /// Last child whose dispatch byte is less-than-or-equal to `byte`.
    pub(crate) fn child_up_to(&self, byte: u8) -> Option<(u8, &NodePtr<V>)> {
        let b = self.bitmap.last_set_up_to(byte)?;
        Some((b, &self.children[self.bitmap.rank(b)]))
    }

    /// Consume this node, returning its children paired with their
    /// dispatch bytes in ascending order. Used when flattening a whole
    /// subtree back into one leaf (spec.md §4.6 "coalesce").
    pub(crate) fn into_children(self) -> Vec<(u8, NodePtr<V>)> {
        self.bitmap.iter_ascending().zip(self.children.into_iter()).collect()
    }

    /// Borrow this node's children in ascending dispatch-byte order,
    /// without consuming it. Used by stats collection and iteration.
    pub(crate) fn children(&self) -> impl Iterator<Item = &NodePtr<V>> {
        self.children.iter()
    }

    /// This node's own allocation footprint, excluding its children's
    /// subtrees (used by [`crate::stats`] when walking bottom-up).
    pub(crate) fn own_bytes(&self) -> usize {
        use std::mem::size_of;
        self.children.capacity() * size_of::<NodePtr<V>>()
            + self.child_descendants.capacity() * size_of::<u16>()
            + size_of::<Self>()
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        self.own_bytes() + self.children.iter().map(|c| c.memory_bytes()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::leaf::CompactLeaf;
    use crate::node::ptr::LeafNode;

    fn leaf_ptr(suffix: u32, value: u32) -> NodePtr<u32> {
        NodePtr::leaf(LeafNode::U32(CompactLeaf::single(SkipPath::empty(), suffix, value)))
    }

    #[test]
    fn insert_and_lookup_children() {
        let mut node = InternalNode::empty(SkipPath::empty());
        node.insert_child(10, leaf_ptr(1, 100), 1);
        node.insert_child(20, leaf_ptr(2, 200), 1);
        node.insert_child(5, leaf_ptr(3, 300), 1);
        assert_eq!(node.popcount(), 3);
        assert!(node.get(10).is_some());
        assert!(node.get(99).is_none());
        assert_eq!(node.descendants(), 3);
        let (b, _) = node.first_child().unwrap();
        assert_eq!(b, 5);
        let (b, _) = node.last_child().unwrap();
        assert_eq!(b, 20);
    }

    #[test]
    fn navigation_across_dispatch_bytes() {
        let mut node = InternalNode::empty(SkipPath::empty());
        node.insert_child(10, leaf_ptr(1, 100), 1);
        node.insert_child(20, leaf_ptr(2, 200), 1);
        assert_eq!(node.child_after(10).map(|(b, _)| b), Some(20));
        assert_eq!(node.child_after(20), None);
        assert_eq!(node.child_before(20).map(|(b, _)| b), Some(10));
        assert_eq!(node.child_from(15).map(|(b, _)| b), Some(20));
        assert_eq!(node.child_up_to(15).map(|(b, _)| b), Some(10));
    }

    #[test]
    fn descendant_cap_propagates_from_children() {
        let mut node = InternalNode::empty(SkipPath::empty());
        node.insert_child(1, leaf_ptr(1, 1), COALESCE_CAP);
        node.insert_child(2, leaf_ptr(2, 2), 5);
        assert_eq!(node.descendants(), COALESCE_CAP);
        node.set_child_descendants(1, 10);
        assert_eq!(node.descendants(), 15);
    }

    #[test]
    fn remove_down_to_single_child_is_detected() {
        let mut node = InternalNode::empty(SkipPath::empty());
        node.insert_child(1, leaf_ptr(1, 1), 1);
        node.insert_child(2, leaf_ptr(2, 2), 1);
        assert_eq!(node.single_child_byte(), None);
        node.remove_child(1);
        assert_eq!(node.single_child_byte(), Some(2));
        let (byte, _child) = node.take_single_child();
        assert_eq!(byte, 2);
        assert_eq!(node.popcount(), 0);
    }
}
