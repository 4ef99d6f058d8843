//! `NodePtr` is the tagged reference spec.md §4.1 describes as a
//! machine-word tagged pointer (empty / leaf / bitmask-internal). Here it
//! is a plain Rust enum — spec.md §9 explicitly allows any representation
//! that keeps the per-edge footprint to one conceptual slot, and an enum
//! gives that without unsafe pointer tagging.

use crate::node::bitmap_leaf::{self, BitmapLeaf};
use crate::node::internal::InternalNode;
use crate::node::leaf::{self, CompactLeaf};
use crate::node::skip::SkipPath;
use crate::key::SuffixWidth;

pub(crate) enum Upsert<V> {
    Inserted,
    AlreadyPresent,
    Replaced(V),
}

impl<V> From<bitmap_leaf::Upsert<V>> for Upsert<V> {
    fn from(u: bitmap_leaf::Upsert<V>) -> Self {
        match u {
            bitmap_leaf::Upsert::Inserted => Upsert::Inserted,
            bitmap_leaf::Upsert::AlreadyPresent => Upsert::AlreadyPresent,
            bitmap_leaf::Upsert::Replaced(v) => Upsert::Replaced(v),
        }
    }
}

impl<V> From<leaf::Upsert<V>> for Upsert<V> {
    fn from(u: leaf::Upsert<V>) -> Self {
        match u {
            leaf::Upsert::Inserted => Upsert::Inserted,
            leaf::Upsert::AlreadyPresent => Upsert::AlreadyPresent,
            leaf::Upsert::Replaced(v) => Upsert::Replaced(v),
        }
    }
}

/// A leaf node holding the unresolved low bits ("suffix") of every key
/// beneath it, stored in whichever of the four container kinds fits the
/// number of suffix bits remaining at this depth (spec.md §4.1–§4.3).
pub(crate) enum LeafNode<V> {
    Bitmap(BitmapLeaf<V>),
    U16(CompactLeaf<u16, V>),
    U32(CompactLeaf<u32, V>),
    U64(CompactLeaf<u64, V>),
}

impl<V> LeafNode<V> {
    pub(crate) fn single(width: SuffixWidth, skip: SkipPath, suffix: u64, value: V) -> Self {
        match width {
            SuffixWidth::Bitmap => LeafNode::Bitmap(BitmapLeaf::single(skip, suffix as u8, value)),
            SuffixWidth::U16 => LeafNode::U16(CompactLeaf::single(skip, suffix as u16, value)),
            SuffixWidth::U32 => LeafNode::U32(CompactLeaf::single(skip, suffix as u32, value)),
            SuffixWidth::U64 => LeafNode::U64(CompactLeaf::single(skip, suffix, value)),
        }
    }

    pub(crate) fn width(&self) -> SuffixWidth {
        match self {
            LeafNode::Bitmap(_) => SuffixWidth::Bitmap,
            LeafNode::U16(_) => SuffixWidth::U16,
            LeafNode::U32(_) => SuffixWidth::U32,
            LeafNode::U64(_) => SuffixWidth::U64,
        }
    }

    pub(crate) fn skip(&self) -> &SkipPath {
        match self {
            LeafNode::Bitmap(l) => &l.skip,
            LeafNode::U16(l) => &l.skip,
            LeafNode::U32(l) => &l.skip,
            LeafNode::U64(l) => &l.skip,
        }
    }

    pub(crate) fn set_skip(&mut self, skip: SkipPath) {
        match self {
            LeafNode::Bitmap(l) => l.skip = skip,
            LeafNode::U16(l) => l.skip = skip,
            LeafNode::U32(l) => l.skip = skip,
            LeafNode::U64(l) => l.skip = skip,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            LeafNode::Bitmap(l) => l.len(),
            LeafNode::U16(l) => l.len(),
            LeafNode::U32(l) => l.len(),
            LeafNode::U64(l) => l.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn find(&self, suffix: u64) -> Option<&V> {
        match self {
            LeafNode::Bitmap(l) => l.find(suffix as u8),
            LeafNode::U16(l) => l.find(suffix as u16),
            LeafNode::U32(l) => l.find(suffix as u32),
            LeafNode::U64(l) => l.find(suffix),
        }
    }

    pub(crate) fn find_mut(&mut self, suffix: u64) -> Option<&mut V> {
        match self {
            LeafNode::Bitmap(l) => l.find_mut(suffix as u8),
            LeafNode::U16(l) => l.find_mut(suffix as u16),
            LeafNode::U32(l) => l.find_mut(suffix as u32),
            LeafNode::U64(l) => l.find_mut(suffix),
        }
    }

    pub(crate) fn contains(&self, suffix: u64) -> bool {
        match self {
            LeafNode::Bitmap(l) => l.contains(suffix as u8),
            LeafNode::U16(l) => l.contains(suffix as u16),
            LeafNode::U32(l) => l.contains(suffix as u32),
            LeafNode::U64(l) => l.contains(suffix),
        }
    }

    pub(crate) fn upsert(&mut self, suffix: u64, value: V, overwrite: bool) -> Upsert<V> {
        match self {
            LeafNode::Bitmap(l) => l.upsert(suffix as u8, value, overwrite).into(),
            LeafNode::U16(l) => l.upsert(suffix as u16, value, overwrite).into(),
            LeafNode::U32(l) => l.upsert(suffix as u32, value, overwrite).into(),
            LeafNode::U64(l) => l.upsert(suffix, value, overwrite).into(),
        }
    }

    pub(crate) fn assign_if_present(&mut self, suffix: u64, value: V) -> Option<V> {
        match self {
            LeafNode::Bitmap(l) => l.assign_if_present(suffix as u8, value),
            LeafNode::U16(l) => l.assign_if_present(suffix as u16, value),
            LeafNode::U32(l) => l.assign_if_present(suffix as u32, value),
            LeafNode::U64(l) => l.assign_if_present(suffix, value),
        }
    }

    pub(crate) fn remove(&mut self, suffix: u64) -> Option<V> {
        match self {
            LeafNode::Bitmap(l) => l.remove(suffix as u8),
            LeafNode::U16(l) => l.remove(suffix as u16),
            LeafNode::U32(l) => l.remove(suffix as u32),
            LeafNode::U64(l) => l.remove(suffix),
        }
    }

    pub(crate) fn first(&self) -> Option<(u64, &V)> {
        match self {
            LeafNode::Bitmap(l) => l.first().map(|(s, v)| (s as u64, v)),
            LeafNode::U16(l) => l.first().map(|(s, v)| (s as u64, v)),
            LeafNode::U32(l) => l.first().map(|(s, v)| (s as u64, v)),
            LeafNode::U64(l) => l.first(),
        }
    }

    pub(crate) fn last(&self) -> Option<(u64, &V)> {
        match self {
            LeafNode::Bitmap(l) => l.last().map(|(s, v)| (s as u64, v)),
            LeafNode::U16(l) => l.last().map(|(s, v)| (s as u64, v)),
            LeafNode::U32(l) => l.last().map(|(s, v)| (s as u64, v)),
            LeafNode::U64(l) => l.last(),
        }
    }

    pub(crate) fn succ(&self, suffix: u64) -> Option<(u64, &V)> {
        match self {
            LeafNode::Bitmap(l) => l.succ(suffix as u8).map(|(s, v)| (s as u64, v)),
            LeafNode::U16(l) => l.succ(suffix as u16).map(|(s, v)| (s as u64, v)),
            LeafNode::U32(l) => l.succ(suffix as u32).map(|(s, v)| (s as u64, v)),
            LeafNode::U64(l) => l.succ(suffix),
        }
    }

    pub(crate) fn pred(&self, suffix: u64) -> Option<(u64, &V)> {
        match self {
            LeafNode::Bitmap(l) => l.pred(suffix as u8).map(|(s, v)| (s as u64, v)),
            LeafNode::U16(l) => l.pred(suffix as u16).map(|(s, v)| (s as u64, v)),
            LeafNode::U32(l) => l.pred(suffix as u32).map(|(s, v)| (s as u64, v)),
            LeafNode::U64(l) => l.pred(suffix),
        }
    }

    pub(crate) fn ceiling(&self, suffix: u64) -> Option<(u64, &V)> {
        match self {
            LeafNode::Bitmap(l) => l.ceiling(suffix as u8).map(|(s, v)| (s as u64, v)),
            LeafNode::U16(l) => l.ceiling(suffix as u16).map(|(s, v)| (s as u64, v)),
            LeafNode::U32(l) => l.ceiling(suffix as u32).map(|(s, v)| (s as u64, v)),
            LeafNode::U64(l) => l.ceiling(suffix),
        }
    }

    pub(crate) fn floor(&self, suffix: u64) -> Option<(u64, &V)> {
        match self {
            LeafNode::Bitmap(l) => l.floor(suffix as u8).map(|(s, v)| (s as u64, v)),
            LeafNode::U16(l) => l.floor(suffix as u16).map(|(s, v)| (s as u64, v)),
            LeafNode::U32(l) => l.floor(suffix as u32).map(|(s, v)| (s as u64, v)),
            LeafNode::U64(l) => l.floor(suffix),
        }
    }

    /// Every suffix currently stored, in no particular order. Used to
    /// cost-predict a leaf-to-subtree split before committing to it
    /// (spec.md §5/§7's allocate-before-mutate rule).
    pub(crate) fn suffixes(&self) -> Vec<u64> {
        match self {
            LeafNode::Bitmap(l) => l.iter().map(|(s, _)| s as u64).collect(),
            LeafNode::U16(l) => l.iter().map(|(s, _)| s as u64).collect(),
            LeafNode::U32(l) => l.iter().map(|(s, _)| s as u64).collect(),
            LeafNode::U64(l) => l.iter().map(|(s, _)| s as u64).collect(),
        }
    }

    pub(crate) fn into_entries(self) -> Vec<(u64, V)> {
        match self {
            LeafNode::Bitmap(l) => l.into_entries().into_iter().map(|(s, v)| (s as u64, v)).collect(),
            LeafNode::U16(l) => l.into_entries().into_iter().map(|(s, v)| (s as u64, v)).collect(),
            LeafNode::U32(l) => l.into_entries().into_iter().map(|(s, v)| (s as u64, v)).collect(),
            LeafNode::U64(l) => l.into_entries(),
        }
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        match self {
            LeafNode::Bitmap(l) => l.memory_bytes(),
            LeafNode::U16(l) => l.memory_bytes(),
            LeafNode::U32(l) => l.memory_bytes(),
            LeafNode::U64(l) => l.memory_bytes(),
        }
    }
}

/// The tagged reference stored in every child slot and at the root.
pub(crate) enum NodePtr<V> {
    Empty,
    Leaf(Box<LeafNode<V>>),
    Internal(Box<InternalNode<V>>),
}

impl<V> Default for NodePtr<V> {
    fn default() -> Self {
        NodePtr::Empty
    }
}

impl<V> NodePtr<V> {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, NodePtr::Empty)
    }

    pub(crate) fn leaf(node: LeafNode<V>) -> Self {
        NodePtr::Leaf(Box::new(node))
    }

    pub(crate) fn internal(node: InternalNode<V>) -> Self {
        NodePtr::Internal(Box::new(node))
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        match self {
            NodePtr::Empty => 0,
            NodePtr::Leaf(l) => l.memory_bytes(),
            NodePtr::Internal(n) => n.memory_bytes(),
        }
    }
}
