//! Node taxonomy (spec.md §4.1–§4.4): compact leaves, the 8-bit bitmap
//! leaf, and bitmask-internal nodes with skip chains, joined by a tagged
//! reference (`NodePtr`) standing in for spec.md's tagged pointer.

pub(crate) mod bitmap_leaf;
pub(crate) mod internal;
pub(crate) mod leaf;
pub(crate) mod ptr;
pub(crate) mod skip;

/// Upper bound on entries in a compact/bitmap leaf before it is split
/// into a bitmask-internal node (spec.md §3 "Constants and invariants").
pub(crate) const COMPACT_MAX: usize = 4096;

/// Sentinel descendant-count value meaning "> COMPACT_MAX, exact value
/// not tracked" (spec.md §3, §4.6).
pub(crate) const COALESCE_CAP: u16 = (COMPACT_MAX + 1) as u16;

/// Cap a (possibly large) exact count into the `u16` descendant-count
/// representation, collapsing anything over [`COMPACT_MAX`] to
/// [`COALESCE_CAP`].
pub(crate) fn cap_descendants(n: usize) -> u16 {
    if n > COMPACT_MAX {
        COALESCE_CAP
    } else {
        n as u16
    }
}

/// Nominal word costs used to drive [`crate::alloc::NodeAlloc`] accounting.
/// These are not meant to mirror an exact in-memory layout (this crate's
/// nodes are ordinary `Box`/`Vec` allocations sized by the real global
/// allocator); they give the allocator hook a stable, deterministic
/// notion of "how big was this growth" to apply a budget against.
pub(crate) const WORDS_LEAF_BASE: u32 = 4;
pub(crate) const WORDS_PER_ENTRY: u32 = 2;
pub(crate) const WORDS_INTERNAL_BASE: u32 = 8;
pub(crate) const WORDS_PER_CHILD: u32 = 3;

pub(crate) use bitmap_leaf::BitmapLeaf;
pub(crate) use internal::InternalNode;
pub(crate) use leaf::CompactLeaf;
pub(crate) use ptr::{LeafNode, NodePtr};
pub(crate) use skip::SkipPath;

/// Number of entries reachable under `ptr`, capped the same way a stored
/// descendant counter is (spec.md §4.5/§4.6) — used whenever a freshly
/// built or reshaped subtree needs its descendant count read back out.
pub(crate) fn subtree_descendants<V>(ptr: &NodePtr<V>) -> u16 {
    match ptr {
        NodePtr::Empty => 0,
        NodePtr::Leaf(l) => cap_descendants(l.len()),
        NodePtr::Internal(n) => n.descendants(),
    }
}

/// Merge `prefix` onto the front of `child`'s own skip chain, wrapping
/// the overflow (anything past [`skip::MAX_SKIP`] bytes) in a fresh
/// single-child bitmask-internal node rather than losing it (spec.md
/// §4.4 "single-child collapse": "if the sum would exceed 6, the outer
/// node remains as a chain wrapper... and the surplus is pushed down").
/// Shared by erase's single-child collapse and insert's recursive
/// leaf-to-internal split, both of which need to prepend a shared byte
/// path onto an existing node without knowing its current skip length.
pub(crate) fn prepend_prefix_to_node<V>(prefix: &[u8], mut child: NodePtr<V>) -> NodePtr<V> {
    if prefix.is_empty() {
        return child;
    }
    let existing_skip = match &child {
        NodePtr::Leaf(l) => *l.skip(),
        NodePtr::Internal(n) => n.skip,
        NodePtr::Empty => unreachable!("prepending a prefix onto an empty node"),
    };
    let (new_skip, overflow) = existing_skip.prepended(prefix);
    match &mut child {
        NodePtr::Leaf(l) => l.set_skip(new_skip),
        NodePtr::Internal(n) => n.skip = new_skip,
        NodePtr::Empty => unreachable!(),
    }
    if overflow.is_empty() {
        return child;
    }
    let wrapper_skip = SkipPath::from_bytes(&overflow[..overflow.len() - 1]);
    let wrapper_dispatch = overflow[overflow.len() - 1];
    let child_descendants = subtree_descendants(&child);
    let mut wrapper = InternalNode::empty(wrapper_skip);
    wrapper.insert_child(wrapper_dispatch, child, child_descendants);
    NodePtr::internal(wrapper)
}
