//! Erase (spec.md §4.6): remove a key, deallocate whatever shrank to
//! nothing, and restore the two shape invariants insert never has to
//! worry about — a bitmask-internal node never keeps exactly one child
//! (it collapses, merging its skip into that child) and never keeps a
//! whole subtree under [`COMPACT_MAX`] entries spread across many
//! children once it no longer has to (it rebuilds back into one leaf).
//!
//! Node-count reshaping on the way back down (collapse, coalesce) is not
//! run past the allocator: both only ever reduce the number of live
//! nodes, so there is nothing for a budget to usefully refuse. Entry and
//! node removal is still deallocated so [`crate::alloc::NodeAlloc`]
//! bookkeeping stays accurate.

use crate::alloc::NodeAlloc;
use crate::key::{suffix_u64_from_bytes, suffix_width_for};
use crate::node::skip::SkipPath;
use crate::node::{
    cap_descendants, prepend_prefix_to_node, subtree_descendants, InternalNode, LeafNode, NodePtr,
    COALESCE_CAP, COMPACT_MAX, WORDS_INTERNAL_BASE, WORDS_LEAF_BASE, WORDS_PER_CHILD, WORDS_PER_ENTRY,
};

/// Remove `key_bytes` from the subtree rooted at `root`, returning the
/// removed value if it was present.
pub(crate) fn erase<V, A: NodeAlloc>(root: &mut NodePtr<V>, key_bytes: &[u8], alloc: &mut A) -> Option<V> {
    erase_rec(root, key_bytes, 0, alloc).0
}

fn erase_rec<V, A: NodeAlloc>(
    node: &mut NodePtr<V>,
    key_bytes: &[u8],
    consumed: usize,
    alloc: &mut A,
) -> (Option<V>, u16) {
    let current = std::mem::replace(node, NodePtr::Empty);
    match current {
        NodePtr::Empty => (None, 0),
        NodePtr::Leaf(leaf_box) => erase_from_leaf(node, *leaf_box, key_bytes, consumed, alloc),
        NodePtr::Internal(internal_box) => {
            erase_from_internal(node, *internal_box, key_bytes, consumed, alloc)
        }
    }
}

fn erase_from_leaf<V, A: NodeAlloc>(
    node: &mut NodePtr<V>,
    mut leaf: LeafNode<V>,
    key_bytes: &[u8],
    consumed: usize,
    alloc: &mut A,
) -> (Option<V>, u16) {
    let skip = *leaf.skip();
    if skip.diverges_at(&key_bytes[consumed..]).is_some() {
        let len = leaf.len();
        *node = NodePtr::leaf(leaf);
        return (None, cap_descendants(len));
    }
    let past_skip = consumed + skip.len();
    let suffix = suffix_u64_from_bytes(&key_bytes[past_skip..]);
    match leaf.remove(suffix) {
        None => {
            let len = leaf.len();
            *node = NodePtr::leaf(leaf);
            (None, cap_descendants(len))
        }
        Some(value) => {
            alloc.deallocate(WORDS_PER_ENTRY);
            if leaf.is_empty() {
                alloc.deallocate(WORDS_LEAF_BASE);
                *node = NodePtr::Empty;
                (Some(value), 0)
            } else {
                let len = leaf.len();
                *node = NodePtr::leaf(leaf);
                (Some(value), cap_descendants(len))
            }
        }
    }
}

fn erase_from_internal<V, A: NodeAlloc>(
    node: &mut NodePtr<V>,
    mut internal: InternalNode<V>,
    key_bytes: &[u8],
    consumed: usize,
    alloc: &mut A,
) -> (Option<V>, u16) {
    let skip = internal.skip;
    if skip.diverges_at(&key_bytes[consumed..]).is_some() {
        let count = internal.descendants();
        *node = NodePtr::internal(internal);
        return (None, count);
    }
    let past_skip = consumed + skip.len();
    let dispatch_byte = key_bytes[past_skip];
    let next_consumed = past_skip + 1;

    if !internal.has_child(dispatch_byte) {
        let count = internal.descendants();
        *node = NodePtr::internal(internal);
        return (None, count);
    }

    let was_capped = internal.descendants() == COALESCE_CAP;

    let mut child = internal
        .get_mut(dispatch_byte)
        .map(|c| std::mem::replace(c, NodePtr::Empty))
        .expect("checked has_child above");
    let (removed, child_count) = erase_rec(&mut child, key_bytes, next_consumed, alloc);

    if removed.is_none() {
        *internal.get_mut(dispatch_byte).expect("slot present") = child;
        let count = internal.descendants();
        *node = NodePtr::internal(internal);
        return (removed, count);
    }

    if matches!(child, NodePtr::Empty) {
        internal.remove_child(dispatch_byte);
        alloc.deallocate(WORDS_PER_CHILD);
    } else {
        *internal.get_mut(dispatch_byte).expect("slot present") = child;
        internal.set_child_descendants(dispatch_byte, child_count);
    }

    if internal.popcount() == 0 {
        alloc.deallocate(WORDS_INTERNAL_BASE);
        *node = NodePtr::Empty;
        return (removed, 0);
    }

    if let Some(byte) = internal.single_child_byte() {
        let own_skip = internal.skip;
        let (_b, sole_child) = internal.take_single_child();
        debug_assert_eq!(byte, _b);
        alloc.deallocate(WORDS_INTERNAL_BASE + WORDS_PER_CHILD);
        log::trace!("bitmask-internal down to its last child: collapsing into dispatch byte {}", byte);
        let collapsed = attach_collapsed_prefix(own_skip, byte, sole_child);
        let count = subtree_descendants(&collapsed);
        *node = collapsed;
        return (removed, count);
    }

    let now_capped = internal.descendants() == COALESCE_CAP;
    if was_capped && !now_capped {
        // The rebuilt leaf replaces this node in its parent's slot, so its
        // suffix must span everything from `consumed` (this node's own
        // position) to the end of the key — including the bytes this
        // node's own skip chain covers, since `collect_entries` folds that
        // skip into each entry's path rather than re-attaching it as the
        // new leaf's skip.
        let remaining_bits = ((key_bytes.len() - consumed) * 8) as u32;
        log::debug!(
            "bitmask-internal descendants dropped to {} (<= COMPACT_MAX): coalescing subtree into one leaf",
            internal.descendants()
        );
        let wrapped = NodePtr::internal(internal);
        let freed_words = subtree_word_cost(&wrapped);
        let rebuilt = rebuild_as_leaf(wrapped, remaining_bits);
        let new_words = WORDS_LEAF_BASE + WORDS_PER_ENTRY * rebuilt.len() as u32;
        // Coalesce only ever shrinks a subtree into one leaf, so the old
        // footprint always covers the new one; no fallible `allocate`
        // needed for what can only be a net release.
        alloc.deallocate(freed_words.saturating_sub(new_words));
        let count = cap_descendants(rebuilt.len());
        *node = NodePtr::leaf(rebuilt);
        return (removed, count);
    }

    let count = internal.descendants();
    *node = NodePtr::internal(internal);
    (removed, count)
}

/// Merge a collapsing bitmask-internal node's skip plus its single
/// remaining dispatch byte into that child's own skip chain (spec.md
/// §4.4 "single-child collapse"), via the same overflow-wrapping helper
/// insert's recursive split uses.
fn attach_collapsed_prefix<V>(own_skip: SkipPath, dispatch_byte: u8, child: NodePtr<V>) -> NodePtr<V> {
    let mut prefix: Vec<u8> = own_skip.as_slice().to_vec();
    prefix.push(dispatch_byte);
    prepend_prefix_to_node(&prefix, child)
}

/// The word cost [`build_subtree`](crate::ops::insert) would have charged
/// to build the subtree rooted at `ptr` from scratch — mirrors that
/// function's own accounting exactly so coalesce's dealloc nets out to
/// what insert originally paid in, regardless of how the subtree actually
/// grew one key at a time.
fn subtree_word_cost<V>(ptr: &NodePtr<V>) -> u32 {
    match ptr {
        NodePtr::Empty => 0,
        NodePtr::Leaf(l) => WORDS_LEAF_BASE + WORDS_PER_ENTRY * l.len() as u32,
        NodePtr::Internal(n) => {
            WORDS_INTERNAL_BASE
                + n.children()
                    .map(|c| WORDS_PER_CHILD + subtree_word_cost(c))
                    .sum::<u32>()
        }
    }
}

/// Flatten every entry in `root`'s subtree back into a single fresh
/// leaf (spec.md §4.6 "coalesce"), once its total descendant count has
/// dropped back to (or below) [`COMPACT_MAX`] and is exactly known again.
fn rebuild_as_leaf<V>(root: NodePtr<V>, remaining_bits: u32) -> LeafNode<V> {
    let total_bytes = (remaining_bits / 8) as usize;
    let mut path = Vec::new();
    let mut entries: Vec<(Vec<u8>, V)> = Vec::new();
    collect_entries(root, &mut path, total_bytes, &mut entries);
    debug_assert!(entries.len() <= COMPACT_MAX);

    let width = suffix_width_for(remaining_bits);
    let mut iter = entries.into_iter();
    let (first_path, first_value) = iter.next().expect("coalesce target must have at least one entry");
    let mut leaf = LeafNode::single(width, SkipPath::empty(), suffix_u64_from_bytes(&first_path), first_value);
    for (path, value) in iter {
        leaf.upsert(suffix_u64_from_bytes(&path), value, true);
    }
    leaf
}

/// `total_bytes` is the key-byte width of the subtree `rebuild_as_leaf`
/// was asked to flatten; `path` tracks how many of those bytes have
/// already been pushed on the way down, so a leaf's true suffix length
/// (`total_bytes - path.len() - skip_bytes.len()`) is known exactly even
/// when the leaf's own container is wider than what's actually left at
/// its depth.
fn collect_entries<V>(ptr: NodePtr<V>, path: &mut Vec<u8>, total_bytes: usize, out: &mut Vec<(Vec<u8>, V)>) {
    match ptr {
        NodePtr::Empty => {}
        NodePtr::Leaf(leaf) => {
            let skip_bytes = leaf.skip().as_slice().to_vec();
            let suffix_len = total_bytes - path.len() - skip_bytes.len();
            for (suffix, value) in leaf.into_entries() {
                let mut full = path.clone();
                full.extend_from_slice(&skip_bytes);
                let suffix_bytes = suffix.to_be_bytes();
                full.extend_from_slice(&suffix_bytes[8 - suffix_len..]);
                out.push((full, value));
            }
        }
        NodePtr::Internal(internal) => {
            let skip_bytes = internal.skip.as_slice().to_vec();
            path.extend_from_slice(&skip_bytes);
            for (byte, child) in internal.into_children() {
                path.push(byte);
                collect_entries(child, path, total_bytes, out);
                path.pop();
            }
            path.truncate(path.len() - skip_bytes.len());
        }
    }
}
