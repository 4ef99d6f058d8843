//! Insert-family recursive descent (spec.md §4.5): `insert` (fails to
//! overwrite), `insert_or_assign` (upserts) and `assign` (overwrites an
//! existing key only) are all the same traversal with a different policy
//! applied once the target slot is located.
//!
//! Every recursive step takes the current slot's node by value (via
//! `mem::replace(node, NodePtr::Empty)` at the call site) rather than
//! matching `node` by mutable reference and reborrowing it mid-arm — it
//! costs a few extra moves but keeps every step's borrows trivially
//! disjoint, which matters more than the cycles given this is never run
//! through a borrow-checker dry run before being trusted.

//!
//! Every path that grows the trie checks its allocation budget *before*
//! mutating or discarding anything it would need to restore, so that a
//! refused `alloc.allocate` call always leaves `*node` holding the exact
//! value it held on entry (spec.md §5/§7: allocation failure "must
//! propagate and leave the node graph unchanged").

use crate::alloc::NodeAlloc;
use crate::error::TrieResult;
use crate::key::{suffix_u64_from_bytes, suffix_width_for, width_bits};
use crate::node::skip::SkipPath;
use crate::node::{
    cap_descendants, prepend_prefix_to_node, subtree_descendants, InternalNode, LeafNode, NodePtr,
    COALESCE_CAP, COMPACT_MAX, WORDS_INTERNAL_BASE, WORDS_LEAF_BASE, WORDS_PER_CHILD, WORDS_PER_ENTRY,
};

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub(crate) enum InsertMode {
    /// Fails (no-op) if the key is already present.
    InsertOnly,
    /// Inserts if absent, overwrites if present.
    InsertOrAssign,
    /// Overwrites only if the key is already present.
    AssignOnly,
}

pub(crate) enum Outcome<V> {
    Inserted,
    Replaced(V),
    AlreadyPresent,
    NotFound,
}

/// Run one of the insert-family operations against the subtree rooted at
/// `root` for the full key `key_bytes`.
pub(crate) fn insert<V, A: NodeAlloc>(
    root: &mut NodePtr<V>,
    key_bytes: &[u8],
    value: V,
    mode: InsertMode,
    alloc: &mut A,
) -> TrieResult<Outcome<V>> {
    insert_rec(root, key_bytes, 0, value, mode, alloc).map(|(outcome, _count)| outcome)
}

fn insert_rec<V, A: NodeAlloc>(
    node: &mut NodePtr<V>,
    key_bytes: &[u8],
    consumed: usize,
    value: V,
    mode: InsertMode,
    alloc: &mut A,
) -> TrieResult<(Outcome<V>, u16)> {
    let current = std::mem::replace(node, NodePtr::Empty);
    match current {
        NodePtr::Empty => {
            if mode == InsertMode::AssignOnly {
                return Ok((Outcome::NotFound, 0));
            }
            let remaining = &key_bytes[consumed..];
            let width = suffix_width_for((remaining.len() * 8) as u32);
            let suffix = suffix_u64_from_bytes(remaining);
            alloc.allocate(WORDS_LEAF_BASE + WORDS_PER_ENTRY)?;
            *node = NodePtr::leaf(LeafNode::single(width, SkipPath::empty(), suffix, value));
            Ok((Outcome::Inserted, 1))
        }
        NodePtr::Leaf(leaf_box) => insert_into_leaf(node, *leaf_box, key_bytes, consumed, value, mode, alloc),
        NodePtr::Internal(internal_box) => {
            insert_into_internal(node, *internal_box, key_bytes, consumed, value, mode, alloc)
        }
    }
}

fn insert_into_leaf<V, A: NodeAlloc>(
    node: &mut NodePtr<V>,
    mut leaf: LeafNode<V>,
    key_bytes: &[u8],
    consumed: usize,
    value: V,
    mode: InsertMode,
    alloc: &mut A,
) -> TrieResult<(Outcome<V>, u16)> {
    let skip = *leaf.skip();
    if let Some(div_idx) = skip.diverges_at(&key_bytes[consumed..]) {
        if mode == InsertMode::AssignOnly {
            let len = leaf.len();
            *node = NodePtr::leaf(leaf);
            return Ok((Outcome::NotFound, cap_descendants(len)));
        }
        let (wrapper, count) = split_leaf_on_skip_divergence(leaf, key_bytes, consumed, div_idx, value, alloc)?;
        *node = NodePtr::internal(wrapper);
        return Ok((Outcome::Inserted, count));
    }

    let past_skip = consumed + skip.len();
    let suffix = suffix_u64_from_bytes(&key_bytes[past_skip..]);

    match mode {
        InsertMode::AssignOnly => {
            let outcome = match leaf.assign_if_present(suffix, value) {
                Some(old) => Outcome::Replaced(old),
                None => Outcome::NotFound,
            };
            let len = leaf.len();
            *node = NodePtr::leaf(leaf);
            Ok((outcome, cap_descendants(len)))
        }
        InsertMode::InsertOnly | InsertMode::InsertOrAssign => {
            let overwrite = mode == InsertMode::InsertOrAssign;
            let already_len = leaf.len();
            let growing = !leaf.contains(suffix);

            if !growing {
                // Pure overwrite of an existing slot: no new storage, so
                // nothing to pre-pay and nothing that can fail.
                let outcome = match leaf.upsert(suffix, value, overwrite) {
                    crate::node::ptr::Upsert::Inserted => Outcome::Inserted,
                    crate::node::ptr::Upsert::Replaced(old) => Outcome::Replaced(old),
                    crate::node::ptr::Upsert::AlreadyPresent => Outcome::AlreadyPresent,
                };
                let len = leaf.len();
                *node = NodePtr::leaf(leaf);
                return Ok((outcome, cap_descendants(len)));
            }

            if already_len + 1 > COMPACT_MAX {
                // Pre-pay the exact cost of the resulting subtree (computed
                // from suffixes alone, without touching `leaf`) before
                // mutating anything, so a refused budget leaves `leaf`
                // exactly as it was.
                let mut suffixes = leaf.suffixes();
                suffixes.push(suffix);
                let container_bits = width_bits(leaf.width());
                let cost = predict_subtree_cost(&suffixes, container_bits);
                if let Err(e) = alloc.allocate(cost) {
                    *node = NodePtr::leaf(leaf);
                    return Err(e);
                }
                // The old leaf's own footprint is superseded by the subtree
                // just paid for above; release it now that the budget check
                // has already succeeded.
                alloc.deallocate(WORDS_LEAF_BASE + WORDS_PER_ENTRY * already_len as u32);
                log::debug!(
                    "leaf exceeds COMPACT_MAX ({} entries): splitting into a bitmask-internal subtree",
                    already_len + 1
                );
                let outcome = match leaf.upsert(suffix, value, overwrite) {
                    crate::node::ptr::Upsert::Inserted => Outcome::Inserted,
                    crate::node::ptr::Upsert::Replaced(old) => Outcome::Replaced(old),
                    crate::node::ptr::Upsert::AlreadyPresent => Outcome::AlreadyPresent,
                };
                let skip = *leaf.skip();
                let entries = leaf.into_entries();
                let subtree = build_subtree_unchecked(entries, container_bits);
                let new_node = prepend_prefix_to_node(skip.as_slice(), subtree);
                let count = subtree_descendants(&new_node);
                *node = new_node;
                return Ok((outcome, count));
            }

            if let Err(e) = alloc.allocate(WORDS_PER_ENTRY) {
                *node = NodePtr::leaf(leaf);
                return Err(e);
            }
            let outcome = match leaf.upsert(suffix, value, overwrite) {
                crate::node::ptr::Upsert::Inserted => Outcome::Inserted,
                crate::node::ptr::Upsert::Replaced(old) => Outcome::Replaced(old),
                crate::node::ptr::Upsert::AlreadyPresent => Outcome::AlreadyPresent,
            };
            let len = leaf.len();
            *node = NodePtr::leaf(leaf);
            Ok((outcome, cap_descendants(len)))
        }
    }
}

fn insert_into_internal<V, A: NodeAlloc>(
    node: &mut NodePtr<V>,
    mut internal: InternalNode<V>,
    key_bytes: &[u8],
    consumed: usize,
    value: V,
    mode: InsertMode,
    alloc: &mut A,
) -> TrieResult<(Outcome<V>, u16)> {
    let skip = internal.skip;
    if let Some(div_idx) = skip.diverges_at(&key_bytes[consumed..]) {
        if mode == InsertMode::AssignOnly {
            let count = internal.descendants();
            *node = NodePtr::internal(internal);
            return Ok((Outcome::NotFound, count));
        }
        let (wrapper, count) = split_internal_on_skip_divergence(internal, key_bytes, consumed, div_idx, value, alloc)?;
        *node = NodePtr::internal(wrapper);
        return Ok((Outcome::Inserted, count));
    }

    let past_skip = consumed + skip.len();
    let dispatch_byte = key_bytes[past_skip];
    let next_consumed = past_skip + 1;

    if !internal.has_child(dispatch_byte) {
        if mode == InsertMode::AssignOnly {
            let count = internal.descendants();
            *node = NodePtr::internal(internal);
            return Ok((Outcome::NotFound, count));
        }
        let remaining = &key_bytes[next_consumed..];
        let width = suffix_width_for((remaining.len() * 8) as u32);
        let suffix = suffix_u64_from_bytes(remaining);
        alloc.allocate(WORDS_PER_CHILD + WORDS_LEAF_BASE + WORDS_PER_ENTRY)?;
        let leaf = NodePtr::leaf(LeafNode::single(width, SkipPath::empty(), suffix, value));
        internal.insert_child(dispatch_byte, leaf, 1);
        let count = internal.descendants();
        *node = NodePtr::internal(internal);
        return Ok((Outcome::Inserted, count));
    }

    let mut child = internal
        .get_mut(dispatch_byte)
        .map(|c| std::mem::replace(c, NodePtr::Empty))
        .expect("checked has_child above");
    let (outcome, child_count) = insert_rec(&mut child, key_bytes, next_consumed, value, mode, alloc)?;
    *internal.get_mut(dispatch_byte).expect("slot still present") = child;
    if matches!(outcome, Outcome::Inserted) {
        internal.set_child_descendants(dispatch_byte, child_count);
    }
    let count = internal.descendants();
    *node = NodePtr::internal(internal);
    Ok((outcome, count))
}

/// Predict the total word cost [`build_subtree`] would spend laying out
/// `suffixes` into leaves/internal nodes at `remaining_bits`, without
/// touching any value — mirrors `build_subtree`'s bucketing exactly so
/// the two can never disagree about cost. Used to pre-pay a leaf-to-
/// subtree split's budget before mutating the leaf that triggered it
/// (spec.md §5/§7: a refused allocation must leave the graph unchanged).
fn predict_subtree_cost(suffixes: &[u64], remaining_bits: u32) -> u32 {
    if suffixes.len() <= COMPACT_MAX {
        return WORDS_LEAF_BASE + WORDS_PER_ENTRY * suffixes.len() as u32;
    }

    debug_assert!(remaining_bits > 8);
    let child_remaining_bits = remaining_bits - 8;
    let mut buckets: Vec<(u8, Vec<u64>)> = Vec::new();
    for &suffix in suffixes {
        let dispatch_byte = ((suffix >> child_remaining_bits) & 0xFF) as u8;
        let child_suffix = if child_remaining_bits >= 64 {
            suffix
        } else {
            suffix & ((1u64 << child_remaining_bits) - 1)
        };
        match buckets.iter_mut().find(|(b, _)| *b == dispatch_byte) {
            Some((_, v)) => v.push(child_suffix),
            None => buckets.push((dispatch_byte, vec![child_suffix])),
        }
    }

    if buckets.len() == 1 {
        let (_, bucket) = buckets.into_iter().next().expect("checked len == 1 above");
        return predict_subtree_cost(&bucket, child_remaining_bits);
    }

    let mut total = WORDS_INTERNAL_BASE;
    for (_, bucket) in buckets {
        total += WORDS_PER_CHILD + predict_subtree_cost(&bucket, child_remaining_bits);
    }
    total
}

/// [`build_subtree`] run against an allocator that never refuses,
/// for call sites that have already pre-paid the exact cost via
/// [`predict_subtree_cost`] and so cannot observe a failure here.
fn build_subtree_unchecked<V>(entries: Vec<(u64, V)>, remaining_bits: u32) -> NodePtr<V> {
    let mut prepaid = crate::alloc::GlobalAlloc::default();
    build_subtree(entries, remaining_bits, &mut prepaid).expect("GlobalAlloc never refuses")
}

/// Build a fresh subtree holding exactly `entries` (each suffix already
/// narrowed to `remaining_bits`), splitting further by one more byte of
/// dispatch whenever a single node would hold more than [`COMPACT_MAX`]
/// entries. Recursion is bounded by `remaining_bits` shrinking by 8 each
/// level; it always terminates at or before an 8-bit (bitmap-leaf) level,
/// since a bitmap leaf can hold at most 256 entries — always within
/// [`COMPACT_MAX`] — so the base case is guaranteed to apply by then.
fn build_subtree<V, A: NodeAlloc>(
    mut entries: Vec<(u64, V)>,
    remaining_bits: u32,
    alloc: &mut A,
) -> TrieResult<NodePtr<V>> {
    if entries.len() <= COMPACT_MAX {
        let width = suffix_width_for(remaining_bits);
        alloc.allocate(WORDS_LEAF_BASE + WORDS_PER_ENTRY * entries.len() as u32)?;
        entries.sort_by_key(|(s, _)| *s);
        let mut iter = entries.into_iter();
        let (first_suffix, first_value) = iter.next().expect("split only runs on a non-empty leaf");
        let mut leaf = LeafNode::single(width, SkipPath::empty(), first_suffix, first_value);
        for (suffix, value) in iter {
            leaf.upsert(suffix, value, true);
        }
        return Ok(NodePtr::leaf(leaf));
    }

    debug_assert!(
        remaining_bits > 8,
        "a bitmap leaf (8 remaining bits) holds at most 256 entries, never above COMPACT_MAX"
    );
    let child_remaining_bits = remaining_bits - 8;

    let mut buckets: Vec<(u8, Vec<(u64, V)>)> = Vec::new();
    for (suffix, value) in entries {
        let dispatch_byte = ((suffix >> child_remaining_bits) & 0xFF) as u8;
        let child_suffix = if child_remaining_bits >= 64 {
            suffix
        } else {
            suffix & ((1u64 << child_remaining_bits) - 1)
        };
        match buckets.iter_mut().find(|(b, _)| *b == dispatch_byte) {
            Some((_, v)) => v.push((child_suffix, value)),
            None => buckets.push((dispatch_byte, vec![(child_suffix, value)])),
        }
    }
    buckets.sort_by_key(|(b, _)| *b);

    if buckets.len() == 1 {
        // Every entry shares this dispatch byte: it carries no
        // information, so it becomes a shared skip byte instead of a
        // (would-be single-child, invariant-violating) real dispatch.
        let (byte, bucket) = buckets.into_iter().next().expect("checked len == 1 above");
        let child = build_subtree(bucket, child_remaining_bits, alloc)?;
        return Ok(prepend_prefix_to_node(&[byte], child));
    }

    alloc.allocate(WORDS_INTERNAL_BASE)?;
    let mut node = InternalNode::empty(SkipPath::empty());
    for (dispatch_byte, bucket) in buckets {
        let child = build_subtree(bucket, child_remaining_bits, alloc)?;
        let desc = subtree_descendants(&child);
        alloc.allocate(WORDS_PER_CHILD)?;
        node.insert_child(dispatch_byte, child, desc);
    }
    Ok(NodePtr::internal(node))
}

/// A key diverges from a leaf's skip chain partway through: wrap the
/// leaf and a brand-new sibling leaf in a two-child bitmask-internal
/// node whose own skip is the shared prefix before the divergence
/// (spec.md §4.4 "prefix-split").
fn split_leaf_on_skip_divergence<V, A: NodeAlloc>(
    mut leaf: LeafNode<V>,
    key_bytes: &[u8],
    consumed: usize,
    div_idx: usize,
    value: V,
    alloc: &mut A,
) -> TrieResult<(InternalNode<V>, u16)> {
    let skip = *leaf.skip();
    let shared = SkipPath::from_bytes(&skip.as_slice()[..div_idx]);
    let old_dispatch = skip.get(div_idx);
    let new_dispatch = key_bytes[consumed + div_idx];
    let old_leaf_len = leaf.len();

    log::trace!(
        "leaf skip chain diverges at byte {}: prefix-splitting into dispatch {} / {}",
        div_idx,
        old_dispatch,
        new_dispatch
    );
    leaf.set_skip(skip.shifted(div_idx + 1));

    let new_key_consumed = consumed + div_idx + 1;
    let remaining = &key_bytes[new_key_consumed..];
    let new_width = suffix_width_for((remaining.len() * 8) as u32);
    let new_suffix = suffix_u64_from_bytes(remaining);

    alloc.allocate(WORDS_INTERNAL_BASE + 2 * WORDS_PER_CHILD + WORDS_LEAF_BASE + WORDS_PER_ENTRY)?;
    let new_leaf = NodePtr::leaf(LeafNode::single(new_width, SkipPath::empty(), new_suffix, value));
    let wrapper = InternalNode::with_two_children(
        shared,
        old_dispatch,
        NodePtr::leaf(leaf),
        cap_descendants(old_leaf_len),
        new_dispatch,
        new_leaf,
        1,
    );
    Ok((wrapper, cap_descendants(old_leaf_len + 1)))
}

/// Same idea as [`split_leaf_on_skip_divergence`] but for a
/// bitmask-internal node's own skip chain: the existing node (with its
/// skip shortened) becomes one child of a new wrapper, the inserted
/// key's leaf becomes the other.
fn split_internal_on_skip_divergence<V, A: NodeAlloc>(
    mut internal: InternalNode<V>,
    key_bytes: &[u8],
    consumed: usize,
    div_idx: usize,
    value: V,
    alloc: &mut A,
) -> TrieResult<(InternalNode<V>, u16)> {
    let skip = internal.skip;
    let shared = SkipPath::from_bytes(&skip.as_slice()[..div_idx]);
    let old_dispatch = skip.get(div_idx);
    let new_dispatch = key_bytes[consumed + div_idx];
    let old_descendants = internal.descendants();

    internal.skip = skip.shifted(div_idx + 1);

    let new_key_consumed = consumed + div_idx + 1;
    let remaining = &key_bytes[new_key_consumed..];
    let new_width = suffix_width_for((remaining.len() * 8) as u32);
    let new_suffix = suffix_u64_from_bytes(remaining);

    alloc.allocate(WORDS_INTERNAL_BASE + 2 * WORDS_PER_CHILD + WORDS_LEAF_BASE + WORDS_PER_ENTRY)?;
    let new_leaf = NodePtr::leaf(LeafNode::single(new_width, SkipPath::empty(), new_suffix, value));
    let wrapper = InternalNode::with_two_children(
        shared,
        old_dispatch,
        NodePtr::internal(internal),
        old_descendants,
        new_dispatch,
        new_leaf,
        1,
    );
    let total = if old_descendants == COALESCE_CAP {
        COALESCE_CAP
    } else {
        cap_descendants(old_descendants as usize + 1)
    };
    Ok((wrapper, total))
}
