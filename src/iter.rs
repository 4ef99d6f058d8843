//! Whole-key navigation: lookup, and min/max/successor/predecessor over
//! full key byte paths (spec.md §4.7). Successor/predecessor are the
//! standard trie descent-with-backtracking: try the branch matching the
//! query key first, and only if nothing greater (or lesser) turns up
//! there fall back to the neighboring branch.

use crate::key::suffix_u64_from_bytes;
use crate::node::skip::SkipPath;
use crate::node::ptr::LeafNode;
use crate::node::NodePtr;

/// Append `suffix`'s low `suffix_len` bytes to the leaf's skip, forming
/// the real tail of a key path. `suffix_len` is the true number of key
/// bytes left at this leaf's depth, not the (possibly wider, rounded up
/// to one of the four container widths) [`LeafNode::width`] it's stored
/// under — a leaf's container can hold more bits than its position in
/// the trie actually has left.
fn leaf_path<V>(leaf: &LeafNode<V>, suffix: u64, suffix_len: usize) -> Vec<u8> {
    let mut path = leaf.skip().as_slice().to_vec();
    let bytes = suffix.to_be_bytes();
    path.extend_from_slice(&bytes[8 - suffix_len..]);
    path
}

pub(crate) fn find<'a, V>(node: &'a NodePtr<V>, key_bytes: &[u8], consumed: usize) -> Option<&'a V> {
    match node {
        NodePtr::Empty => None,
        NodePtr::Leaf(leaf) => {
            let skip = leaf.skip();
            if skip.diverges_at(&key_bytes[consumed..]).is_some() {
                return None;
            }
            let past_skip = consumed + skip.len();
            let suffix = suffix_u64_from_bytes(&key_bytes[past_skip..]);
            leaf.find(suffix)
        }
        NodePtr::Internal(internal) => {
            let skip = internal.skip;
            if skip.diverges_at(&key_bytes[consumed..]).is_some() {
                return None;
            }
            let past_skip = consumed + skip.len();
            let dispatch_byte = key_bytes[past_skip];
            let child = internal.get(dispatch_byte)?;
            find(child, key_bytes, past_skip + 1)
        }
    }
}

pub(crate) fn find_mut<'a, V>(node: &'a mut NodePtr<V>, key_bytes: &[u8], consumed: usize) -> Option<&'a mut V> {
    match node {
        NodePtr::Empty => None,
        NodePtr::Leaf(leaf) => {
            let skip = *leaf.skip();
            if skip.diverges_at(&key_bytes[consumed..]).is_some() {
                return None;
            }
            let past_skip = consumed + skip.len();
            let suffix = suffix_u64_from_bytes(&key_bytes[past_skip..]);
            leaf.find_mut(suffix)
        }
        NodePtr::Internal(internal) => {
            let skip = internal.skip;
            if skip.diverges_at(&key_bytes[consumed..]).is_some() {
                return None;
            }
            let past_skip = consumed + skip.len();
            let dispatch_byte = key_bytes[past_skip];
            let child = internal.get_mut(dispatch_byte)?;
            find_mut(child, key_bytes, past_skip + 1)
        }
    }
}

/// `total_bytes` is the key's full byte width; `consumed` is how many of
/// those bytes the trie has already dispatched on above `node`. Both are
/// needed to recover the true remaining-byte count once recursion
/// reaches a leaf.
pub(crate) fn min_path<V>(node: &NodePtr<V>, total_bytes: usize, consumed: usize) -> Option<Vec<u8>> {
    match node {
        NodePtr::Empty => None,
        NodePtr::Leaf(leaf) => {
            let (suffix, _) = leaf.first()?;
            let suffix_len = total_bytes - consumed - leaf.skip().len();
            Some(leaf_path(leaf, suffix, suffix_len))
        }
        NodePtr::Internal(internal) => {
            let (byte, child) = internal.first_child()?;
            let mut path = internal.skip.as_slice().to_vec();
            let next_consumed = consumed + internal.skip.len() + 1;
            path.push(byte);
            path.extend(min_path(child, total_bytes, next_consumed)?);
            Some(path)
        }
    }
}

pub(crate) fn max_path<V>(node: &NodePtr<V>, total_bytes: usize, consumed: usize) -> Option<Vec<u8>> {
    match node {
        NodePtr::Empty => None,
        NodePtr::Leaf(leaf) => {
            let (suffix, _) = leaf.last()?;
            let suffix_len = total_bytes - consumed - leaf.skip().len();
            Some(leaf_path(leaf, suffix, suffix_len))
        }
        NodePtr::Internal(internal) => {
            let (byte, child) = internal.last_child()?;
            let mut path = internal.skip.as_slice().to_vec();
            let next_consumed = consumed + internal.skip.len() + 1;
            path.push(byte);
            path.extend(max_path(child, total_bytes, next_consumed)?);
            Some(path)
        }
    }
}

/// Byte-for-byte comparison of a stored skip chain against the
/// corresponding slice of a query key, returning whether every key in
/// this subtree sorts entirely above, entirely below, or overlaps the
/// query at this position.
enum SkipCmp {
    SubtreeGreater,
    SubtreeLess,
    Overlaps,
}

fn compare_skip(skip: &SkipPath, key_rest: &[u8]) -> SkipCmp {
    match skip.diverges_at(key_rest) {
        None => SkipCmp::Overlaps,
        Some(idx) => {
            if skip.get(idx) > key_rest[idx] {
                SkipCmp::SubtreeGreater
            } else {
                SkipCmp::SubtreeLess
            }
        }
    }
}

pub(crate) fn succ_path<V>(node: &NodePtr<V>, key_bytes: &[u8], consumed: usize) -> Option<Vec<u8>> {
    let total_bytes = key_bytes.len();
    match node {
        NodePtr::Empty => None,
        NodePtr::Leaf(leaf) => {
            let skip = *leaf.skip();
            match compare_skip(&skip, &key_bytes[consumed..]) {
                SkipCmp::SubtreeGreater => {
                    let (suffix, _) = leaf.first()?;
                    let suffix_len = total_bytes - consumed - skip.len();
                    Some(leaf_path(leaf, suffix, suffix_len))
                }
                SkipCmp::SubtreeLess => None,
                SkipCmp::Overlaps => {
                    let past_skip = consumed + skip.len();
                    let target = suffix_u64_from_bytes(&key_bytes[past_skip..]);
                    let (suffix, _) = leaf.succ(target)?;
                    Some(leaf_path(leaf, suffix, total_bytes - past_skip))
                }
            }
        }
        NodePtr::Internal(internal) => {
            let skip = internal.skip;
            match compare_skip(&skip, &key_bytes[consumed..]) {
                SkipCmp::SubtreeGreater => min_path(node, total_bytes, consumed),
                SkipCmp::SubtreeLess => None,
                SkipCmp::Overlaps => {
                    let past_skip = consumed + skip.len();
                    let dispatch_byte = key_bytes[past_skip];
                    let next_consumed = past_skip + 1;
                    if let Some(child) = internal.get(dispatch_byte) {
                        if let Some(rest) = succ_path(child, key_bytes, next_consumed) {
                            let mut path = skip.as_slice().to_vec();
                            path.push(dispatch_byte);
                            path.extend(rest);
                            return Some(path);
                        }
                    }
                    let (byte, child) = internal.child_after(dispatch_byte)?;
                    let mut path = skip.as_slice().to_vec();
                    path.push(byte);
                    path.extend(min_path(child, total_bytes, next_consumed)?);
                    Some(path)
                }
            }
        }
    }
}

pub(crate) fn pred_path<V>(node: &NodePtr<V>, key_bytes: &[u8], consumed: usize) -> Option<Vec<u8>> {
    let total_bytes = key_bytes.len();
    match node {
        NodePtr::Empty => None,
        NodePtr::Leaf(leaf) => {
            let skip = *leaf.skip();
            match compare_skip(&skip, &key_bytes[consumed..]) {
                SkipCmp::SubtreeLess => {
                    let (suffix, _) = leaf.last()?;
                    let suffix_len = total_bytes - consumed - skip.len();
                    Some(leaf_path(leaf, suffix, suffix_len))
                }
                SkipCmp::SubtreeGreater => None,
                SkipCmp::Overlaps => {
                    let past_skip = consumed + skip.len();
                    let target = suffix_u64_from_bytes(&key_bytes[past_skip..]);
                    let (suffix, _) = leaf.pred(target)?;
                    Some(leaf_path(leaf, suffix, total_bytes - past_skip))
                }
            }
        }
        NodePtr::Internal(internal) => {
            let skip = internal.skip;
            match compare_skip(&skip, &key_bytes[consumed..]) {
                SkipCmp::SubtreeLess => max_path(node, total_bytes, consumed),
                SkipCmp::SubtreeGreater => None,
                SkipCmp::Overlaps => {
                    let past_skip = consumed + skip.len();
                    let dispatch_byte = key_bytes[past_skip];
                    let next_consumed = past_skip + 1;
                    if let Some(child) = internal.get(dispatch_byte) {
                        if let Some(rest) = pred_path(child, key_bytes, next_consumed) {
                            let mut path = skip.as_slice().to_vec();
                            path.push(dispatch_byte);
                            path.extend(rest);
                            return Some(path);
                        }
                    }
                    let (byte, child) = internal.child_before(dispatch_byte)?;
                    let mut path = skip.as_slice().to_vec();
                    path.push(byte);
                    path.extend(max_path(child, total_bytes, next_consumed)?);
                    Some(path)
                }
            }
        }
    }
}
