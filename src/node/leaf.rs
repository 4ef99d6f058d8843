//! Compact leaves (spec.md §4.2): a sorted array of `(suffix, value)`
//! pairs with a 2-level auxiliary index (sample every 256, sample every
//! 16) so point lookup touches at most two short index scans plus a
//! linear scan of ≤16 adjacent keys, instead of a full binary search
//! over the whole array.

use crate::key::InternalKey;
use crate::node::skip::SkipPath;
use crate::value::ValueSlot;

/// Every `IDX1_STRIDE`-th key is sampled into the first index level.
const IDX1_STRIDE: usize = 256;
/// Every `IDX2_STRIDE`-th key is sampled into the second index level.
const IDX2_STRIDE: usize = 16;
const IDX2_PER_IDX1: usize = IDX1_STRIDE / IDX2_STRIDE;

pub(crate) enum Upsert<V> {
    Inserted,
    AlreadyPresent,
    Replaced(V),
}

pub(crate) struct CompactLeaf<S, V> {
    pub(crate) skip: SkipPath,
    keys: Vec<S>,
    values: Vec<ValueSlot<V>>,
    idx1: Vec<S>,
    idx2: Vec<S>,
}

impl<S: InternalKey, V> CompactLeaf<S, V> {
    pub(crate) fn single(skip: SkipPath, suffix: S, value: V) -> Self {
        let mut leaf = CompactLeaf {
            skip,
            keys: vec![suffix],
            values: vec![ValueSlot::new(value)],
            idx1: Vec::new(),
            idx2: Vec::new(),
        };
        leaf.rebuild_index();
        leaf
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn rebuild_index(&mut self) {
        self.idx1 = self.keys.iter().step_by(IDX1_STRIDE).copied().collect();
        self.idx2 = self.keys.iter().step_by(IDX2_STRIDE).copied().collect();
    }

    fn locate_last_le(arr: &[S], s: S) -> Option<usize> {
        let pos = arr.partition_point(|&k| k <= s);
        if pos == 0 {
            None
        } else {
            Some(pos - 1)
        }
    }

    fn find_pos(&self, suffix: S) -> Option<usize> {
        if self.keys.is_empty() {
            return None;
        }
        let block1 = Self::locate_last_le(&self.idx1, suffix)?;
        let idx2_lo = block1 * IDX2_PER_IDX1;
        let idx2_hi = (idx2_lo + IDX2_PER_IDX1).min(self.idx2.len());
        let block2_rel = Self::locate_last_le(&self.idx2[idx2_lo..idx2_hi], suffix)?;
        let block2 = idx2_lo + block2_rel;
        let start = block2 * IDX2_STRIDE;
        let end = (start + IDX2_STRIDE).min(self.keys.len());
        self.keys[start..end]
            .iter()
            .position(|&k| k == suffix)
            .map(|i| start + i)
    }

    pub(crate) fn find(&self, suffix: S) -> Option<&V> {
        self.find_pos(suffix).map(|i| self.values[i].get())
    }

    pub(crate) fn find_mut(&mut self, suffix: S) -> Option<&mut V> {
        let pos = self.find_pos(suffix)?;
        Some(self.values[pos].get_mut())
    }

    pub(crate) fn contains(&self, suffix: S) -> bool {
        self.find_pos(suffix).is_some()
    }

    /// Insert or overwrite depending on `overwrite`. Rebuilds the index
    /// whenever the key array actually changes length.
    pub(crate) fn upsert(&mut self, suffix: S, value: V, overwrite: bool) -> Upsert<V> {
        match self.keys.binary_search(&suffix) {
            Ok(i) => {
                if overwrite {
                    Upsert::Replaced(self.values[i].replace(value))
                } else {
                    Upsert::AlreadyPresent
                }
            }
            Err(i) => {
                self.keys.insert(i, suffix);
                self.values.insert(i, ValueSlot::new(value));
                self.rebuild_index();
                #[cfg(debug_assertions)]
                self.debug_check_sorted();
                Upsert::Inserted
            }
        }
    }

    /// Overwrite only if `suffix` is already present (spec.md §4.8 `assign`).
    pub(crate) fn assign_if_present(&mut self, suffix: S, value: V) -> Option<V> {
        let i = self.keys.binary_search(&suffix).ok()?;
        Some(self.values[i].replace(value))
    }

    pub(crate) fn remove(&mut self, suffix: S) -> Option<V> {
        let i = self.keys.binary_search(&suffix).ok()?;
        self.keys.remove(i);
        let old = self.values.remove(i).into_inner();
        self.rebuild_index();
        #[cfg(debug_assertions)]
        self.debug_check_sorted();
        Some(old)
    }

    pub(crate) fn first(&self) -> Option<(S, &V)> {
        self.keys.first().map(|&k| (k, self.values[0].get()))
    }

    pub(crate) fn last(&self) -> Option<(S, &V)> {
        let n = self.keys.len();
        if n == 0 {
            return None;
        }
        Some((self.keys[n - 1], self.values[n - 1].get()))
    }

    /// Smallest entry with key strictly greater than `suffix`.
    pub(crate) fn succ(&self, suffix: S) -> Option<(S, &V)> {
        let pos = self.keys.partition_point(|&k| k <= suffix);
        self.keys.get(pos).map(|&k| (k, self.values[pos].get()))
    }

    /// Largest entry with key strictly less than `suffix`.
    pub(crate) fn pred(&self, suffix: S) -> Option<(S, &V)> {
        let pos = self.keys.partition_point(|&k| k < suffix);
        if pos == 0 {
            None
        } else {
            let i = pos - 1;
            Some((self.keys[i], self.values[i].get()))
        }
    }

    /// Smallest entry with key greater-than-or-equal to `suffix`.
    pub(crate) fn ceiling(&self, suffix: S) -> Option<(S, &V)> {
        let pos = self.keys.partition_point(|&k| k < suffix);
        self.keys.get(pos).map(|&k| (k, self.values[pos].get()))
    }

    /// Largest entry with key less-than-or-equal to `suffix`.
    pub(crate) fn floor(&self, suffix: S) -> Option<(S, &V)> {
        let pos = self.keys.partition_point(|&k| k <= suffix);
        if pos == 0 {
            None
        } else {
            let i = pos - 1;
            Some((self.keys[i], self.values[i].get()))
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (S, &V)> {
        self.keys.iter().zip(self.values.iter()).map(|(&k, v)| (k, v.get()))
    }

    pub(crate) fn into_entries(self) -> Vec<(S, V)> {
        self.keys
            .into_iter()
            .zip(self.values.into_iter())
            .map(|(k, v)| (k, v.into_inner()))
            .collect()
    }

    /// Bytes retained by this leaf's backing vectors; used by
    /// [`crate::TrieMap::memory_usage`].
    pub(crate) fn memory_bytes(&self) -> usize {
        use std::mem::size_of;
        self.keys.capacity() * size_of::<S>()
            + self.values.capacity() * size_of::<ValueSlot<V>>()
            + self.idx1.capacity() * size_of::<S>()
            + self.idx2.capacity() * size_of::<S>()
            + size_of::<Self>()
    }

    #[cfg(debug_assertions)]
    pub(crate) fn debug_check_sorted(&self) {
        for w in self.keys.windows(2) {
            debug_assert!(w[0] < w[1], "compact leaf keys must be strictly ascending");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_with(keys: &[u32]) -> CompactLeaf<u32, u32> {
        let mut leaf = CompactLeaf::single(SkipPath::empty(), keys[0], keys[0]);
        for &k in &keys[1..] {
            leaf.upsert(k, k, true);
        }
        leaf
    }

    #[test]
    fn find_locates_every_inserted_key() {
        let keys: Vec<u32> = (0..5000u32).map(|i| i * 3).collect();
        let leaf = leaf_with(&keys);
        for &k in &keys {
            assert_eq!(leaf.find(k), Some(&k));
        }
        assert_eq!(leaf.find(1), None);
    }

    #[test]
    fn upsert_reports_existing_vs_new() {
        let mut leaf = CompactLeaf::single(SkipPath::empty(), 5, 50);
        match leaf.upsert(5, 99, false) {
            Upsert::AlreadyPresent => {}
            _ => panic!("expected AlreadyPresent"),
        }
        assert_eq!(leaf.find(5), Some(&50));
        match leaf.upsert(5, 99, true) {
            Upsert::Replaced(50) => {}
            _ => panic!("expected Replaced(50)"),
        }
        assert_eq!(leaf.find(5), Some(&99));
        match leaf.upsert(7, 70, true) {
            Upsert::Inserted => {}
            _ => panic!("expected Inserted"),
        }
        assert_eq!(leaf.find(7), Some(&70));
    }

    #[test]
    fn remove_and_reindex() {
        let mut leaf = leaf_with(&[1, 2, 3, 4, 5]);
        assert_eq!(leaf.remove(3), Some(3));
        assert_eq!(leaf.find(3), None);
        assert_eq!(leaf.find(4), Some(&4));
        assert_eq!(leaf.len(), 4);
    }

    #[test]
    fn succ_pred_bounds() {
        let leaf = leaf_with(&[10, 20, 30]);
        assert_eq!(leaf.succ(15), Some((20, &20)));
        assert_eq!(leaf.succ(30), None);
        assert_eq!(leaf.pred(15), Some((10, &10)));
        assert_eq!(leaf.pred(10), None);
        assert_eq!(leaf.ceiling(20), Some((20, &20)));
        assert_eq!(leaf.floor(20), Some((20, &20)));
    }
}
