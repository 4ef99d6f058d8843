//! Bitmap leaves (spec.md §4.3): the 8-bit-suffix case. A 256-bit
//! presence bitmap plus a dense value array in set-bit (== ascending
//! byte value) order gives O(1) lookup — no index levels needed because
//! the whole suffix space fits in one bitmap test plus a popcount.

use crate::bitmap::Bitmap256;
use crate::node::skip::SkipPath;
use crate::value::ValueSlot;

pub(crate) enum Upsert<V> {
    Inserted,
    AlreadyPresent,
    Replaced(V),
}

pub(crate) struct BitmapLeaf<V> {
    pub(crate) skip: SkipPath,
    bitmap: Bitmap256,
    values: Vec<ValueSlot<V>>,
}

impl<V> BitmapLeaf<V> {
    pub(crate) fn single(skip: SkipPath, suffix: u8, value: V) -> Self {
        let mut bitmap = Bitmap256::new();
        bitmap.set(suffix);
        BitmapLeaf {
            skip,
            bitmap,
            values: vec![ValueSlot::new(value)],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn find(&self, suffix: u8) -> Option<&V> {
        if !self.bitmap.test(suffix) {
            return None;
        }
        Some(self.values[self.bitmap.rank(suffix)].get())
    }

    pub(crate) fn find_mut(&mut self, suffix: u8) -> Option<&mut V> {
        if !self.bitmap.test(suffix) {
            return None;
        }
        let slot = self.bitmap.rank(suffix);
        Some(self.values[slot].get_mut())
    }

    pub(crate) fn contains(&self, suffix: u8) -> bool {
        self.bitmap.test(suffix)
    }

    pub(crate) fn upsert(&mut self, suffix: u8, value: V, overwrite: bool) -> Upsert<V> {
        if self.bitmap.test(suffix) {
            let slot = self.bitmap.rank(suffix);
            if overwrite {
                Upsert::Replaced(self.values[slot].replace(value))
            } else {
                Upsert::AlreadyPresent
            }
        } else {
            let slot = self.bitmap.rank(suffix);
            self.bitmap.set(suffix);
            self.values.insert(slot, ValueSlot::new(value));
            Upsert::Inserted
        }
    }

    pub(crate) fn assign_if_present(&mut self, suffix: u8, value: V) -> Option<V> {
        if !self.bitmap.test(suffix) {
            return None;
        }
        let slot = self.bitmap.rank(suffix);
        Some(self.values[slot].replace(value))
    }

    pub(crate) fn remove(&mut self, suffix: u8) -> Option<V> {
        if !self.bitmap.test(suffix) {
            return None;
        }
        let slot = self.bitmap.rank(suffix);
        self.bitmap.clear(suffix);
        Some(self.values.remove(slot).into_inner())
    }

    pub(crate) fn first(&self) -> Option<(u8, &V)> {
        let b = self.bitmap.min_set()?;
        Some((b, self.values[0].get()))
    }

    pub(crate) fn last(&self) -> Option<(u8, &V)> {
        let b = self.bitmap.max_set()?;
        Some((b, self.values[self.values.len() - 1].get()))
    }

    pub(crate) fn succ(&self, suffix: u8) -> Option<(u8, &V)> {
        let b = self.bitmap.next_set_after(suffix)?;
        Some((b, self.values[self.bitmap.rank(b)].get()))
    }

    pub(crate) fn pred(&self, suffix: u8) -> Option<(u8, &V)> {
        let b = self.bitmap.prev_set_before(suffix)?;
        Some((b, self.values[self.bitmap.rank(b)].get()))
    }

    pub(crate) fn ceiling(&self, suffix: u8) -> Option<(u8, &V)> {
        let b = self.bitmap.next_set_from(suffix)?;
        Some((b, self.values[self.bitmap.rank(b)].get()))
    }

    pub(crate) fn floor(&self, suffix: u8) -> Option<(u8, &V)> {
        let b = self.bitmap.last_set_up_to(suffix)?;
        Some((b, self.values[self.bitmap.rank(b)].get()))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u8, &V)> {
        self.bitmap.iter_ascending().zip(self.values.iter()).map(|(b, v)| (b, v.get()))
    }

    pub(crate) fn into_entries(self) -> Vec<(u8, V)> {
        self.bitmap
            .iter_ascending()
            .zip(self.values.into_iter())
            .map(|(b, v)| (b, v.into_inner()))
            .collect()
    }

    pub(crate) fn memory_bytes(&self) -> usize {
        use std::mem::size_of;
        self.values.capacity() * size_of::<ValueSlot<V>>() + size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn o1_lookup_across_full_byte_range() {
        let mut leaf = BitmapLeaf::single(SkipPath::empty(), 0, 0u32);
        for b in 1u8..=255 {
            leaf.upsert(b, b as u32, true);
        }
        for b in 0u8..=255 {
            assert_eq!(leaf.find(b), Some(&(b as u32)));
        }
        assert_eq!(leaf.len(), 256);
    }

    #[test]
    fn remove_then_miss() {
        let mut leaf = BitmapLeaf::single(SkipPath::empty(), 10, 10u32);
        leaf.upsert(20, 20, true);
        assert_eq!(leaf.remove(10), Some(10));
        assert_eq!(leaf.find(10), None);
        assert_eq!(leaf.find(20), Some(&20));
    }

    #[test]
    fn succ_pred_wrap_bounds() {
        let mut leaf = BitmapLeaf::single(SkipPath::empty(), 5, 5u32);
        leaf.upsert(250, 250, true);
        assert_eq!(leaf.succ(5), Some((250, &250)));
        assert_eq!(leaf.succ(250), None);
        assert_eq!(leaf.pred(250), Some((5, &5)));
        assert_eq!(leaf.pred(5), None);
    }
}
