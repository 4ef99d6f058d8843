//! Randomized cross-checks against `std::collections::BTreeMap` (spec.md
//! §8's permutation-independence and round-trip laws), plus the
//! allocation-rollback guarantee of spec.md §5/§7. Seeded so failures are
//! reproducible, the way the teacher's own load-test binaries
//! (`examples/real_single_thread_24.rs`) seed their traffic generators.

mod common {
    pub fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bytetrie::alloc::BudgetedAlloc;
use bytetrie::{TrieError, TrieMap};

#[test]
fn random_insert_erase_matches_btreemap_i32() {
    common::init();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut map: TrieMap<i32, i32> = TrieMap::new();
    let mut reference: BTreeMap<i32, i32> = BTreeMap::new();

    for _ in 0..20_000 {
        let key: i32 = rng.random();
        if rng.random_range(0..4) == 0 && !reference.is_empty() {
            let idx = rng.random_range(0..reference.len());
            let victim = *reference.keys().nth(idx).unwrap();
            assert_eq!(map.erase(victim), reference.remove(&victim));
        } else {
            let value = rng.random();
            let inserted = map.insert_or_assign(key, value).unwrap();
            let prev = reference.insert(key, value);
            assert_eq!(inserted, prev);
        }
    }

    assert_eq!(map.len(), reference.len());
    let got: Vec<(i32, i32)> = map.iter().map(|(k, v)| (k, *v)).collect();
    let expected: Vec<(i32, i32)> = reference.into_iter().collect();
    assert_eq!(got, expected);
}

#[test]
fn insertion_order_does_not_affect_final_contents() {
    common::init();
    let mut rng = StdRng::seed_from_u64(7);
    let mut keys: Vec<u16> = (0..3_000u32).map(|_| rng.random()).collect();
    keys.sort_unstable();
    keys.dedup();

    let mut forward: TrieMap<u16, u16> = TrieMap::new();
    for &k in &keys {
        forward.insert(k, k).unwrap();
    }

    let mut shuffled = keys.clone();
    for i in (1..shuffled.len()).rev() {
        let j = rng.random_range(0..=i);
        shuffled.swap(i, j);
    }
    let mut scrambled: TrieMap<u16, u16> = TrieMap::new();
    for &k in &shuffled {
        scrambled.insert(k, k).unwrap();
    }

    let fwd: Vec<(u16, u16)> = forward.iter().map(|(k, v)| (k, *v)).collect();
    let scr: Vec<(u16, u16)> = scrambled.iter().map(|(k, v)| (k, *v)).collect();
    assert_eq!(fwd, scr);
    assert_eq!(fwd.len(), keys.len());
}

#[test]
fn random_64_bit_keys_round_trip_through_skip_chains() {
    common::init();
    let mut rng = StdRng::seed_from_u64(99);
    let mut map: TrieMap<u64, u64> = TrieMap::new();
    let mut reference = BTreeMap::new();
    // Keys sharing a long high-bits prefix exercise skip-chain formation
    // (spec.md §4.4) far more than fully random 64-bit keys would.
    let shared_prefix: u64 = 0x00FF_00FF_0000_0000;
    for _ in 0..5_000 {
        let low: u64 = rng.random_range(0..1_000_000);
        let key = shared_prefix | low;
        map.insert_or_assign(key, low).unwrap();
        reference.insert(key, low);
    }
    let got: Vec<(u64, u64)> = map.iter().map(|(k, v)| (k, *v)).collect();
    let expected: Vec<(u64, u64)> = reference.into_iter().collect();
    assert_eq!(got, expected);
}

#[test]
fn allocation_failure_leaves_the_map_unchanged() {
    common::init();
    // Budget enough for the very first leaf but not for the growth that
    // a second distinct key would require.
    let mut map: TrieMap<u32, u32, BudgetedAlloc> = TrieMap::with_alloc(BudgetedAlloc::new(6));
    assert!(map.insert(1, 1).unwrap());
    let before_words = map.words_in_use();

    let err = map.insert(2, 2).unwrap_err();
    assert_eq!(err, TrieError::AllocationFailed);

    assert_eq!(map.len(), 1);
    assert_eq!(map.find(1), Some(&1));
    assert_eq!(map.find(2), None);
    assert_eq!(map.words_in_use(), before_words);
}

#[test]
fn word_accounting_returns_to_zero_after_split_and_full_erase() {
    common::init();
    // Force a leaf-to-internal split (COMPACT_MAX crossed), then a
    // coalesce back (erase below COMPACT_MAX), then drain entirely.
    // `words_in_use()` must settle back to 0: every split pays for the
    // subtree it builds and releases the leaf it replaced, and every
    // coalesce releases the subtree it flattens away.
    let mut map: TrieMap<u32, u32, BudgetedAlloc> = TrieMap::with_alloc(BudgetedAlloc::new(u64::MAX));
    let keys: Vec<u32> = (0..5_000u32).collect();
    for &k in &keys {
        map.insert(k, k).unwrap();
    }
    assert!(map.stats().bitmask_nodes >= 1);
    let words_at_peak = map.words_in_use();
    assert!(words_at_peak > 0);

    for &k in &keys {
        assert_eq!(map.erase(k), Some(k));
    }
    assert!(map.is_empty());
    assert_eq!(map.words_in_use(), 0, "erasing every key must release every word charged during insert");
}

#[test]
fn allocation_failure_during_leaf_to_internal_split_leaves_leaf_intact() {
    common::init();
    // First, discover exactly how many words filling one leaf to
    // COMPACT_MAX costs under a never-refusing budget.
    let mut probe: TrieMap<u32, u32, BudgetedAlloc> = TrieMap::with_alloc(BudgetedAlloc::new(u64::MAX));
    for k in 0..4_096u32 {
        probe.insert(k, k).unwrap();
    }
    let fill_cost = probe.words_in_use();

    // A budget exactly at that cost has nothing left over for the
    // subtree the 4,097th key's leaf-to-internal split would need.
    let mut map: TrieMap<u32, u32, BudgetedAlloc> = TrieMap::with_alloc(BudgetedAlloc::new(fill_cost));
    for k in 0..4_096u32 {
        map.insert(k, k).unwrap();
    }
    assert_eq!(map.len(), 4_096);

    let err = map.insert(4_096, 4_096).unwrap_err();
    assert_eq!(err, TrieError::AllocationFailed);
    assert_eq!(map.len(), 4_096);
    assert_eq!(map.find(4_096), None);
    for k in 0..4_096u32 {
        assert_eq!(map.find(k), Some(&k));
    }
}
