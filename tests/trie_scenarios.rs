//! Black-box scenarios from spec.md §8 — seed test suite plus boundary
//! behaviors. Colocated `#[cfg(test)]` modules cover the node internals;
//! this file exercises `TrieMap` the way a caller would, the way the
//! teacher's `tests/treebitmap.rs` exercises its store through the public
//! API rather than its internals.

mod common {
    pub fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

use bytetrie::TrieMap;

#[test]
fn scenario_1_small_insert_order_independent_of_arrival_order() {
    common::init();
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    map.insert(5, 50).unwrap();
    map.insert(3, 30).unwrap();
    let got: Vec<(u32, u32)> = map.iter().map(|(k, v)| (k, *v)).collect();
    assert_eq!(got, vec![(3, 30), (5, 50)]);
}

#[test]
fn scenario_2_signed_64_bit_extremes_order_around_zero() {
    common::init();
    let mut map: TrieMap<i64, i64> = TrieMap::new();
    for k in [-1i64, 0, 1] {
        map.insert(k, k).unwrap();
    }
    let got: Vec<i64> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(got, vec![-1, 0, 1]);
}

#[test]
fn scenario_3_ten_thousand_random_32_bit_keys_iterate_sorted() {
    common::init();
    // Small xorshift PRNG so the scenario is reproducible without pulling
    // `rand`'s `StdRng` into this test's surface — `rand` itself is
    // exercised by `tests/boundary.rs`.
    fn xorshift(state: &mut u64) -> u64 {
        *state ^= *state << 13;
        *state ^= *state >> 7;
        *state ^= *state << 17;
        *state
    }
    let mut state = 0x2545F4914F6CDD1Du64;
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    let mut reference = std::collections::BTreeSet::new();
    for _ in 0..10_000 {
        let k = (xorshift(&mut state) >> 32) as u32;
        map.insert_or_assign(k, k).unwrap();
        reference.insert(k);
    }
    let got: Vec<u32> = map.iter().map(|(k, _)| k).collect();
    let expected: Vec<u32> = reference.into_iter().collect();
    assert_eq!(got, expected);
    assert_eq!(map.len(), expected.len());
}

#[test]
fn scenario_4_sequential_64_bit_keys_erase_evens() {
    common::init();
    let mut map: TrieMap<u64, u64> = TrieMap::new();
    for k in 0..5_000u64 {
        map.insert(k, k).unwrap();
    }
    for k in (0..5_000u64).step_by(2) {
        assert_eq!(map.erase(k), Some(k));
    }
    assert_eq!(map.len(), 2_500);
    let got: Vec<u64> = map.iter().map(|(k, _)| k).collect();
    let expected: Vec<u64> = (0..5_000u64).filter(|k| k % 2 == 1).collect();
    assert_eq!(got, expected);
}

#[test]
fn scenario_5_top_byte_spread_forces_prefix_split() {
    common::init();
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    // 32 distinct top bytes, 150 keys apiece: 4,800 entries total, past
    // COMPACT_MAX (4096), so the root leaf must split into a real
    // bitmask-internal node with one child per top byte actually used.
    let keys: Vec<u32> = (0u32..32).flat_map(|i| (0u32..150).map(move |j| (i << 24) | j)).collect();
    for &k in &keys {
        map.insert(k, k).unwrap();
    }
    let stats = map.stats();
    assert!(
        stats.bitmask_nodes >= 1,
        "expected the oversized leaf to split into a bitmask-internal node, got {stats:?}"
    );
    assert_eq!(stats.entries, keys.len());
    for &k in &keys {
        assert_eq!(map.find(k), Some(&k));
    }
    let got: Vec<u32> = map.iter().map(|(k, _)| k).collect();
    let mut expected = keys.clone();
    expected.sort();
    assert_eq!(got, expected);
}

#[test]
fn scenario_6_collapse_back_to_single_leaf_after_erase() {
    common::init();
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    map.insert(0, 0).unwrap();
    map.insert(1, 1).unwrap();
    assert_eq!(map.erase(0), Some(0));
    let stats = map.stats();
    assert_eq!(
        stats.bitmask_nodes, 0,
        "single remaining child must collapse back into one leaf, got {stats:?}"
    );
    assert_eq!(map.find(1), Some(&1));
}

#[test]
fn boundary_zero_and_max_are_first_and_last_unsigned() {
    common::init();
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    for k in [1000u32, 0, u32::MAX, 500] {
        map.insert(k, k).unwrap();
    }
    let got: Vec<u32> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(got.first(), Some(&0));
    assert_eq!(got.last(), Some(&u32::MAX));
}

#[test]
fn boundary_zero_and_max_are_first_and_last_signed() {
    common::init();
    let mut map: TrieMap<i32, i32> = TrieMap::new();
    for k in [1000i32, 0, i32::MAX, i32::MIN, -500] {
        map.insert(k, k).unwrap();
    }
    let got: Vec<i32> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(got.first(), Some(&i32::MIN));
    assert_eq!(got.last(), Some(&i32::MAX));
}

#[test]
fn boundary_all_u8_keys_round_trip_in_order() {
    common::init();
    let mut map: TrieMap<u8, u8> = TrieMap::new();
    for k in 0u8..=255 {
        assert!(map.insert(k, k).unwrap());
    }
    assert_eq!(map.len(), 256);
    let got: Vec<u8> = map.iter().map(|(k, _)| k).collect();
    let expected: Vec<u8> = (0u8..=255).collect();
    assert_eq!(got, expected);
}

#[test]
fn boundary_all_u16_keys_round_trip_in_order() {
    common::init();
    let mut map: TrieMap<u16, u16> = TrieMap::new();
    for k in 0u16..=u16::MAX {
        assert!(map.insert(k, k).unwrap());
    }
    assert_eq!(map.len(), 65_536);
    let mut seen_count = 0u32;
    let mut prev: Option<u16> = None;
    for (k, _) in map.iter() {
        if let Some(p) = prev {
            assert!(k > p, "iteration must be strictly ascending");
        }
        prev = Some(k);
        seen_count += 1;
    }
    assert_eq!(seen_count, 65_536);
}

#[test]
fn boundary_erase_to_empty_returns_to_sentinel_state() {
    common::init();
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    for k in 0..1000u32 {
        map.insert(k, k).unwrap();
    }
    for k in 0..1000u32 {
        map.erase(k);
    }
    assert!(map.is_empty());
    assert_eq!(map.find(0), None);
    assert_eq!(map.stats(), bytetrie::NodeStats::default());
}

#[test]
fn boundary_compact_max_conversion_preserves_membership_and_order() {
    common::init();
    const COMPACT_MAX: u32 = 4096;
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    // All share the same top byte (0) so they land in one leaf until it
    // outgrows COMPACT_MAX and splits into a bitmask-internal node.
    for k in 0..=(COMPACT_MAX + 1) {
        map.insert(k, k).unwrap();
    }
    assert_eq!(map.len(), (COMPACT_MAX + 2) as usize);
    for k in 0..=(COMPACT_MAX + 1) {
        assert_eq!(map.find(k), Some(&k));
    }
    let got: Vec<u32> = map.iter().map(|(k, _)| k).collect();
    let expected: Vec<u32> = (0..=(COMPACT_MAX + 1)).collect();
    assert_eq!(got, expected);
}

#[test]
fn boundary_skip_chain_extremum_collapses_shared_prefix() {
    common::init();
    let mut map: TrieMap<u64, u64> = TrieMap::new();
    // These two 64-bit keys agree on every byte except the last, so the
    // resulting trie should fold the shared high bytes into a skip chain
    // (or a nested chain) rather than a column of one-child nodes.
    let a: u64 = 0x0102_0304_0506_0700;
    let b: u64 = 0x0102_0304_0506_07FF;
    map.insert(a, a).unwrap();
    map.insert(b, b).unwrap();
    assert_eq!(map.find(a), Some(&a));
    assert_eq!(map.find(b), Some(&b));
    let got: Vec<u64> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(got, vec![a, b]);
}

#[test]
fn lower_bound_upper_bound_and_range_from_compose_with_iteration() {
    common::init();
    let mut map: TrieMap<u32, u32> = TrieMap::new();
    for k in (0u32..100).step_by(10) {
        map.insert(k, k).unwrap();
    }
    let from_50: Vec<u32> = map.range_from(45).map(|(k, _)| k).collect();
    assert_eq!(from_50, vec![50, 60, 70, 80, 90]);
    assert_eq!(map.lower_bound(50).map(|(k, _)| k), Some(50));
    assert_eq!(map.upper_bound(50).map(|(k, _)| k), Some(60));
}
