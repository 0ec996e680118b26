// RoundHashMap property tests.
//
// Property 1: staged/built visibility matches a two-map model.
//  - Model: `built` and `staged` std HashMaps over a small key universe.
//  - Invariant: get(key) == built.get(key) for every universe key, at
//    every step; staged entries are invisible until a build.
//  - Operations: stage-insert (unique keys only; duplicates are a
//    fatal build error by design), build, lookup hit, lookup miss.
//
// Property 2: accepted builds respect the quality cap and ceilings.
//  - For arbitrary distinct-key subsets, build() succeeds and the
//    resulting num_hashes/table_size stay within their bounds.
use proptest::prelude::*;
use roundhash::RoundHashMap;
use std::collections::HashMap;

fn key(i: usize) -> String {
    format!("k{i}")
}

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        (n - 1).ilog2() + 1
    }
}

proptest! {
    #[test]
    fn prop_model_visibility(
        universe in 1usize..=48,
        ops in proptest::collection::vec((0u8..=3u8, 0usize..100usize), 1..80)
    ) {
        let mut m: RoundHashMap<usize> = RoundHashMap::new();
        let mut built: HashMap<String, usize> = HashMap::new();
        let mut staged: HashMap<String, usize> = HashMap::new();

        for (op, raw_k) in ops {
            let k = raw_k % universe;
            let kk = key(k);
            match op {
                // Stage-insert if the key is not already known anywhere.
                0 => {
                    if !built.contains_key(&kk) && !staged.contains_key(&kk) {
                        m.insert(kk.clone(), k);
                        staged.insert(kk.clone(), k);
                    }
                }
                // Build: staged entries become visible.
                1 => {
                    prop_assert!(m.build().is_ok(), "distinct keys must build");
                    built.extend(staged.drain());
                }
                // Lookup a universe key; must agree with the built model.
                2 => {
                    prop_assert_eq!(m.get(&kk), built.get(&kk));
                }
                // Lookup a key outside the universe; always a miss.
                3 => {
                    let absent = format!("absent-{raw_k}");
                    prop_assert_eq!(m.get(&absent), None);
                }
                _ => unreachable!(),
            }

            // Step invariants: counts and visibility of this key.
            prop_assert_eq!(m.len(), built.len());
            prop_assert_eq!(m.staged_len(), staged.len());
            prop_assert_eq!(m.get(&kk), built.get(&kk));
        }

        // Final build and full agreement over the whole universe.
        prop_assert!(m.build().is_ok());
        built.extend(staged.drain());
        for i in 0..universe {
            let kk = key(i);
            prop_assert_eq!(m.get(&kk), built.get(&kk));
        }
    }
}

proptest! {
    #[test]
    fn prop_build_bounds(selector in proptest::collection::btree_set(0usize..64, 1..=40)) {
        let mut m: RoundHashMap<usize> = RoundHashMap::new();
        for &i in &selector {
            m.insert(key(i), i);
        }
        prop_assert!(m.build().is_ok());

        let n = selector.len();
        prop_assert!(m.table_size() >= 3 * n);
        prop_assert!(m.table_size() <= 65_536.min(128 * n));
        prop_assert!(m.num_hashes() >= 1);
        prop_assert!(m.num_hashes() <= ceil_log2(n) + 2);
        for &i in &selector {
            prop_assert_eq!(m.get(&key(i)), Some(&i));
        }
    }
}
