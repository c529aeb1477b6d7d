#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can call
// the test-only `assert_invariants` after every operation.

use crate::error::LookupError;
use crate::index::BucketIndexer;
use crate::map::ChainedHashMap;
use core::fmt::Display;
use core::num::NonZeroUsize;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations so shrinking moves toward earlier keys and shorter
// op lists.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Get(usize),
    Contains(String),
    Remove(usize),
    Mutate(usize, i32),
    Traverse,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<Op>)> {
    let pool = proptest::collection::vec("[a-z0-9]{0,4}", 1..=10);
    (1usize..=8, pool).prop_flat_map(|(capacity, pool)| {
        let idx = proptest::sample::select((0..pool.len()).collect::<Vec<_>>());
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            idx.clone().prop_map(Op::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z0-9]{0,4}".prop_map(|s| s)
            ]
            .prop_map(Op::Contains),
            idx.clone().prop_map(Op::Remove),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            Just(Op::Traverse),
        ];
        proptest::collection::vec(op, 1..60)
            .prop_map(move |ops| (capacity, pool.clone(), ops))
    })
}

fn run<S: BucketIndexer>(
    mut sut: ChainedHashMap<String, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = pool[i].clone();
                let prev = sut.put(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v));
            }
            Op::Get(i) => {
                let k = pool[i].as_str();
                match model.get(k) {
                    Some(v) => prop_assert_eq!(sut.get(k), Ok(v)),
                    None => prop_assert_eq!(sut.get(k), Err(LookupError::NotFound)),
                }
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.contains_key(&s));
            }
            Op::Remove(i) => {
                let k = pool[i].as_str();
                match model.remove(k) {
                    Some(v) => {
                        prop_assert_eq!(sut.remove(k), Ok(v));
                        prop_assert!(!sut.contains(k));
                    }
                    None => prop_assert_eq!(sut.remove(k), Err(LookupError::NotFound)),
                }
            }
            Op::Mutate(i, d) => {
                let k = pool[i].as_str();
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Ok(sv), Some(mv)) => {
                        *sv = sv.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (Err(LookupError::NotFound), None) => {}
                    (s, m) => prop_assert!(false, "get_mut mismatch: {:?} vs {:?}", s, m),
                }
            }
            Op::Traverse => {
                prop_assert_eq!(sut.keys().len(), sut.len());
                prop_assert_eq!(sut.values().count(), sut.len());
                let s_items: BTreeSet<(String, i32)> =
                    sut.items().map(|(k, v)| (k.clone(), *v)).collect();
                let m_items: BTreeSet<(String, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s_items, m_items);
                for k in sut.keys() {
                    prop_assert!(sut.contains(k.as_str()));
                }
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap over
// small bucket counts, so chains routinely hold several entries.
// Invariants exercised across random operation sequences:
// - put/get round-trip; repeated put updates rather than duplicates.
// - remove erases and absent keys report NotFound.
// - len equals distinct keys put minus keys removed.
// - traversal yields exactly the live entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((capacity, pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::new(capacity).unwrap();
        run(sut, &pool, ops)?;
    }
}

#[derive(Clone, Default)]
struct ConstIndexer;
impl BucketIndexer for ConstIndexer {
    fn bucket_index<Q>(&self, _key: &Q, _buckets: NonZeroUsize) -> usize
    where
        Q: ?Sized + Display,
    {
        0
    }
}

// Property: Same invariants with every key forced into one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((capacity, pool, ops) in arb_scenario()) {
        let capacity = NonZeroUsize::new(capacity).unwrap();
        let sut = ChainedHashMap::with_capacity_and_indexer(capacity, ConstIndexer);
        run(sut, &pool, ops)?;
    }
}

// Property: owned traversal yields the same sequence as borrowed traversal.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_into_iter_matches_iter(
        capacity in 1usize..=8,
        entries in proptest::collection::vec(("[a-z]{0,3}", any::<i32>()), 0..40),
    ) {
        let mut m = ChainedHashMap::new(capacity).unwrap();
        m.extend(entries);
        let borrowed: Vec<(String, i32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let owned: Vec<(String, i32)> = m.into_iter().collect();
        prop_assert_eq!(borrowed, owned);
    }
}
