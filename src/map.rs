//! ChainedHashMap: fixed bucket array, each bucket a chain in a shared arena.

use crate::bucket::{Bucket, Chain, Nodes, Upsert};
use crate::config::MapConfig;
use crate::error::{CapacityError, LookupError};
use crate::index::{BucketIndexer, TextFold};
use core::borrow::Borrow;
use core::fmt::{self, Debug, Display};
use core::iter::FusedIterator;
use core::num::NonZeroUsize;
use log::{debug, trace};

/// Associative container with a capacity fixed at construction.
///
/// Every operation computes one bucket index and touches only that bucket's
/// chain. The table never grows: with `n` entries in `c` buckets, lookups
/// scan chains of average length `n / c`.
#[derive(Clone)]
pub struct ChainedHashMap<K, V, S = TextFold> {
    indexer: S,
    capacity: NonZeroUsize,
    buckets: Box<[Bucket]>,
    nodes: Nodes<K, V>, // chain nodes for every bucket, linked by generational keys
}

impl<K, V> ChainedHashMap<K, V> {
    /// Allocate `capacity` empty buckets using the [`TextFold`] indexer.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        let capacity = MapConfig { capacity }.validate()?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::with_capacity_and_indexer(capacity, TextFold)
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        let capacity = MapConfig::default()
            .validate()
            .unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity_and_indexer(capacity, S::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_capacity_and_indexer(capacity: NonZeroUsize, indexer: S) -> Self {
        debug!("chained map created with {} buckets", capacity);
        Self {
            indexer,
            capacity,
            buckets: vec![Bucket::new(); capacity.get()].into_boxed_slice(),
            nodes: Nodes::new(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of buckets; fixed for the lifetime of the map.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// `len / capacity`. Informational only; nothing resizes on it.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Chain length of bucket `index`, or `None` if out of range.
    pub fn bucket_len(&self, index: usize) -> Option<usize> {
        self.buckets.get(index).map(Bucket::len)
    }

    /// Drop every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        debug!("clearing {} entries from chained map", self.len());
        self.nodes.clear();
        self.buckets.fill(Bucket::new());
    }

    /// Entries in bucket-index order, then chain order within a bucket.
    ///
    /// The order is deterministic for a given history of operations but
    /// follows the bucket layout, not insertion time.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            nodes: &self.nodes,
            chain: None,
            remaining: self.len(),
        }
    }

    /// Same traversal as [`iter`](Self::iter), yielding `(key, value)` pairs.
    pub fn items(&self) -> Iter<'_, K, V> {
        self.iter()
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Display,
    S: BucketIndexer,
{
    fn bucket_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Display,
    {
        // Custom indexers may overshoot; wrap rather than index out of bounds.
        self.indexer.bucket_index(q, self.capacity) % self.capacity.get()
    }

    /// Insert `key`, or replace the value of an existing equal key in place.
    ///
    /// Returns the previous value when the key was already present.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let idx = self.bucket_of(&key);
        let bucket = &mut self.buckets[idx];
        match bucket.upsert(&mut self.nodes, key, value) {
            Upsert::Inserted => {
                trace!("put: inserted into bucket {} (chain length {})", idx, bucket.len());
                None
            }
            Upsert::Updated(old) => {
                trace!("put: updated in bucket {}", idx);
                Some(old)
            }
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Result<&V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Display,
    {
        let idx = self.bucket_of(q);
        match self.buckets[idx].find(&self.nodes, q) {
            Some(k) => Ok(&self.nodes[k].value),
            None => {
                trace!("get: miss in bucket {}", idx);
                Err(LookupError::NotFound)
            }
        }
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Display,
    {
        let idx = self.bucket_of(q);
        match self.buckets[idx].find(&self.nodes, q) {
            Some(k) => Ok(&mut self.nodes[k].value),
            None => {
                trace!("get_mut: miss in bucket {}", idx);
                Err(LookupError::NotFound)
            }
        }
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Display,
    {
        let idx = self.bucket_of(q);
        self.buckets[idx].find(&self.nodes, q).is_some()
    }

    /// Remove `q`'s entry and return its value.
    pub fn remove<Q>(&mut self, q: &Q) -> Result<V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Display,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Remove `q`'s entry and return the owned key and value.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Result<(K, V), LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Display,
    {
        let idx = self.bucket_of(q);
        let bucket = &mut self.buckets[idx];
        match bucket.remove(&mut self.nodes, q) {
            Some(kv) => {
                trace!("remove: bucket {} now has chain length {}", idx, bucket.len());
                Ok(kv)
            }
            None => {
                trace!("remove: miss in bucket {}", idx);
                Err(LookupError::NotFound)
            }
        }
    }

    /// Panics if any structural invariant is broken:
    /// - len equals the sum of chain lengths;
    /// - every entry sits in the bucket its key indexes to;
    /// - keys are unique within each chain;
    /// - chain links are symmetric and match cached lengths.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut total = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            bucket.assert_links(&self.nodes);
            let keys: Vec<&K> = bucket.iter(&self.nodes).map(|(k, _)| k).collect();
            for (j, k) in keys.iter().enumerate() {
                assert_eq!(self.bucket_of(*k), i, "entry {} is in the wrong bucket", k);
                assert!(
                    keys[j + 1..].iter().all(|other| *other != *k),
                    "duplicate key {} in bucket {}",
                    k,
                    i
                );
            }
            total += bucket.len();
        }
        assert_eq!(total, self.len(), "len must equal the sum of chain lengths");
    }
}

impl<K, V, S> Debug for ChainedHashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Display,
    S: BucketIndexer,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket>,
    nodes: &'a Nodes<K, V>,
    chain: Option<Chain<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some(item);
            }
            let bucket = self.buckets.next()?;
            self.chain = (!bucket.is_empty()).then(|| bucket.iter(self.nodes));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Owning iterator; drains chains in the same order as [`Iter`].
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Bucket>,
    current: Bucket,
    nodes: Nodes<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(kv) = self.current.pop_front(&mut self.nodes) {
                return Some(kv);
            }
            self.current = self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            buckets: self.buckets.into_vec().into_iter(),
            current: Bucket::new(),
            nodes: self.nodes,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn map(capacity: usize) -> ChainedHashMap<String, i32> {
        ChainedHashMap::new(capacity).unwrap()
    }

    // Forces every key into bucket 0.
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

    /// Invariant: zero capacity is rejected and no map is produced.
    #[test]
    fn zero_capacity_rejected() {
        match ChainedHashMap::<String, i32>::new(0) {
            Err(CapacityError::Zero) => {}
            Ok(_) => panic!("expected zero capacity to be rejected"),
        }
    }

    /// Invariant: a fresh map has `capacity` empty buckets and no entries.
    #[test]
    fn new_map_is_empty() {
        let m = map(10);
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 10);
        assert!((0..10).all(|i| m.bucket_len(i) == Some(0)));
        assert_eq!(m.bucket_len(10), None);
        assert_eq!(m.load_factor(), 0.0);
        m.assert_invariants();
    }

    /// Invariant: after `put(k, v)`, `get(k) == v` and `contains(k)`.
    #[test]
    fn put_then_get() {
        let mut m = map(10);
        assert_eq!(m.put("apple".to_string(), 1), None);
        assert_eq!(m.get("apple"), Ok(&1));
        assert!(m.contains("apple"));
        assert_eq!(m.len(), 1);
        m.assert_invariants();
    }

    /// Invariant: a second `put` of the same key updates in place and does not grow len.
    #[test]
    fn put_existing_updates_without_duplicate() {
        let mut m = map(10);
        m.put("k".to_string(), 1);
        assert_eq!(m.put("k".to_string(), 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k"), Ok(&2));
        assert_eq!(m.keys().count(), 1);
        m.assert_invariants();
    }

    /// Invariant: absent keys fail with NotFound and leave the map untouched.
    #[test]
    fn absent_key_not_found() {
        let mut m = map(10);
        assert_eq!(m.get("x"), Err(LookupError::NotFound));
        assert_eq!(m.remove("x"), Err(LookupError::NotFound));
        assert!(!m.contains("x"));
        m.put("y".to_string(), 1);
        assert_eq!(m.get_mut("x"), Err(LookupError::NotFound));
        assert_eq!(m.remove_entry("x"), Err(LookupError::NotFound));
        assert_eq!(m.len(), 1);
        m.assert_invariants();
    }

    /// Invariant: after a successful remove the key is gone and a second remove fails.
    #[test]
    fn remove_erases() {
        let mut m = map(10);
        m.put("a".to_string(), 1);
        m.put("b".to_string(), 2);
        assert_eq!(m.remove("a"), Ok(1));
        assert!(!m.contains("a"));
        assert_eq!(m.get("a"), Err(LookupError::NotFound));
        assert_eq!(m.remove("a"), Err(LookupError::NotFound));
        assert_eq!(m.len(), 1);
        assert_eq!(m.remove_entry("b"), Ok(("b".to_string(), 2)));
        assert!(m.is_empty());
        m.assert_invariants();
    }

    /// Invariant: keys whose text folds to one bucket are chained, not overwritten.
    #[test]
    fn colliding_keys_are_chained() {
        let mut m: ChainedHashMap<u32, &str> = ChainedHashMap::new(10).unwrap();
        m.put(1, "v1");
        m.put(12, "v2");
        m.put(21, "v3");
        assert_eq!(m.bucket_len(9), Some(3));
        assert_eq!(m.get(&1), Ok(&"v1"));
        assert_eq!(m.get(&12), Ok(&"v2"));
        assert_eq!(m.get(&21), Ok(&"v3"));
        assert_eq!(m.len(), 3);

        // Removing the middle of the chain keeps its neighbours reachable.
        assert_eq!(m.remove(&12), Ok("v2"));
        assert_eq!(m.get(&1), Ok(&"v1"));
        assert_eq!(m.get(&21), Ok(&"v3"));
        assert_eq!(m.bucket_len(9), Some(2));
        m.assert_invariants();
    }

    /// Invariant: lookups resolve by equality when every key shares one bucket.
    #[test]
    fn all_keys_collide_with_const_indexer() {
        let mut m: ChainedHashMap<String, usize, ConstIndexer> =
            ChainedHashMap::with_capacity_and_indexer(NonZeroUsize::new(4).unwrap(), ConstIndexer);
        for i in 0..20 {
            m.put(format!("k{}", i), i);
        }
        assert_eq!(m.bucket_len(0), Some(20));
        for i in 0..20 {
            assert_eq!(m.get(format!("k{}", i).as_str()), Ok(&i));
        }
        for i in (0..20).step_by(3) {
            assert_eq!(m.remove(format!("k{}", i).as_str()), Ok(i));
        }
        assert_eq!(m.len(), 13);
        m.assert_invariants();
    }

    /// Invariant: traversal follows bucket index, then chain order.
    #[test]
    fn traversal_is_bucket_ordered() {
        let mut m: ChainedHashMap<&str, i32> = ChainedHashMap::new(10).unwrap();
        m.put("apple", 1);
        m.put("banana", 2);
        m.put("orange", 3);
        m.put("strawberry", 4);
        // apple -> 0, orange -> 6, banana and strawberry -> 9.
        let keys: Vec<_> = m.keys().copied().collect();
        assert_eq!(keys, ["apple", "orange", "banana", "strawberry"]);
        let values: Vec<_> = m.values().copied().collect();
        assert_eq!(values, [1, 3, 2, 4]);
        let items: Vec<_> = m.items().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(
            items,
            [("apple", 1), ("orange", 3), ("banana", 2), ("strawberry", 4)]
        );
    }

    /// Invariant: keys/values/items each yield exactly `len()` elements and
    /// every yielded key is contained.
    #[test]
    fn traversal_is_complete() {
        let mut m = map(7);
        for i in 0..50 {
            m.put(format!("key-{}", i), i);
        }
        for i in (0..50).step_by(4) {
            m.remove(format!("key-{}", i).as_str()).unwrap();
        }
        assert_eq!(m.keys().len(), m.len());
        assert_eq!(m.values().count(), m.len());
        assert_eq!(m.items().count(), m.len());
        for k in m.keys() {
            assert!(m.contains(k.as_str()));
        }
        let distinct: BTreeSet<_> = m.keys().collect();
        assert_eq!(distinct.len(), m.len());
        m.assert_invariants();
    }

    #[test]
    fn get_mut_updates_value() {
        let mut m = map(3);
        m.put("n".to_string(), 1);
        *m.get_mut("n").unwrap() += 41;
        assert_eq!(m.get("n"), Ok(&42));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut m = map(5);
        m.extend((0..10).map(|i| (i.to_string(), i)));
        assert_eq!(m.len(), 10);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 5);
        assert!(m.iter().next().is_none());
        m.put("again".to_string(), 1);
        assert_eq!(m.get("again"), Ok(&1));
        m.assert_invariants();
    }

    #[test]
    fn load_factor_tracks_len() {
        let mut m = map(4);
        m.extend((0..6).map(|i| (i.to_string(), i)));
        assert_eq!(m.load_factor(), 1.5);
    }

    /// Invariant: the owning iterator yields the same sequence as `iter`.
    #[test]
    fn into_iter_matches_iter_order() {
        let mut m = map(6);
        m.extend((0..25).map(|i| (format!("e{}", i), i)));
        let borrowed: Vec<(String, i32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let by_ref: Vec<(String, i32)> = (&m).into_iter().map(|(k, v)| (k.clone(), *v)).collect();
        let it = m.into_iter();
        assert_eq!(it.len(), 25);
        let owned: Vec<(String, i32)> = it.collect();
        assert_eq!(borrowed, owned);
        assert_eq!(by_ref, owned);
    }

    /// Invariant: clones are independent tables.
    #[test]
    fn clone_is_independent() {
        let mut a = map(4);
        a.put("k".to_string(), 1);
        let mut b = a.clone();
        b.put("k".to_string(), 2);
        b.put("other".to_string(), 3);
        assert_eq!(a.get("k"), Ok(&1));
        assert_eq!(a.len(), 1);
        assert_eq!(b.get("k"), Ok(&2));
        b.assert_invariants();
    }

    #[test]
    fn debug_renders_as_map() {
        let mut m: ChainedHashMap<&str, i32> = ChainedHashMap::new(10).unwrap();
        m.put("apple", 1);
        m.put("orange", 3);
        assert_eq!(format!("{:?}", m), r#"{"apple": 1, "orange": 3}"#);
    }

    #[test]
    fn default_uses_default_capacity() {
        let m: ChainedHashMap<String, i32> = ChainedHashMap::default();
        assert_eq!(m.capacity(), crate::config::DEFAULT_CAPACITY);
    }

    /// Invariant: an indexer returning out-of-range indices is wrapped, not trusted.
    #[test]
    fn out_of_range_indexer_is_wrapped() {
        #[derive(Clone, Default)]
        struct Overshoot;
        impl BucketIndexer for Overshoot {
            fn bucket_index<Q>(&self, _key: &Q, buckets: NonZeroUsize) -> usize
            where
                Q: ?Sized + Display,
            {
                buckets.get() + 2
            }
        }
        let mut m: ChainedHashMap<&str, i32, Overshoot> =
            ChainedHashMap::with_capacity_and_indexer(NonZeroUsize::new(5).unwrap(), Overshoot);
        m.put("a", 1);
        assert_eq!(m.bucket_len(2), Some(1));
        assert_eq!(m.get("a"), Ok(&1));
        m.assert_invariants();
    }

    /// Invariant: keys of different kinds with identical text share a bucket but
    /// remain distinct entries; equality is the key type's own `Eq`.
    #[test]
    fn same_text_different_kind_stays_distinct() {
        #[derive(Clone, Debug, PartialEq, Eq)]
        enum Key {
            Int(i64),
            Text(String),
        }
        impl Display for Key {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Key::Int(n) => write!(f, "{}", n),
                    Key::Text(s) => f.write_str(s),
                }
            }
        }

        let mut m: ChainedHashMap<Key, &str> = ChainedHashMap::new(10).unwrap();
        m.put(Key::Int(1), "int");
        m.put(Key::Text("1".to_string()), "text");
        assert_eq!(m.len(), 2);
        assert_eq!(m.bucket_len(9), Some(2));
        assert_eq!(m.get(&Key::Int(1)), Ok(&"int"));
        assert_eq!(m.get(&Key::Text("1".to_string())), Ok(&"text"));
        assert_eq!(m.remove(&Key::Int(1)), Ok("int"));
        assert!(m.contains(&Key::Text("1".to_string())));
        m.assert_invariants();
    }
}
