//! Bucket chains: doubly linked lists whose nodes live in a shared arena.
//!
//! A `Bucket` only stores `head`, `tail` and its length; the nodes are
//! owned by the map's `SlotMap` and linked by generational keys. Every node
//! reachable from a bucket belongs to that bucket alone, so the arena is
//! partitioned into disjoint chains.

use core::borrow::Borrow;
use core::mem;
use slotmap::{DefaultKey, SlotMap};

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub(crate) type Nodes<K, V> = SlotMap<DefaultKey, Node<K, V>>;

/// Outcome of [`Bucket::upsert`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Upsert<V> {
    Inserted,
    Updated(V),
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Bucket {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    len: usize,
}

impl Bucket {
    pub(crate) const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Linear scan from the head; first node whose key equals `q`.
    pub(crate) fn find<K, V, Q>(&self, nodes: &Nodes<K, V>, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.head;
        while let Some(k) = cur {
            let node = &nodes[k];
            if node.key.borrow() == q {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Replace the value in place if `key` is present, otherwise append at the tail.
    pub(crate) fn upsert<K, V>(&mut self, nodes: &mut Nodes<K, V>, key: K, value: V) -> Upsert<V>
    where
        K: Eq,
    {
        match self.find(nodes, &key) {
            Some(k) => Upsert::Updated(mem::replace(&mut nodes[k].value, value)),
            None => {
                self.push_back(nodes, key, value);
                Upsert::Inserted
            }
        }
    }

    fn push_back<K, V>(&mut self, nodes: &mut Nodes<K, V>, key: K, value: V) -> DefaultKey {
        let tail = self.tail;
        let k = nodes.insert(Node {
            key,
            value,
            prev: tail,
            next: None,
        });
        match tail {
            Some(t) => nodes[t].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        self.len += 1;
        k
    }

    pub(crate) fn remove<K, V, Q>(&mut self, nodes: &mut Nodes<K, V>, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let k = self.find(nodes, q)?;
        self.unlink(nodes, k)
    }

    pub(crate) fn pop_front<K, V>(&mut self, nodes: &mut Nodes<K, V>) -> Option<(K, V)> {
        let k = self.head?;
        self.unlink(nodes, k)
    }

    // Predecessor takes over the successor link; boundary nodes move head/tail.
    fn unlink<K, V>(&mut self, nodes: &mut Nodes<K, V>, k: DefaultKey) -> Option<(K, V)> {
        let node = nodes.remove(k)?;
        match node.prev {
            Some(p) => nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        self.len -= 1;
        Some((node.key, node.value))
    }

    pub(crate) fn iter<'a, K, V>(&self, nodes: &'a Nodes<K, V>) -> Chain<'a, K, V> {
        Chain {
            nodes,
            cur: self.head,
            remaining: self.len,
        }
    }

    /// Walks the chain checking link symmetry and the cached length.
    #[cfg(test)]
    pub(crate) fn assert_links<K, V>(&self, nodes: &Nodes<K, V>) {
        let mut prev = None;
        let mut cur = self.head;
        let mut n = 0;
        while let Some(k) = cur {
            let node = nodes.get(k).expect("chain points at a live node");
            assert_eq!(node.prev, prev, "prev link mismatch");
            prev = Some(k);
            cur = node.next;
            n += 1;
        }
        assert_eq!(self.tail, prev, "tail must be the last node");
        assert_eq!(self.len, n, "cached length must match chain");
    }
}

/// Head-to-tail iterator over one chain.
pub(crate) struct Chain<'a, K, V> {
    nodes: &'a Nodes<K, V>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = &self.nodes[k];
        self.cur = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
