//! LRU table: key→value mapping and recency order kept as one unit
//!
//! Entries live in a slab (`Vec<Option<Node>>`) and are threaded onto an
//! index-linked list, most-recently-used at `head`, least at `tail`.
//! The `index` map points each key at its slab slot, so lookup, promotion,
//! insertion and eviction are all O(1).
//!
//! ```text
//!   index: { "a" → 2, "b" → 0, "c" → 1 }
//!
//!   head                         tail
//!    │                            │
//!    ▼                            ▼
//!  [slot 1: c] ⇄ [slot 0: b] ⇄ [slot 2: a]
//! ```
//!
//! The table is not synchronized. `CacheStore` wraps it in a `RwLock` and
//! only `MutationArbiter` ever takes the write half.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel for "no slot"
const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Capacity-bounded mapping with least-recently-used ordering
pub(crate) struct LruTable<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl<K, V> LruTable<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.saturating_add(1)),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity.saturating_add(1)),
            head: NIL,
            tail: NIL,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a value without touching the recency order
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.node(slot).map(|n| &n.value)
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Move `key` to the front of the order
    ///
    /// Returns false if the key is not present (it may have been evicted
    /// between a reader's lookup and this call).
    pub(crate) fn promote<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&slot) = self.index.get(key) else {
            return false;
        };
        if self.head != slot {
            self.unlink(slot);
            self.push_front(slot);
        }
        true
    }

    /// Insert a fresh entry at the front, evicting the back entry if the
    /// table grows past capacity
    ///
    /// An existing entry for `key` is dropped and replaced, never edited in
    /// place. Returns the evicted entry, if any.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(slot) = self.index.remove(&key) {
            self.unlink(slot);
            self.release(slot);
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.push_front(slot);

        if self.len() > self.capacity {
            self.evict_lru()
        } else {
            None
        }
    }

    /// Remove and return the least-recently-used entry
    pub(crate) fn evict_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let slot = self.tail;
        self.unlink(slot);
        let node = self.release(slot)?;
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Keys from most- to least-recently-used
    pub(crate) fn keys_by_recency(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cur = self.head;
        while let Some(node) = self.node(cur) {
            keys.push(node.key.clone());
            cur = node.next;
        }
        keys
    }

    /// Verify that order and mapping describe the same key set
    ///
    /// Walks the whole list; meant for `debug_assert!` after mutations.
    pub(crate) fn check_invariants(&self) -> bool {
        if self.len() > self.capacity {
            return false;
        }
        let mut seen = 0usize;
        let mut prev = NIL;
        let mut cur = self.head;
        while cur != NIL {
            let Some(node) = self.node(cur) else {
                return false;
            };
            if node.prev != prev || self.index.get(&node.key) != Some(&cur) {
                return false;
            }
            seen += 1;
            if seen > self.len() {
                return false;
            }
            prev = cur;
            cur = node.next;
        }
        prev == self.tail && seen == self.len()
    }

    // ------------------------------------------------------------------
    // Slab and list plumbing
    // ------------------------------------------------------------------

    #[inline]
    fn node(&self, slot: usize) -> Option<&Node<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    #[inline]
    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn release(&mut self, slot: usize) -> Option<Node<K, V>> {
        let node = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        Some(node)
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.node(slot) {
            Some(n) => (n.prev, n.next),
            None => return,
        };
        match self.node_mut(prev) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match self.node_mut(next) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
        if let Some(n) = self.node_mut(slot) {
            n.prev = NIL;
            n.next = NIL;
        }
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(n) = self.node_mut(slot) {
            n.prev = NIL;
            n.next = old_head;
        }
        match self.node_mut(old_head) {
            Some(h) => h.prev = slot,
            None => self.tail = slot,
        }
        self.head = slot;
    }
}
