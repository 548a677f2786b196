//! Arena-backed doubly linked list of keys.
//!
//! Nodes live in a `Vec` and link to each other by index, with a free list
//! for slot reuse and a key → slot map for O(1) lookup. This replaces the
//! pointer-linked node chain an LRU list would normally use.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, usize>        nodes: Vec<Option<Node<K>>>
//!   ┌──────┬──────┐                   ┌──────┬───────────────────────────────┐
//!   │ "a"  │  0   │──────────────────►│  0   │ { key: a, prev: -, next: 2 }  │
//!   │ "b"  │  2   │──────────────────►│  1   │ (free)                        │
//!   │ "c"  │  3   │──┐                │  2   │ { key: b, prev: 0, next: 3 }  │
//!   └──────┴──────┘  └───────────────►│  3   │ { key: c, prev: 2, next: - }  │
//!                                     └──────┴───────────────────────────────┘
//!   free: [1]
//!
//!   head ─► [a] ◄──► [b] ◄──► [c] ◄── tail
//! ```
//!
//! ## Operations
//!
//! | Operation                      | Complexity |
//! |--------------------------------|------------|
//! | `push_front` / `push_back`     | O(1)       |
//! | `move_to_front` / `move_to_back` | O(1)     |
//! | `remove` / `pop_front` / `pop_back` | O(1)  |
//! | `front` / `back` / `contains`  | O(1)       |
//! | `iter`                         | O(n)       |
//!
//! LRU keeps the most recent key at the front; FIFO appends at the back and
//! evicts from the front.

use rustc_hash::FxHashMap;

use crate::error::InvariantError;
use crate::traits::CacheKey;

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Ordered set of keys with O(1) reordering.
///
/// # Example
///
/// ```
/// use cacheplex::ds::OrderList;
///
/// let mut list = OrderList::new();
/// list.push_back("a");
/// list.push_back("b");
/// list.push_back("c");
/// list.move_to_front(&"c");
///
/// let order: Vec<_> = list.iter().copied().collect();
/// assert_eq!(order, vec!["c", "a", "b"]);
/// assert_eq!(list.back(), Some(&"b"));
/// ```
#[derive(Debug)]
pub struct OrderList<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    index: FxHashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K: CacheKey> OrderList<K> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: FxHashMap::default(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            head: None,
            tail: None,
        }
    }

    /// Number of keys in the list.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is in the list.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Key at the front.
    pub fn front(&self) -> Option<&K> {
        self.head.and_then(|idx| self.node(idx)).map(|node| &node.key)
    }

    /// Key at the back.
    pub fn back(&self) -> Option<&K> {
        self.tail.and_then(|idx| self.node(idx)).map(|node| &node.key)
    }

    /// Inserts `key` at the front. Returns `false` (and does nothing) if the
    /// key is already present.
    pub fn push_front(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let idx = self.alloc(key);
        self.attach_front(idx);
        true
    }

    /// Inserts `key` at the back. Returns `false` (and does nothing) if the
    /// key is already present.
    pub fn push_back(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let idx = self.alloc(key);
        self.attach_back(idx);
        true
    }

    /// Moves an existing key to the front; returns `false` if absent.
    pub fn move_to_front(&mut self, key: &K) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
        true
    }

    /// Moves an existing key to the back; returns `false` if absent.
    pub fn move_to_back(&mut self, key: &K) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if self.tail != Some(idx) {
            self.detach(idx);
            self.attach_back(idx);
        }
        true
    }

    /// Removes `key`; returns `false` if it was not present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(idx) => {
                self.detach(idx);
                self.release(idx);
                true
            },
            None => false,
        }
    }

    /// Removes and returns the front key.
    pub fn pop_front(&mut self) -> Option<K> {
        let idx = self.head?;
        self.detach(idx);
        let key = self.release(idx)?;
        self.index.remove(&key);
        Some(key)
    }

    /// Removes and returns the back key.
    pub fn pop_back(&mut self) -> Option<K> {
        let idx = self.tail?;
        self.detach(idx);
        let key = self.release(idx)?;
        self.index.remove(&key);
        Some(key)
    }

    /// Iterates keys from front to back.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Verifies link symmetry, head/tail consistency and the key index.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;
        while let Some(idx) = current {
            let node = self
                .node(idx)
                .ok_or_else(|| InvariantError::new(format!("linked slot {idx} is free")))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!("slot {idx} has a stale prev link")));
            }
            if self.index.get(&node.key) != Some(&idx) {
                return Err(InvariantError::new(format!(
                    "index does not point at slot {idx} for {:?}",
                    node.key
                )));
            }
            count += 1;
            if count > self.index.len() {
                return Err(InvariantError::new("list is longer than its index (cycle?)"));
            }
            prev = Some(idx);
            current = node.next;
        }
        if self.tail != prev {
            return Err(InvariantError::new("tail does not match last linked node"));
        }
        if count != self.index.len() {
            return Err(InvariantError::new(format!(
                "list holds {count} nodes but index holds {}",
                self.index.len()
            )));
        }
        Ok(())
    }

    fn node(&self, idx: usize) -> Option<&Node<K>> {
        self.nodes.get(idx).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<K>> {
        self.nodes.get_mut(idx).and_then(|slot| slot.as_mut())
    }

    fn alloc(&mut self, key: K) -> usize {
        let node = Node {
            key: key.clone(),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            },
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            },
        };
        self.index.insert(key, idx);
        idx
    }

    fn release(&mut self, idx: usize) -> Option<K> {
        let node = self.nodes.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(node.key)
    }

    fn detach(&mut self, idx: usize) {
        let Some((prev, next)) = self.node(idx).map(|node| (node.prev, node.next)) else {
            return;
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            },
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            },
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.node_mut(h) {
                    node.prev = Some(idx);
                }
            },
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn attach_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(idx) {
            node.next = None;
            node.prev = old_tail;
        }
        match old_tail {
            Some(t) => {
                if let Some(node) = self.node_mut(t) {
                    node.next = Some(idx);
                }
            },
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

impl<K: CacheKey> Default for OrderList<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-to-back iterator over an [`OrderList`].
pub struct Iter<'a, K> {
    list: &'a OrderList<K>,
    current: Option<usize>,
}

impl<'a, K: CacheKey> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.list.node(idx)?;
        self.current = node.next;
        Some(&node.key)
    }
}
