//! Indexed binary min-heap.
//!
//! An array-backed priority queue that also keeps a `data → position` map,
//! so any element (not just the root) can be removed or re-prioritised in
//! O(log n). Used for expiry scheduling (priority = expiry timestamp) and
//! for the LFU / MRU / TTL strategies.
//!
//! ## Architecture
//!
//! ```text
//!   heap: Vec<HeapNode>                      index: FxHashMap<T, usize>
//!
//!              [0] (1.0, "b")                 ┌───────┬─────┐
//!             /              \                │  "b"  │  0  │
//!      [1] (3.0, "c")    [2] (5.0, "a")       │  "c"  │  1  │
//!       /                                     │  "a"  │  2  │
//!   [3] (4.0, "d")                            │  "d"  │  3  │
//!                                             └───────┴─────┘
//!
//!   parent(i) = (i - 1) / 2      children(i) = 2i + 1, 2i + 2
//! ```
//!
//! Every swap during sift-up / sift-down rewrites both affected index-map
//! entries, keeping `index[heap[i].data] == i` for all `i`.
//!
//! ## Operations
//!
//! | Operation         | Complexity |
//! |-------------------|------------|
//! | `insert`          | O(log n)   |
//! | `peek`            | O(1)       |
//! | `extract_min`     | O(log n)   |
//! | `remove`          | O(log n)   |
//! | `update_priority` | O(log n)   |
//! | `contains`        | O(1)       |
//!
//! ## Notes
//!
//! - The priority type defaults to `f64`; any `PartialOrd + Copy` type works,
//!   which lets LFU rank by `(frequency, tick)` tuples.
//! - Ties between equal priorities are broken arbitrarily.
//! - `NaN` priorities are not supported.

use rustc_hash::FxHashMap;

use crate::error::InvariantError;
use crate::traits::CacheKey;

#[derive(Debug, Clone)]
struct HeapNode<T, P> {
    priority: P,
    data: T,
}

/// Binary min-heap with O(log n) arbitrary removal and re-prioritisation.
///
/// Each `data` value appears at most once; inserting a value that is
/// already present updates its priority instead.
///
/// # Example
///
/// ```
/// use cacheplex::ds::MinHeap;
///
/// let mut heap: MinHeap<&str> = MinHeap::new();
/// heap.insert(5.0, "a");
/// heap.insert(1.0, "b");
/// heap.insert(3.0, "c");
///
/// assert_eq!(heap.peek(), Some((1.0, &"b")));
/// assert!(heap.update_priority(&"a", 0.5));
/// assert_eq!(heap.extract_min(), Some((0.5, "a")));
/// assert!(heap.remove(&"c"));
/// assert_eq!(heap.extract_min(), Some((1.0, "b")));
/// assert_eq!(heap.extract_min(), None);
/// ```
#[derive(Debug, Clone)]
pub struct MinHeap<T, P = f64> {
    heap: Vec<HeapNode<T, P>>,
    index: FxHashMap<T, usize>,
}

impl<T, P> MinHeap<T, P>
where
    T: CacheKey,
    P: PartialOrd + Copy,
{
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Creates an empty heap with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if the heap is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` if `data` is in the heap.
    #[inline]
    pub fn contains(&self, data: &T) -> bool {
        self.index.contains_key(data)
    }

    /// Returns the current priority of `data`.
    pub fn priority_of(&self, data: &T) -> Option<P> {
        self.index.get(data).map(|&i| self.heap[i].priority)
    }

    /// Inserts `data` with `priority`.
    ///
    /// If `data` is already present its priority is updated in place.
    pub fn insert(&mut self, priority: P, data: T) {
        if self.index.contains_key(&data) {
            self.update_priority(&data, priority);
            return;
        }
        let pos = self.heap.len();
        self.index.insert(data.clone(), pos);
        self.heap.push(HeapNode { priority, data });
        self.sift_up(pos);
    }

    /// Returns the minimum element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<(P, &T)> {
        self.heap.first().map(|node| (node.priority, &node.data))
    }

    /// Removes and returns the minimum element.
    pub fn extract_min(&mut self) -> Option<(P, T)> {
        if self.heap.is_empty() {
            return None;
        }
        let node = self.take_at(0);
        Some((node.priority, node.data))
    }

    /// Removes `data`; returns `false` if it was not present.
    pub fn remove(&mut self, data: &T) -> bool {
        match self.index.get(data).copied() {
            Some(pos) => {
                self.take_at(pos);
                true
            },
            None => false,
        }
    }

    /// Changes the priority of `data` and restores heap order.
    ///
    /// Returns `false` if `data` is not present.
    pub fn update_priority(&mut self, data: &T, priority: P) -> bool {
        let Some(&pos) = self.index.get(data) else {
            return false;
        };
        let old = self.heap[pos].priority;
        self.heap[pos].priority = priority;
        if priority < old {
            self.sift_up(pos);
        } else {
            self.sift_down(pos);
        }
        true
    }

    /// Removes and returns the minimum while its priority is `<= bound`.
    pub fn pop_if_at_most(&mut self, bound: P) -> Option<(P, T)> {
        match self.peek() {
            Some((priority, _)) if priority <= bound => self.extract_min(),
            _ => None,
        }
    }

    /// Iterates elements in heap (not sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (P, &T)> {
        self.heap.iter().map(|node| (node.priority, &node.data))
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    /// Verifies the heap property and index-map consistency.
    ///
    /// An error here is the heap-inconsistency class: a bug, never an
    /// expected runtime condition.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.heap.len() {
            return Err(InvariantError::new(format!(
                "index tracks {} elements but heap holds {}",
                self.index.len(),
                self.heap.len()
            )));
        }
        for (i, node) in self.heap.iter().enumerate() {
            if self.index.get(&node.data) != Some(&i) {
                return Err(InvariantError::new(format!(
                    "index for {:?} does not point at position {i}",
                    node.data
                )));
            }
            if i > 0 {
                let parent = &self.heap[(i - 1) / 2];
                if node.priority < parent.priority {
                    return Err(InvariantError::new(format!(
                        "heap order violated at position {i}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn take_at(&mut self, pos: usize) -> HeapNode<T, P> {
        let last = self.heap.len() - 1;
        if pos != last {
            self.swap(pos, last);
        }
        let node = match self.heap.pop() {
            Some(node) => node,
            None => unreachable!("take_at on an empty heap"),
        };
        self.index.remove(&node.data);
        if pos < self.heap.len() {
            if pos > 0 && self.heap[pos].priority < self.heap[(pos - 1) / 2].priority {
                self.sift_up(pos);
            } else {
                self.sift_down(pos);
            }
        }
        debug_assert_eq!(self.index.len(), self.heap.len());
        node
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        if let Some(slot) = self.index.get_mut(&self.heap[a].data) {
            *slot = a;
        }
        if let Some(slot) = self.index.get_mut(&self.heap[b].data) {
            *slot = b;
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].priority < self.heap[parent].priority {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.heap[left].priority < self.heap[smallest].priority {
                smallest = left;
            }
            if right < len && self.heap[right].priority < self.heap[smallest].priority {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}

impl<T, P> Default for MinHeap<T, P>
where
    T: CacheKey,
    P: PartialOrd + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod basic_operations {
        use super::*;

        #[test]
        fn new_heap_is_empty() {
            let heap: MinHeap<u32> = MinHeap::new();
            assert!(heap.is_empty());
            assert_eq!(heap.peek(), None);
        }

        #[test]
        fn extracts_in_priority_order() {
            let mut heap = MinHeap::new();
            for (p, d) in [(5.0, "e"), (1.0, "a"), (3.0, "c"), (2.0, "b"), (4.0, "d")] {
                heap.insert(p, d);
            }
            let order: Vec<_> = std::iter::from_fn(|| heap.extract_min()).map(|(_, d)| d).collect();
            assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
        }

        #[test]
        fn peek_does_not_mutate() {
            let mut heap = MinHeap::new();
            heap.insert(2.0, 'x');
            heap.insert(1.0, 'y');
            assert_eq!(heap.peek(), Some((1.0, &'y')));
            assert_eq!(heap.peek(), Some((1.0, &'y')));
            assert_eq!(heap.len(), 2);
        }

        #[test]
        fn duplicate_priorities_are_allowed() {
            let mut heap = MinHeap::new();
            heap.insert(1.0, 1u32);
            heap.insert(1.0, 2u32);
            heap.insert(1.0, 3u32);
            let mut drained: Vec<_> = std::iter::from_fn(|| heap.extract_min())
                .map(|(_, d)| d)
                .collect();
            drained.sort_unstable();
            assert_eq!(drained, vec![1, 2, 3]);
        }

        #[test]
        fn reinserting_data_updates_priority() {
            let mut heap = MinHeap::new();
            heap.insert(5.0, "a");
            heap.insert(3.0, "b");
            heap.insert(1.0, "a");
            assert_eq!(heap.len(), 2);
            assert_eq!(heap.priority_of(&"a"), Some(1.0));
            assert_eq!(heap.peek(), Some((1.0, &"a")));
        }
    }

    mod removal_and_update {
        use super::*;

        #[test]
        fn remove_arbitrary_element() {
            let mut heap = MinHeap::new();
            for i in 0..10u32 {
                heap.insert(f64::from(i), i);
            }
            assert!(heap.remove(&4));
            assert!(heap.remove(&0));
            assert!(!heap.contains(&4));
            heap.check_invariants().unwrap();
            assert_eq!(heap.extract_min(), Some((1.0, 1)));
        }

        #[test]
        fn remove_missing_returns_false() {
            let mut heap: MinHeap<u32> = MinHeap::new();
            heap.insert(1.0, 1);
            assert!(!heap.remove(&2));
            assert!(heap.remove(&1));
            assert!(!heap.remove(&1));
        }

        #[test]
        fn remove_last_position() {
            let mut heap = MinHeap::new();
            heap.insert(1.0, "a");
            heap.insert(2.0, "b");
            assert!(heap.remove(&"b"));
            assert_eq!(heap.len(), 1);
            heap.check_invariants().unwrap();
        }

        #[test]
        fn many_interior_removals_keep_order() {
            let mut heap: MinHeap<u32, u64> = MinHeap::new();
            for i in 0..5_000u32 {
                heap.insert(u64::from(i.wrapping_mul(2_654_435_761) % 10_007), i);
            }
            for i in (0..5_000u32).step_by(3) {
                assert!(heap.remove(&i));
            }
            heap.check_invariants().unwrap();

            let mut last = 0;
            let mut drained = 0;
            while let Some((priority, data)) = heap.extract_min() {
                assert!(priority >= last);
                assert_ne!(data % 3, 0);
                last = priority;
                drained += 1;
            }
            assert_eq!(drained, 5_000 - 1_667);
        }

        #[test]
        fn update_priority_both_directions() {
            let mut heap = MinHeap::new();
            heap.insert(1.0, "a");
            heap.insert(2.0, "b");
            heap.insert(3.0, "c");

            assert!(heap.update_priority(&"a", 10.0));
            assert_eq!(heap.peek(), Some((2.0, &"b")));
            assert!(heap.update_priority(&"c", 0.0));
            assert_eq!(heap.peek(), Some((0.0, &"c")));
            assert!(!heap.update_priority(&"zzz", 1.0));
            heap.check_invariants().unwrap();
        }

        #[test]
        fn pop_if_at_most_respects_bound() {
            let mut heap: MinHeap<&str, u64> = MinHeap::new();
            heap.insert(10, "a");
            heap.insert(20, "b");
            assert_eq!(heap.pop_if_at_most(5), None);
            assert_eq!(heap.pop_if_at_most(15), Some((10, "a")));
            assert_eq!(heap.pop_if_at_most(15), None);
            assert_eq!(heap.len(), 1);
        }

        #[test]
        fn tuple_priorities_order_lexicographically() {
            let mut heap: MinHeap<&str, (u64, u64)> = MinHeap::new();
            heap.insert((2, 1), "a");
            heap.insert((1, 5), "b");
            heap.insert((1, 3), "c");
            assert_eq!(heap.extract_min(), Some(((1, 3), "c")));
            assert_eq!(heap.extract_min(), Some(((1, 5), "b")));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Insert(u8, u16),
            Extract,
            Remove(u8),
            Update(u8, u16),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (any::<u8>(), any::<u16>()).prop_map(|(d, p)| Op::Insert(d, p)),
                Just(Op::Extract),
                any::<u8>().prop_map(Op::Remove),
                (any::<u8>(), any::<u16>()).prop_map(|(d, p)| Op::Update(d, p)),
            ]
        }

        proptest! {
            /// extract_min always yields the smallest remaining priority and
            /// the index map stays consistent after every mutation.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_heap_matches_model(ops in prop::collection::vec(op(), 0..300)) {
                let mut heap: MinHeap<u8> = MinHeap::new();
                let mut model: std::collections::HashMap<u8, f64> = Default::default();

                for op in ops {
                    match op {
                        Op::Insert(d, p) => {
                            heap.insert(f64::from(p), d);
                            model.insert(d, f64::from(p));
                        },
                        Op::Extract => {
                            let expected = model
                                .values()
                                .copied()
                                .fold(None, |acc: Option<f64>, p| {
                                    Some(acc.map_or(p, |a| a.min(p)))
                                });
                            let got = heap.extract_min();
                            prop_assert_eq!(got.map(|(p, _)| p), expected);
                            if let Some((_, d)) = got {
                                model.remove(&d);
                            }
                        },
                        Op::Remove(d) => {
                            prop_assert_eq!(heap.remove(&d), model.remove(&d).is_some());
                        },
                        Op::Update(d, p) => {
                            let present = model.contains_key(&d);
                            prop_assert_eq!(heap.update_priority(&d, f64::from(p)), present);
                            if present {
                                model.insert(d, f64::from(p));
                            }
                        },
                    }
                    prop_assert!(heap.check_invariants().is_ok());
                    prop_assert_eq!(heap.len(), model.len());
                }
            }
        }
    }
}
