//! Min-priority queue keyed by `(rank, insertion_order)`.
//!
//! Lower ranks are popped first; ties are broken by insertion order
//! (FIFO), which makes search order reproducible.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::traits::Cost;

#[derive(Debug)]
struct Entry<E> {
    item: E,
    rank: Cost,
    seq: u64,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// A min-queue with FIFO tie-breaking. Stale entries are the caller's
/// business (lazy deletion).
pub(crate) struct MinQueue<E> {
    heap: BinaryHeap<Reverse<Entry<E>>>,
    seq: u64,
}

impl<E> MinQueue<E> {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Push an item, returning its sequence number.
    pub(crate) fn push(&mut self, item: E, rank: Cost) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Entry { item, rank, seq }));
        seq
    }

    pub(crate) fn pop_with_rank(&mut self) -> Option<(E, Cost)> {
        self.heap.pop().map(|Reverse(e)| (e.item, e.rank))
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
