// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The committed-transaction queue.

use alloc::vec::Vec;

use super::Transaction;
use super::id::TransactionId;
use crate::surface::{INVALID, SurfaceId};

/// All transactions that have been committed but not yet applied, oldest
/// first.
///
/// Slots live in parallel arrays and are threaded into an intrusive doubly
/// linked list, so appending and unlinking by [`TransactionId`] are O(1) and
/// scanning forward from any queued transaction needs no search. The queue
/// also owns the commit sequence counter; sequences are never reused.
#[derive(Debug)]
pub struct CommitQueue<S> {
    pub(crate) transaction: Vec<Option<Transaction<S>>>,
    pub(crate) sequence: Vec<u64>,
    pub(crate) prev: Vec<u32>,
    pub(crate) next: Vec<u32>,
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) head: u32,
    pub(crate) tail: u32,
    pub(crate) len: usize,
    pub(crate) last_sequence: u64,
}

impl<S> Default for CommitQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CommitQueue<S> {
    /// Creates an empty queue. The first commit gets sequence 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transaction: Vec::new(),
            sequence: Vec::new(),
            prev: Vec::new(),
            next: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            head: INVALID,
            tail: INVALID,
            len: 0,
            last_sequence: 0,
        }
    }

    /// Returns the number of queued transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether no transaction is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the most recently assigned commit sequence (0 before the first
    /// commit).
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Returns whether `id` is still queued.
    #[must_use]
    pub fn contains(&self, id: TransactionId) -> bool {
        (id.idx as usize) < self.transaction.len()
            && self.generation[id.idx as usize] == id.generation
            && self.transaction[id.idx as usize].is_some()
    }

    /// Returns the commit sequence of a queued transaction.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not queued.
    #[must_use]
    pub fn sequence(&self, id: TransactionId) -> u64 {
        self.validate(id);
        self.sequence[id.idx as usize]
    }

    /// Returns a queued transaction.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not queued.
    #[must_use]
    pub fn get(&self, id: TransactionId) -> &Transaction<S> {
        self.validate(id);
        match &self.transaction[id.idx as usize] {
            Some(txn) => txn,
            None => unreachable!("validated slot is occupied"),
        }
    }

    /// Returns the oldest queued transaction.
    #[must_use]
    pub fn head(&self) -> Option<TransactionId> {
        self.handle(self.head)
    }

    /// Returns the transaction committed right after `id`, if still queued.
    #[must_use]
    pub fn next_of(&self, id: TransactionId) -> Option<TransactionId> {
        self.validate(id);
        self.handle(self.next[id.idx as usize])
    }

    /// Returns an iterator over queued transactions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = TransactionId> + '_ {
        core::iter::successors(self.head(), |&id| self.next_of(id))
    }

    // -- Crate-internal mutation --

    pub(crate) fn get_mut(&mut self, id: TransactionId) -> &mut Transaction<S> {
        self.validate(id);
        match &mut self.transaction[id.idx as usize] {
            Some(txn) => txn,
            None => unreachable!("validated slot is occupied"),
        }
    }

    /// Appends a transaction at the tail, assigning the next sequence.
    pub(crate) fn push(&mut self, txn: Transaction<S>) -> TransactionId {
        self.last_sequence += 1;
        let idx = if let Some(idx) = self.free_list.pop() {
            self.transaction[idx as usize] = Some(txn);
            self.sequence[idx as usize] = self.last_sequence;
            idx
        } else {
            let idx = u32::try_from(self.transaction.len())
                .ok()
                .filter(|&idx| idx != INVALID)
                .unwrap_or_else(|| panic!("commit queue slot space exhausted"));
            self.transaction.push(Some(txn));
            self.sequence.push(self.last_sequence);
            self.prev.push(INVALID);
            self.next.push(INVALID);
            self.generation.push(0);
            idx
        };

        self.prev[idx as usize] = self.tail;
        self.next[idx as usize] = INVALID;
        if self.tail != INVALID {
            self.next[self.tail as usize] = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
        self.len += 1;

        TransactionId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Unlinks a transaction from anywhere in the queue and frees its slot.
    pub(crate) fn remove(&mut self, id: TransactionId) -> Transaction<S> {
        self.validate(id);
        let idx = id.idx;
        let prev = self.prev[idx as usize];
        let next = self.next[idx as usize];

        if prev != INVALID {
            self.next[prev as usize] = next;
        } else {
            self.head = next;
        }
        if next != INVALID {
            self.prev[next as usize] = prev;
        } else {
            self.tail = prev;
        }

        self.prev[idx as usize] = INVALID;
        self.next[idx as usize] = INVALID;
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        self.len -= 1;

        match self.transaction[idx as usize].take() {
            Some(txn) => txn,
            None => unreachable!("validated slot is occupied"),
        }
    }

    /// Removes and returns the oldest transaction.
    pub(crate) fn pop_front(&mut self) -> Option<(TransactionId, Transaction<S>)> {
        let id = self.head()?;
        let txn = self.remove(id);
        Some((id, txn))
    }

    /// Finds the next queued transaction after `id` that mentions `surface`.
    ///
    /// `last` is the surface's `last_committed`; reaching it ends the scan
    /// without a lookup.
    pub(crate) fn find_next_for_surface(
        &self,
        id: TransactionId,
        surface: SurfaceId,
        last: Option<TransactionId>,
    ) -> Option<TransactionId> {
        let mut cursor = self.next_of(id);
        while let Some(next) = cursor {
            if last == Some(next) || self.get(next).contains(surface) {
                return Some(next);
            }
            cursor = self.next_of(next);
        }
        None
    }

    // -- Internal helpers --

    fn handle(&self, idx: u32) -> Option<TransactionId> {
        (idx != INVALID).then(|| TransactionId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Panics if `id` is not queued.
    fn validate(&self, id: TransactionId) {
        assert!(
            self.contains(id),
            "stale TransactionId: {id:?} is not in the commit queue"
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::state::SurfaceState;
    use crate::surface::SurfaceTree;

    fn queue() -> CommitQueue<SurfaceState> {
        CommitQueue::new()
    }

    #[test]
    fn push_assigns_increasing_sequences() {
        let mut q = queue();
        let a = q.push(Transaction::new());
        let b = q.push(Transaction::new());
        assert_eq!(q.sequence(a), 1);
        assert_eq!(q.sequence(b), 2);
        assert_eq!(q.last_sequence(), 2);
        assert_eq!(q.len(), 2);
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn remove_from_middle_keeps_links() {
        let mut q = queue();
        let a = q.push(Transaction::new());
        let b = q.push(Transaction::new());
        let c = q.push(Transaction::new());

        let _ = q.remove(b);
        assert!(!q.contains(b));
        assert_eq!(q.next_of(a), Some(c));
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![a, c]);

        let _ = q.remove(c);
        let _ = q.remove(a);
        assert!(q.is_empty());
        assert_eq!(q.head(), None);
    }

    #[test]
    fn sequences_are_never_reused() {
        let mut q = queue();
        let a = q.push(Transaction::new());
        let _ = q.remove(a);
        let b = q.push(Transaction::new());
        assert_eq!(a.idx, b.idx);
        assert_ne!(a.generation, b.generation);
        assert_eq!(q.sequence(b), 2);
        assert!(!q.contains(a));
    }

    #[test]
    fn find_next_for_surface_skips_unrelated() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let s = tree.create_surface();
        let other = tree.create_surface();

        let mut q = queue();
        let mut t1 = Transaction::new();
        let _ = t1.ensure_entry(&mut tree, s);
        let mut t2 = Transaction::new();
        let _ = t2.ensure_entry(&mut tree, other);
        let mut t3 = Transaction::new();
        let _ = t3.ensure_entry(&mut tree, s);

        let a = q.push(t1);
        let _b = q.push(t2);
        let c = q.push(t3);

        assert_eq!(q.find_next_for_surface(a, s, None), Some(c));
        assert_eq!(q.find_next_for_surface(c, s, None), None);
    }

    #[test]
    fn pop_front_drains_in_commit_order() {
        let mut q = queue();
        let a = q.push(Transaction::new());
        let b = q.push(Transaction::new());
        assert_eq!(q.pop_front().map(|(id, _)| id), Some(a));
        assert_eq!(q.pop_front().map(|(id, _)| id), Some(b));
        assert!(q.pop_front().is_none());
    }

    #[test]
    #[should_panic(expected = "stale TransactionId")]
    fn removed_id_panics() {
        let mut q = queue();
        let a = q.push(Transaction::new());
        let _ = q.remove(a);
        let _ = q.sequence(a);
    }
}
