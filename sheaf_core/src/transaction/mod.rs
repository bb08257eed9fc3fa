// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactions: atomic, ordered batches of per-surface state.
//!
//! A [`Transaction`] maps each surface it touches to a [`TransactionEntry`].
//! Transactions are built up through the [`Compositor`](crate::Compositor)
//! (which takes a hold on every surface an entry names), then committed.
//!
//! # Commit chains
//!
//! Once committed, a transaction joins the [`CommitQueue`] and becomes the
//! `last_committed` transaction of every surface it names. A surface's
//! `first_committed` is the oldest transaction still pending for it. A
//! transaction may apply only when it is the `first_committed` of all its
//! surfaces; this is checked per surface, without scanning the queue.
//!
//! # Apply order
//!
//! Applying a transaction walks its surfaces ancestors-first, writing position
//! overrides and applying state snapshots, then walks them again
//! descendants-first to sync actor state. Applying advances the commit chain
//! of each surface, which may make later transactions ready; those are applied
//! in commit-sequence order by the same call, iteratively.
//!
//! # Fences
//!
//! A transaction may also wait on [`FenceId`]s, typically client buffers whose
//! rendering has not finished. A fenced transaction still joins the queue and
//! claims its surfaces on commit, but it is not ready until every fence has
//! been signalled through
//! [`Compositor::signal_fence`](crate::Compositor::signal_fence).

mod apply;
mod entry;
mod id;
mod queue;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

pub use entry::TransactionEntry;
pub use id::TransactionId;
pub use queue::CommitQueue;

use crate::state::{PendingState, PlacementOp, SurfaceState};
use crate::surface::{SurfaceId, SurfaceTree};

/// An uncommitted batch of per-surface mutations.
///
/// A transaction holds a strong reference to every surface it names, so it
/// must be handed back to the [`Compositor`](crate::Compositor) through
/// [`commit`](crate::Compositor::commit),
/// [`merge_into`](crate::Compositor::merge_into), or
/// [`discard`](crate::Compositor::discard).
#[must_use = "transactions must be committed, merged, or discarded"]
#[derive(Debug)]
pub struct Transaction<S = SurfaceState> {
    pub(crate) entries: BTreeMap<SurfaceId, TransactionEntry<S>>,
    pub(crate) fences: BTreeSet<FenceId>,
}

/// An opaque readiness fence a transaction can wait on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FenceId(pub u64);

impl<S> Default for Transaction<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Transaction<S> {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            fences: BTreeSet::new(),
        }
    }

    /// Makes the transaction wait for `fence` before it can apply.
    ///
    /// Adding the same fence twice is a no-op.
    pub fn add_fence(&mut self, fence: FenceId) {
        self.fences.insert(fence);
    }

    /// Returns whether any fence is still unsignalled.
    #[must_use]
    pub fn is_fenced(&self) -> bool {
        !self.fences.is_empty()
    }

    /// Returns the unsignalled fences.
    pub fn fences(&self) -> impl Iterator<Item = FenceId> + '_ {
        self.fences.iter().copied()
    }

    /// Returns whether the transaction names no surface.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of surfaces the transaction names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the transaction has an entry for `surface`.
    #[must_use]
    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.entries.contains_key(&surface)
    }

    /// Returns the entry for `surface`, if any.
    #[must_use]
    pub fn entry(&self, surface: SurfaceId) -> Option<&TransactionEntry<S>> {
        self.entries.get(&surface)
    }

    /// Returns an iterator over the surfaces the transaction names.
    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.entries.keys().copied()
    }
}

impl<S: PendingState> Transaction<S> {
    /// Returns the entry for `surface`, creating it and taking a hold on the
    /// surface on first access.
    pub(crate) fn ensure_entry(
        &mut self,
        surfaces: &mut SurfaceTree<S>,
        surface: SurfaceId,
    ) -> &mut TransactionEntry<S> {
        self.entries.entry(surface).or_insert_with(|| {
            surfaces.hold(surface);
            TransactionEntry::default()
        })
    }

    /// Ensures every surface named by `placed` has an entry.
    ///
    /// Surfaces freed since the placement was requested are skipped.
    pub(crate) fn ensure_entries(&mut self, surfaces: &mut SurfaceTree<S>, placed: &[SurfaceId]) {
        for &surface in placed {
            if surfaces.is_valid(surface) {
                let _ = self.ensure_entry(surfaces, surface);
            }
        }
    }
}

/// Collects every surface named by a list of placement operations.
pub(crate) fn placement_surfaces(ops: &[PlacementOp]) -> Vec<SurfaceId> {
    let mut named = Vec::with_capacity(ops.len() * 2);
    for op in ops {
        named.push(op.surface);
        if let Some(sibling) = op.sibling {
            named.push(sibling);
        }
    }
    named
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Placement;

    #[test]
    fn ensure_entry_holds_once() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let s = tree.create_surface();
        let mut txn = Transaction::new();

        let _ = txn.ensure_entry(&mut tree, s);
        let _ = txn.ensure_entry(&mut tree, s);
        assert_eq!(txn.len(), 1);
        assert!(txn.contains(s));
        assert_eq!(tree.hold_count(s), 1);

        let entry = txn.entry(s).unwrap();
        assert!(entry.state().is_none());
        assert!(entry.position().is_none());
    }

    #[test]
    fn fences_are_a_set() {
        let mut txn: Transaction = Transaction::new();
        assert!(!txn.is_fenced());
        txn.add_fence(FenceId(3));
        txn.add_fence(FenceId(1));
        txn.add_fence(FenceId(3));
        assert!(txn.is_fenced());
        assert_eq!(txn.fences().collect::<Vec<_>>(), [FenceId(1), FenceId(3)]);
    }

    #[test]
    fn placement_surfaces_names_both_sides() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let a = tree.create_surface();
        let b = tree.create_surface();
        let c = tree.create_surface();
        let ops = [
            PlacementOp {
                surface: a,
                sibling: Some(b),
                placement: Placement::Above,
            },
            PlacementOp {
                surface: c,
                sibling: None,
                placement: Placement::Below,
            },
        ];
        assert_eq!(placement_surfaces(&ops), [a, b, c]);
    }
}
