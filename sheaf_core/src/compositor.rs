// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositor-scoped owner of surfaces and committed transactions.

use alloc::collections::btree_map::Entry;

use crate::backend::StateApplier;
use crate::state::{PendingState, SurfaceState};
use crate::surface::{SurfaceId, SurfaceTree};
use crate::trace::{CommitEvent, FinalizeEvent, Tracer};
use crate::transaction::{
    CommitQueue, FenceId, Transaction, TransactionEntry, TransactionId, placement_surfaces,
};

/// Owns the surface tree and the committed-transaction queue.
///
/// All transaction operations go through the compositor because they touch
/// both: building a transaction takes holds on surfaces, and committing or
/// applying one moves the surfaces' commit chains.
///
/// ```
/// use sheaf_core::Compositor;
/// use sheaf_core::backend::StateApplier;
/// use sheaf_core::state::SurfaceState;
/// use sheaf_core::surface::{SurfaceId, SurfaceTree};
/// use sheaf_core::transaction::Transaction;
///
/// struct Frames(Vec<u32>);
///
/// impl StateApplier<SurfaceState> for Frames {
///     fn apply_state(&mut self, _: &mut SurfaceTree, _: SurfaceId, state: SurfaceState) {
///         self.0.extend(state.frame_callbacks);
///     }
/// }
///
/// let mut compositor: Compositor = Compositor::new();
/// let surface = compositor.surfaces_mut().create_surface();
/// compositor.surfaces_mut().pending_state_mut(surface).frame(7);
///
/// let mut txn = Transaction::new();
/// compositor.merge_pending_state(&mut txn, surface);
///
/// let mut frames = Frames(Vec::new());
/// let id = compositor.commit(txn, &mut frames);
/// assert_eq!(frames.0, [7]);
/// assert!(!compositor.is_pending(id));
/// ```
#[derive(Debug)]
pub struct Compositor<S = SurfaceState> {
    pub(crate) surfaces: SurfaceTree<S>,
    pub(crate) committed: CommitQueue<S>,
}

impl<S: PendingState> Default for Compositor<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PendingState> Compositor<S> {
    /// Creates a compositor with no surfaces and an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            surfaces: SurfaceTree::new(),
            committed: CommitQueue::new(),
        }
    }

    /// Returns the surface tree.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceTree<S> {
        &self.surfaces
    }

    /// Returns the surface tree for topology changes and pending-state
    /// updates.
    pub fn surfaces_mut(&mut self) -> &mut SurfaceTree<S> {
        &mut self.surfaces
    }

    /// Returns the committed-transaction queue.
    #[must_use]
    pub fn committed(&self) -> &CommitQueue<S> {
        &self.committed
    }

    // -- Building transactions --

    /// Returns the entry for `surface` in `txn`, creating it (and taking a
    /// hold on the surface) on first access.
    pub fn ensure_entry<'t>(
        &mut self,
        txn: &'t mut Transaction<S>,
        surface: SurfaceId,
    ) -> &'t TransactionEntry<S> {
        txn.ensure_entry(&mut self.surfaces, surface)
    }

    /// Sets the sub-surface position `surface` takes when `txn` applies.
    ///
    /// A later call for the same surface replaces the earlier position.
    pub fn add_subsurface_position(
        &mut self,
        txn: &mut Transaction<S>,
        surface: SurfaceId,
        x: i32,
        y: i32,
    ) {
        txn.ensure_entry(&mut self.surfaces, surface).position = Some((x, y));
    }

    /// Moves `surface`'s pending state into `txn`.
    ///
    /// The surface is left with an empty pending state. If `txn` already has
    /// a state for the surface, the pending state is merged into it.
    /// Surfaces named by the state's placement operations also get entries.
    pub fn merge_pending_state(&mut self, txn: &mut Transaction<S>, surface: SurfaceId) {
        let pending = self.surfaces.take_pending(surface);
        let placed = placement_surfaces(pending.placement_ops());

        let entry = txn.ensure_entry(&mut self.surfaces, surface);
        if let Some(into) = entry.state.as_mut() {
            pending.merge_into(into);
        } else {
            entry.state = Some(pending);
        }
        txn.ensure_entries(&mut self.surfaces, &placed);
    }

    /// Folds `from` into `to`, treating `from` as the later transaction.
    ///
    /// Entries only `from` has are moved over along with their holds. Shared
    /// entries are combined and `from`'s duplicate hold released. Fences are
    /// unioned.
    pub fn merge_into(&mut self, from: Transaction<S>, to: &mut Transaction<S>) {
        let Transaction { entries, fences } = from;
        to.fences.extend(fences);

        for (surface, entry) in entries {
            let placed = entry
                .state
                .as_ref()
                .map(|state| placement_surfaces(state.placement_ops()))
                .unwrap_or_default();
            match to.entries.entry(surface) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(mut slot) => {
                    entry.merge_into(slot.get_mut());
                    self.surfaces.release(surface);
                }
            }
            to.ensure_entries(&mut self.surfaces, &placed);
        }
    }

    /// Drops an uncommitted transaction, releasing its holds.
    pub fn discard(&mut self, txn: Transaction<S>) {
        for surface in txn.entries.into_keys() {
            self.surfaces.release(surface);
        }
    }

    // -- Commit and teardown --

    /// Commits `txn`, applying it (and anything it unblocks) right away if
    /// no older transaction is pending for any of its surfaces and it has no
    /// unsignalled fence.
    ///
    /// Returns the id under which the transaction is queued; once applied it
    /// is no longer [pending](Self::is_pending).
    pub fn commit(
        &mut self,
        txn: Transaction<S>,
        applier: &mut dyn StateApplier<S>,
    ) -> TransactionId {
        self.commit_traced(txn, applier, &mut Tracer::none())
    }

    /// Like [`commit`](Self::commit), emitting trace events.
    pub fn commit_traced(
        &mut self,
        txn: Transaction<S>,
        applier: &mut dyn StateApplier<S>,
        tracer: &mut Tracer<'_>,
    ) -> TransactionId {
        let fenced = txn.is_fenced();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "surface slots are u32-indexed and fence counts stay small"
        )]
        let (surface_count, fence_count) = (txn.len() as u32, txn.fences.len() as u32);

        let id = self.committed.push(txn);
        let mut blocked = 0_u32;
        for surface in self.committed.get(id).surfaces() {
            self.surfaces.set_last_committed(surface, Some(id));
            if self.surfaces.first_committed(surface).is_none() {
                self.surfaces.set_first_committed(surface, Some(id));
            } else {
                blocked += 1;
            }
        }

        tracer.commit(&CommitEvent {
            sequence: self.committed.sequence(id),
            surfaces: surface_count,
            blocked_surfaces: blocked,
            fences: fence_count,
        });

        if blocked == 0 && !fenced {
            self.resolve_cascade(id, applier, tracer);
        }
        id
    }

    /// Signals `fence` on the pending transaction `id`.
    ///
    /// Once the last fence is signalled the transaction applies if it heads
    /// all its commit chains; otherwise it applies when the cascade reaches
    /// it. Returns `false` if `id` is no longer pending or was not waiting on
    /// `fence`.
    pub fn signal_fence(
        &mut self,
        id: TransactionId,
        fence: FenceId,
        applier: &mut dyn StateApplier<S>,
    ) -> bool {
        self.signal_fence_traced(id, fence, applier, &mut Tracer::none())
    }

    /// Like [`signal_fence`](Self::signal_fence), emitting trace events.
    pub fn signal_fence_traced(
        &mut self,
        id: TransactionId,
        fence: FenceId,
        applier: &mut dyn StateApplier<S>,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if !self.committed.contains(id) || !self.committed.get_mut(id).fences.remove(&fence) {
            return false;
        }
        if self.is_ready(id) {
            self.resolve_cascade(id, applier, tracer);
        }
        true
    }

    /// Discards every pending transaction without applying it.
    ///
    /// Used at compositor shutdown. Holds are released and the commit chains
    /// of all named surfaces are cleared. Returns the number of transactions
    /// discarded.
    pub fn finalize(&mut self) -> usize {
        self.finalize_traced(&mut Tracer::none())
    }

    /// Like [`finalize`](Self::finalize), emitting trace events.
    pub fn finalize_traced(&mut self, tracer: &mut Tracer<'_>) -> usize {
        let mut discarded = 0_usize;
        while let Some((_, txn)) = self.committed.pop_front() {
            for surface in txn.entries.into_keys() {
                self.surfaces.set_first_committed(surface, None);
                self.surfaces.set_last_committed(surface, None);
                self.surfaces.release(surface);
            }
            discarded += 1;
        }

        #[expect(
            clippy::cast_possible_truncation,
            reason = "queue slots are u32-indexed"
        )]
        let event = FinalizeEvent {
            discarded: discarded as u32,
        };
        tracer.finalize(&event);
        discarded
    }

    // -- Queries --

    /// Returns whether `id` has been committed but not yet applied.
    #[must_use]
    pub fn is_pending(&self, id: TransactionId) -> bool {
        self.committed.contains(id)
    }

    /// Returns the commit sequence of a pending transaction.
    #[must_use]
    pub fn sequence(&self, id: TransactionId) -> Option<u64> {
        self.committed
            .contains(id)
            .then(|| self.committed.sequence(id))
    }

    /// Returns the number of pending transactions.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.committed.len()
    }

    /// Returns pending transactions, oldest first.
    pub fn pending_ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.committed.iter()
    }
}
