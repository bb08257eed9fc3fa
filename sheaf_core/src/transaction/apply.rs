// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The apply/cascade engine.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::id::TransactionId;
use crate::Compositor;
use crate::backend::StateApplier;
use crate::state::PendingState;
use crate::surface::SurfaceId;
use crate::trace::{ApplyEvent, CascadeEvent, Tracer};

/// Transactions to re-examine for readiness, lowest commit sequence first.
///
/// Owned by a single cascade run.
#[derive(Debug, Default)]
struct Candidates {
    by_sequence: BTreeMap<u64, TransactionId>,
}

impl Candidates {
    fn insert(&mut self, sequence: u64, id: TransactionId) {
        self.by_sequence.entry(sequence).or_insert(id);
    }

    fn pop(&mut self) -> Option<TransactionId> {
        self.by_sequence.pop_first().map(|(_, id)| id)
    }
}

impl<S: PendingState> Compositor<S> {
    /// Applies `first` and every transaction it unblocks, in commit order.
    ///
    /// `first` must be ready. Runs iteratively, so the stack depth does not
    /// grow with the length of a dependency chain.
    pub(crate) fn resolve_cascade(
        &mut self,
        first: TransactionId,
        applier: &mut dyn StateApplier<S>,
        tracer: &mut Tracer<'_>,
    ) {
        let initial_sequence = self.committed.sequence(first);
        let mut candidates = Candidates::default();
        candidates.insert(initial_sequence, first);

        let mut applied = 0_u32;
        let mut skipped = 0_u32;
        while let Some(id) = candidates.pop() {
            if !self.is_ready(id) {
                skipped += 1;
                continue;
            }
            self.apply_one(id, applied, &mut candidates, applier, tracer);
            applied += 1;
        }

        tracer.cascade(&CascadeEvent {
            initial_sequence,
            applied,
            skipped,
        });
    }

    /// Returns whether `id` has no unsignalled fence and heads the commit
    /// chain of every surface it names.
    pub(crate) fn is_ready(&self, id: TransactionId) -> bool {
        let txn = self.committed.get(id);
        !txn.is_fenced()
            && txn
                .surfaces()
                .all(|surface| self.surfaces.first_committed(surface) == Some(id))
    }

    fn apply_one(
        &mut self,
        id: TransactionId,
        cascade_index: u32,
        candidates: &mut Candidates,
        applier: &mut dyn StateApplier<S>,
        tracer: &mut Tracer<'_>,
    ) {
        let sequence = self.committed.sequence(id);
        let entries = core::mem::take(&mut self.committed.get_mut(id).entries);
        let mut entries: Vec<_> = entries.into_iter().collect();
        let surfaces = &self.surfaces;
        entries.sort_by_cached_key(|(surface, _)| {
            (surfaces.toplevel(*surface), surfaces.depth(*surface))
        });

        #[expect(
            clippy::cast_possible_truncation,
            reason = "surface slots are u32-indexed, so a transaction names at most u32::MAX"
        )]
        let (surface_count, state_count) = (
            entries.len() as u32,
            entries.iter().filter(|(_, e)| e.state.is_some()).count() as u32,
        );
        tracer.apply(&ApplyEvent {
            sequence,
            surfaces: surface_count,
            states: state_count,
            cascade_index,
        });

        let mut touched = Vec::with_capacity(entries.len());
        let mut with_state = Vec::new();
        for (surface, entry) in entries {
            if let Some((x, y)) = entry.position {
                self.surfaces.set_position(surface, x, y);
            }
            #[cfg(feature = "trace-rich")]
            tracer.surface_apply(&crate::trace::SurfaceApplyEvent {
                sequence,
                surface_index: surface.index(),
                position: entry.position,
                had_state: entry.state.is_some(),
            });
            if let Some(state) = entry.state {
                self.surfaces.mark_content(surface);
                applier.apply_state(&mut self.surfaces, surface, state);
                with_state.push(surface);
            }
            self.advance_chain(id, surface, candidates);
            touched.push(surface);
        }

        for &surface in with_state.iter().rev() {
            #[cfg(feature = "trace-rich")]
            tracer.actor_sync(&crate::trace::ActorSyncEvent {
                sequence,
                surface_index: surface.index(),
            });
            applier.sync_child_states(&self.surfaces, surface);
        }

        let _ = self.committed.remove(id);
        for surface in touched {
            self.surfaces.release(surface);
        }
    }

    /// Moves `surface`'s chain head past `id`, registering the new head as a
    /// candidate.
    fn advance_chain(
        &mut self,
        id: TransactionId,
        surface: SurfaceId,
        candidates: &mut Candidates,
    ) {
        let last = self.surfaces.last_committed(surface);
        if last == Some(id) {
            self.surfaces.set_first_committed(surface, None);
            self.surfaces.set_last_committed(surface, None);
            return;
        }
        assert_eq!(
            self.surfaces.first_committed(surface),
            Some(id),
            "{id:?} applied out of turn for {surface:?}"
        );
        let Some(next) = self.committed.find_next_for_surface(id, surface, last) else {
            panic!("commit chain of {surface:?} ends before its last_committed {last:?}");
        };
        self.surfaces.set_first_committed(surface, Some(next));
        candidates.insert(self.committed.sequence(next), next);
    }
}
