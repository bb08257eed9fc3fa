// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract between the transaction engine and the rest of the compositor.
//!
//! The engine decides *when* and *in what order* states become visible. What
//! "visible" means (buffer swap, damage accumulation, scene-graph updates) is
//! up to a [`StateApplier`] supplied by the caller on every
//! [`commit`](crate::Compositor::commit).
//!
//! # Call order within one transaction
//!
//! ```text
//!   pass one, ancestors first:
//!     for each surface:  write position override
//!                        apply_state(surface, state)        (if it has one)
//!   pass two, descendants first:
//!     for each surface with a state:
//!                        sync_child_states(surface)
//!                          └─► sync_actor_state(sub-surface) for each child
//! ```
//!
//! Pass two starts only after every state in the transaction has been
//! applied, so actor syncing always sees the transaction's final tree.

use crate::state::PendingState;
use crate::surface::{SurfaceId, SurfaceTree};

/// Makes committed states visible.
///
/// Only [`apply_state`](Self::apply_state) is required. A typical applier
/// stores the state as the surface's current state, restacks sub-surfaces via
/// [`SurfaceTree::apply_placement_ops`], and schedules a repaint.
pub trait StateApplier<S> {
    /// Applies `state` to `surface`.
    ///
    /// The surface may be defunct (destroyed by its client while the
    /// transaction was pending); its handle is still valid for the duration
    /// of this call.
    fn apply_state(&mut self, surfaces: &mut SurfaceTree<S>, surface: SurfaceId, state: S);

    /// Propagates the visual state of one sub-surface to its rendering
    /// representation.
    fn sync_actor_state(&mut self, surfaces: &SurfaceTree<S>, surface: SurfaceId) {
        _ = (surfaces, surface);
    }

    /// Syncs the actor state of every immediate sub-surface of `surface`.
    ///
    /// Called bottom-up for each surface that had a state applied.
    fn sync_child_states(&mut self, surfaces: &SurfaceTree<S>, surface: SurfaceId)
    where
        S: PendingState,
    {
        for child in surfaces.subsurfaces(surface) {
            self.sync_actor_state(surfaces, child);
        }
    }
}
