// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays surface storage with allocation, topology, and commit-chain
//! bookkeeping.

use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, SurfaceId};
use super::traverse::{Ancestors, Subsurfaces};
use crate::dirty;
use crate::state::{Placement, PendingState, PlacementOp, SurfaceState};
use crate::transaction::TransactionId;

/// Struct-of-arrays storage for all surfaces.
///
/// Surfaces are addressed by [`SurfaceId`] handles. Each surface occupies a
/// slot in parallel arrays. Freed slots are recycled via a free list, and
/// generation counters prevent stale handle access.
///
/// # Holds
///
/// A transaction that mentions a surface takes a *hold* on it. A surface
/// destroyed by its client while held becomes *defunct*: it leaves the tree,
/// but its slot (and therefore its handle) stays valid until the last hold is
/// released, so deferred transactions can still apply to it.
#[derive(Debug)]
pub struct SurfaceTree<S = SurfaceState> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Sub-surface placement --
    pub(crate) position: Vec<(i32, i32)>,
    pub(crate) world_position: Vec<(i32, i32)>,

    // -- Double-buffered state --
    pub(crate) pending: Vec<S>,

    // -- Commit chain --
    pub(crate) first_committed: Vec<Option<TransactionId>>,
    pub(crate) last_committed: Vec<Option<TransactionId>>,

    // -- Allocation --
    pub(crate) holds: Vec<u32>,
    pub(crate) defunct: Vec<bool>,
    pub(crate) generation: Vec<u32>,
    pub(crate) freed: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl<S: PendingState> Default for SurfaceTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PendingState> SurfaceTree<S> {
    /// Creates an empty surface tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            position: Vec::new(),
            world_position: Vec::new(),
            pending: Vec::new(),
            first_committed: Vec::new(),
            last_committed: Vec::new(),
            holds: Vec::new(),
            defunct: Vec::new(),
            generation: Vec::new(),
            freed: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new surface and returns its handle.
    ///
    /// The surface starts with no parent, position `(0, 0)`, an empty pending
    /// state, and an empty commit chain.
    pub fn create_surface(&mut self) -> SurfaceId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped when it was freed.
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.position[idx as usize] = (0, 0);
            self.world_position[idx as usize] = (0, 0);
            self.pending[idx as usize] = S::default();
            self.first_committed[idx as usize] = None;
            self.last_committed[idx as usize] = None;
            self.holds[idx as usize] = 0;
            self.defunct[idx as usize] = false;
            self.freed[idx as usize] = false;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.position.push((0, 0));
            self.world_position.push((0, 0));
            self.pending.push(S::default());
            self.first_committed.push(None);
            self.last_committed.push(None);
            self.holds.push(0);
            self.defunct.push(false);
            self.generation.push(0);
            self.freed.push(false);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        SurfaceId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a surface on behalf of its client.
    ///
    /// The surface is detached from its parent, and its sub-surfaces are
    /// detached from it and become roots. If no transaction holds it, the
    /// slot is freed immediately; otherwise the surface becomes defunct and
    /// is freed when the last hold is released.
    ///
    /// # Panics
    ///
    /// Panics if the surface was already destroyed or the handle is stale.
    pub fn destroy_surface(&mut self, id: SurfaceId) {
        self.validate(id);
        let idx = id.idx;
        assert!(!self.defunct[idx as usize], "surface already destroyed");

        while self.first_child[idx as usize] != INVALID {
            let child = self.first_child[idx as usize];
            self.unlink_from_parent(child);
            self.dirty.remove_dependency(child, idx, dirty::POSITION);
            self.dirty.mark_with(child, dirty::POSITION, &EagerPolicy);
            self.traversal_dirty = true;
        }

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.remove_dependency(idx, p, dirty::POSITION);
            self.dirty.mark(p, dirty::TOPOLOGY);
            self.traversal_dirty = true;
        }

        if self.holds[idx as usize] == 0 {
            self.free_slot(idx);
        } else {
            self.defunct[idx as usize] = true;
            self.traversal_dirty = true;
            self.dirty.mark(idx, dirty::TOPOLOGY);
        }
    }

    /// Returns whether the handle refers to a surface its client has not
    /// destroyed.
    #[must_use]
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        self.is_valid(id) && !self.defunct[id.idx as usize]
    }

    /// Returns whether the surface was destroyed by its client but is still
    /// held by a pending transaction.
    #[must_use]
    pub fn is_defunct(&self, id: SurfaceId) -> bool {
        self.is_valid(id) && self.defunct[id.idx as usize]
    }

    /// Returns how many transactions currently hold the surface.
    #[must_use]
    pub fn hold_count(&self, id: SurfaceId) -> u32 {
        self.validate(id);
        self.holds[id.idx as usize]
    }

    // -- Topology API --

    /// Makes `child` a sub-surface of `parent`, stacked topmost.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `child` already has a parent, or
    /// `child` is `parent` or one of its ancestors.
    pub fn add_subsurface(&mut self, parent: SurfaceId, child: SurfaceId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "surface already has a parent"
        );
        assert!(
            p != c && !self.is_ancestor(child, parent),
            "sub-surface would create a cycle"
        );

        self.link_before(c, p, INVALID);

        let _ = self.dirty.add_dependency(c, p, dirty::POSITION);
        self.dirty.mark_with(c, dirty::POSITION, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Detaches a sub-surface from its parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the surface has no parent.
    pub fn remove_subsurface(&mut self, child: SurfaceId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "surface has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::POSITION);

        self.dirty.mark_with(c, dirty::POSITION, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Restacks a sub-surface according to a placement request.
    ///
    /// Requests are ignored when `op.surface` has no parent, or when the named
    /// sibling is not a sibling of `op.surface` (any more). Either side may
    /// name a surface that has since been freed; such requests are ignored
    /// too.
    pub fn place(&mut self, op: &PlacementOp) {
        if !self.is_valid(op.surface) {
            return;
        }
        let s = op.surface.idx;
        let p = self.parent[s as usize];
        if p == INVALID {
            return;
        }

        match op.sibling {
            Some(sibling) => {
                if !self.is_valid(sibling) {
                    return;
                }
                let sib = sibling.idx;
                if sib == s || self.parent[sib as usize] != p {
                    return;
                }
                self.unlink_from_parent(s);
                let next = match op.placement {
                    Placement::Above => self.next_sibling[sib as usize],
                    Placement::Below => sib,
                };
                self.link_before(s, p, next);
            }
            None => {
                self.unlink_from_parent(s);
                let next = match op.placement {
                    Placement::Above => INVALID,
                    Placement::Below => self.first_child[p as usize],
                };
                self.link_before(s, p, next);
            }
        }

        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Applies a sequence of placement requests in order.
    pub fn apply_placement_ops(&mut self, ops: &[PlacementOp]) {
        for op in ops {
            self.place(op);
        }
    }

    /// Returns the parent of a surface, if it is a sub-surface.
    #[must_use]
    pub fn parent(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.handle(p))
        }
    }

    /// Returns the root of the tree containing `id` (itself if it has no
    /// parent).
    #[must_use]
    pub fn toplevel(&self, id: SurfaceId) -> SurfaceId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Returns the number of ancestors of `id`.
    #[must_use]
    pub fn depth(&self, id: SurfaceId) -> u32 {
        let mut depth = 0;
        for _ in self.ancestors(id) {
            depth += 1;
        }
        depth
    }

    /// Returns whether `ancestor` is a strict ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: SurfaceId, descendant: SurfaceId) -> bool {
        self.ancestors(descendant).any(|a| a == ancestor)
    }

    /// Returns an iterator over the immediate sub-surfaces of a surface,
    /// bottom of the stack first.
    #[must_use]
    pub fn subsurfaces(&self, id: SurfaceId) -> Subsurfaces<'_, S> {
        self.validate(id);
        Subsurfaces::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the strict ancestors of a surface, nearest
    /// first.
    #[must_use]
    pub fn ancestors(&self, id: SurfaceId) -> Ancestors<'_, S> {
        self.validate(id);
        Ancestors::new(self, self.parent[id.idx as usize])
    }

    /// Returns the live surfaces that have no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<SurfaceId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID
                && !self.defunct[idx as usize]
                && !self.freed[idx as usize]
            {
                roots.push(self.handle(idx));
            }
        }
        roots
    }

    // -- Property access --

    /// Returns the live sub-surface position of a surface, relative to its
    /// parent.
    #[must_use]
    pub fn position(&self, id: SurfaceId) -> (i32, i32) {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the computed position relative to the surface's toplevel.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_position(&self, id: SurfaceId) -> (i32, i32) {
        self.validate(id);
        self.world_position[id.idx as usize]
    }

    /// Returns the state accumulated since the surface's last commit.
    #[must_use]
    pub fn pending_state(&self, id: SurfaceId) -> &S {
        self.validate(id);
        &self.pending[id.idx as usize]
    }

    /// Returns the pending state for mutation by the protocol layer.
    pub fn pending_state_mut(&mut self, id: SurfaceId) -> &mut S {
        self.validate(id);
        &mut self.pending[id.idx as usize]
    }

    /// Returns the oldest committed transaction still pending for this
    /// surface. This is always the next transaction to apply to it.
    #[must_use]
    pub fn first_committed(&self, id: SurfaceId) -> Option<TransactionId> {
        self.validate(id);
        self.first_committed[id.idx as usize]
    }

    /// Returns the newest committed transaction still pending for this
    /// surface.
    #[must_use]
    pub fn last_committed(&self, id: SurfaceId) -> Option<TransactionId> {
        self.validate(id);
        self.last_committed[id.idx as usize]
    }

    /// Returns the computed world position at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_position_at(&self, idx: u32) -> (i32, i32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_position[idx as usize]
    }

    // -- Crate-internal mutation (transaction engine only) --

    /// Writes the live sub-surface position, marking the sub-tree moved.
    pub(crate) fn set_position(&mut self, id: SurfaceId, x: i32, y: i32) {
        self.validate(id);
        if self.position[id.idx as usize] == (x, y) {
            return;
        }
        self.position[id.idx as usize] = (x, y);
        self.dirty.mark_with(id.idx, dirty::POSITION, &EagerPolicy);
    }

    /// Marks that a state snapshot was applied to the surface.
    pub(crate) fn mark_content(&mut self, id: SurfaceId) {
        self.validate(id);
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Moves the pending state out, leaving an empty one to accumulate into.
    pub(crate) fn take_pending(&mut self, id: SurfaceId) -> S {
        self.validate(id);
        core::mem::take(&mut self.pending[id.idx as usize])
    }

    pub(crate) fn set_first_committed(&mut self, id: SurfaceId, txn: Option<TransactionId>) {
        self.validate(id);
        self.first_committed[id.idx as usize] = txn;
    }

    pub(crate) fn set_last_committed(&mut self, id: SurfaceId, txn: Option<TransactionId>) {
        self.validate(id);
        self.last_committed[id.idx as usize] = txn;
    }

    /// Takes a strong reference on behalf of a transaction.
    pub(crate) fn hold(&mut self, id: SurfaceId) {
        self.validate(id);
        self.holds[id.idx as usize] += 1;
    }

    /// Drops a strong reference, freeing a defunct surface on the last one.
    pub(crate) fn release(&mut self, id: SurfaceId) {
        self.validate(id);
        let idx = id.idx as usize;
        assert!(self.holds[idx] > 0, "released an unheld surface: {id:?}");
        self.holds[idx] -= 1;
        if self.holds[idx] == 0 && self.defunct[idx] {
            self.free_slot(id.idx);
        }
    }

    // -- Internal helpers --

    /// Returns whether the handle matches a slot that has not been freed.
    ///
    /// Freeing bumps the generation, so the generation check alone rejects
    /// freed slots.
    pub(crate) fn is_valid(&self, id: SurfaceId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: SurfaceId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale SurfaceId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn handle(&self, idx: u32) -> SurfaceId {
        SurfaceId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Releases a slot for reuse and invalidates outstanding handles.
    fn free_slot(&mut self, idx: u32) {
        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.pending[idx as usize] = S::default();
        self.first_committed[idx as usize] = None;
        self.last_committed[idx as usize] = None;
        self.defunct[idx as usize] = false;
        self.freed[idx as usize] = true;
        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Links `idx` into `p`'s sub-surface list directly before `next`, or at
    /// the top of the stack if `next` is [`INVALID`].
    fn link_before(&mut self, idx: u32, p: u32, next: u32) {
        self.parent[idx as usize] = p;
        if next == INVALID {
            self.next_sibling[idx as usize] = INVALID;
            if self.first_child[p as usize] == INVALID {
                self.prev_sibling[idx as usize] = INVALID;
                self.first_child[p as usize] = idx;
            } else {
                let mut last = self.first_child[p as usize];
                while self.next_sibling[last as usize] != INVALID {
                    last = self.next_sibling[last as usize];
                }
                self.next_sibling[last as usize] = idx;
                self.prev_sibling[idx as usize] = last;
            }
            return;
        }

        let prev = self.prev_sibling[next as usize];
        self.next_sibling[idx as usize] = next;
        self.prev_sibling[idx as usize] = prev;
        if prev != INVALID {
            self.next_sibling[prev as usize] = idx;
        } else {
            self.first_child[p as usize] = idx;
        }
        self.prev_sibling[next as usize] = idx;
    }

    /// Removes `idx` from its parent's sub-surface list without touching
    /// dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn tree() -> SurfaceTree {
        SurfaceTree::new()
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = tree();
        let id = tree.create_surface();
        assert!(tree.is_alive(id));
        tree.destroy_surface(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = tree();
        let id1 = tree.create_surface();
        tree.destroy_surface(id1);
        let id2 = tree.create_surface();
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn held_surface_outlives_destroy() {
        let mut tree = tree();
        let id = tree.create_surface();
        tree.hold(id);
        tree.destroy_surface(id);
        assert!(!tree.is_alive(id));
        assert!(tree.is_defunct(id));
        // The handle still resolves while held.
        assert_eq!(tree.position(id), (0, 0));

        tree.release(id);
        assert!(!tree.is_defunct(id));
        let reused = tree.create_surface();
        assert_eq!(reused.idx, id.idx);
        assert_ne!(reused.generation, id.generation);
    }

    #[test]
    fn add_subsurface_and_query() {
        let mut tree = tree();
        let parent = tree.create_surface();
        let a = tree.create_surface();
        let b = tree.create_surface();

        tree.add_subsurface(parent, a);
        tree.add_subsurface(parent, b);

        assert_eq!(tree.parent(a), Some(parent));
        let kids: Vec<_> = tree.subsurfaces(parent).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn toplevel_depth_and_ancestry() {
        let mut tree = tree();
        let root = tree.create_surface();
        let child = tree.create_surface();
        let grandchild = tree.create_surface();
        tree.add_subsurface(root, child);
        tree.add_subsurface(child, grandchild);

        assert_eq!(tree.toplevel(grandchild), root);
        assert_eq!(tree.toplevel(root), root);
        assert_eq!(tree.depth(root), 0);
        assert_eq!(tree.depth(grandchild), 2);
        assert!(tree.is_ancestor(root, grandchild));
        assert!(!tree.is_ancestor(grandchild, root));
        assert!(!tree.is_ancestor(child, child));
        let chain: Vec<_> = tree.ancestors(grandchild).collect();
        assert_eq!(chain, vec![child, root]);
    }

    #[test]
    fn remove_subsurface_works() {
        let mut tree = tree();
        let parent = tree.create_surface();
        let child = tree.create_surface();
        tree.add_subsurface(parent, child);

        tree.remove_subsurface(child);
        assert_eq!(tree.parent(child), None);
        assert!(tree.subsurfaces(parent).next().is_none());
    }

    #[test]
    fn place_relative_to_sibling() {
        let mut tree = tree();
        let parent = tree.create_surface();
        let a = tree.create_surface();
        let b = tree.create_surface();
        let c = tree.create_surface();
        tree.add_subsurface(parent, a);
        tree.add_subsurface(parent, b);
        tree.add_subsurface(parent, c);

        tree.place(&PlacementOp {
            surface: c,
            sibling: Some(a),
            placement: Placement::Below,
        });
        assert_eq!(tree.subsurfaces(parent).collect::<Vec<_>>(), vec![c, a, b]);

        tree.place(&PlacementOp {
            surface: c,
            sibling: Some(a),
            placement: Placement::Above,
        });
        assert_eq!(tree.subsurfaces(parent).collect::<Vec<_>>(), vec![a, c, b]);

        tree.place(&PlacementOp {
            surface: a,
            sibling: Some(b),
            placement: Placement::Above,
        });
        assert_eq!(tree.subsurfaces(parent).collect::<Vec<_>>(), vec![c, b, a]);
    }

    #[test]
    fn place_without_sibling_moves_to_stack_ends() {
        let mut tree = tree();
        let parent = tree.create_surface();
        let a = tree.create_surface();
        let b = tree.create_surface();
        tree.add_subsurface(parent, a);
        tree.add_subsurface(parent, b);

        tree.apply_placement_ops(&[PlacementOp {
            surface: a,
            sibling: None,
            placement: Placement::Above,
        }]);
        assert_eq!(tree.subsurfaces(parent).collect::<Vec<_>>(), vec![b, a]);

        tree.apply_placement_ops(&[PlacementOp {
            surface: a,
            sibling: None,
            placement: Placement::Below,
        }]);
        assert_eq!(tree.subsurfaces(parent).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn place_ignores_non_siblings() {
        let mut tree = tree();
        let p1 = tree.create_surface();
        let p2 = tree.create_surface();
        let a = tree.create_surface();
        let b = tree.create_surface();
        let c = tree.create_surface();
        tree.add_subsurface(p1, a);
        tree.add_subsurface(p1, b);
        tree.add_subsurface(p2, c);

        tree.place(&PlacementOp {
            surface: a,
            sibling: Some(c),
            placement: Placement::Above,
        });
        assert_eq!(tree.subsurfaces(p1).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.parent(a), Some(p1));
    }

    #[test]
    fn roots_skip_subsurfaces_and_defunct() {
        let mut tree = tree();
        let a = tree.create_surface();
        let b = tree.create_surface();
        let c = tree.create_surface();
        let d = tree.create_surface();
        tree.add_subsurface(a, c);
        tree.hold(d);
        tree.destroy_surface(d);

        let roots = tree.roots();
        assert!(roots.contains(&a));
        assert!(roots.contains(&b));
        assert!(!roots.contains(&c));
        assert!(!roots.contains(&d));
    }

    #[test]
    fn take_pending_leaves_fresh_state() {
        let mut tree = tree();
        let id = tree.create_surface();
        tree.pending_state_mut(id).frame(7);
        let taken = tree.take_pending(id);
        assert_eq!(taken.frame_callbacks, vec![7]);
        assert!(tree.pending_state(id).is_empty());
    }

    #[test]
    fn destroy_detaches_subsurfaces() {
        let mut tree = tree();
        let parent = tree.create_surface();
        let a = tree.create_surface();
        let b = tree.create_surface();
        tree.add_subsurface(parent, a);
        tree.add_subsurface(parent, b);
        tree.set_position(a, 4, 4);
        tree.destroy_surface(parent);

        assert!(!tree.is_alive(parent));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), None);
        let roots = tree.roots();
        assert!(roots.contains(&a));
        assert!(roots.contains(&b));

        // Detached surfaces can be re-parented.
        let other = tree.create_surface();
        tree.add_subsurface(other, a);
        assert_eq!(tree.subsurfaces(other).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn place_ignores_freed_surfaces() {
        let mut tree = tree();
        let parent = tree.create_surface();
        let low = tree.create_surface();
        let high = tree.create_surface();
        tree.add_subsurface(parent, low);
        tree.add_subsurface(parent, high);
        tree.remove_subsurface(high);
        tree.destroy_surface(high);

        tree.place(&PlacementOp {
            surface: low,
            sibling: Some(high),
            placement: Placement::Above,
        });
        tree.place(&PlacementOp {
            surface: high,
            sibling: None,
            placement: Placement::Below,
        });
        assert_eq!(tree.subsurfaces(parent).collect::<Vec<_>>(), vec![low]);

        // A recycled slot does not revive the old handle.
        let fresh = tree.create_surface();
        assert_eq!(fresh.idx, high.idx);
        tree.add_subsurface(parent, fresh);
        tree.place(&PlacementOp {
            surface: low,
            sibling: Some(high),
            placement: Placement::Above,
        });
        assert_eq!(
            tree.subsurfaces(parent).collect::<Vec<_>>(),
            vec![low, fresh]
        );
    }

    #[test]
    fn roots_skip_freed_slots() {
        let mut tree = tree();
        let a = tree.create_surface();
        let b = tree.create_surface();
        tree.destroy_surface(a);
        assert_eq!(tree.roots(), vec![b]);

        let c = tree.create_surface();
        assert_eq!(c.idx, a.idx);
        assert_eq!(tree.roots(), vec![c, b]);
    }

    #[test]
    #[should_panic(expected = "sub-surface would create a cycle")]
    fn cycle_panics() {
        let mut tree = tree();
        let a = tree.create_surface();
        let b = tree.create_surface();
        tree.add_subsurface(a, b);
        tree.add_subsurface(b, a);
    }

    #[test]
    #[should_panic(expected = "stale SurfaceId")]
    fn destroyed_handle_panics_on_position() {
        let mut tree = tree();
        let id = tree.create_surface();
        tree.destroy_surface(id);
        let _ = tree.position(id);
    }

    #[test]
    #[should_panic(expected = "released an unheld surface")]
    fn unbalanced_release_panics() {
        let mut tree = tree();
        let id = tree.create_surface();
        tree.release(id);
    }
}
