// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual change collection after transactions apply.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **POSITION**: drain dirty indices and recompute each surface's
//!    `world_position` as `parent_world + position`.
//! 2. **CONTENT**: drain dirty indices (no recomputation; renderers read
//!    whatever their [`StateApplier`](crate::backend::StateApplier) stored).
//! 3. **TOPOLOGY**: drain and discard (the traversal order was already
//!    rebuilt at the start of evaluation if needed).
//!
//! [`SurfaceChanges`] uses raw slot indices (`u32`) so renderers can index
//! straight into per-slot arrays via accessors such as
//! [`world_position_at`](super::SurfaceTree::world_position_at).

use alloc::vec::Vec;

use super::id::INVALID;
use super::tree::SurfaceTree;
use crate::dirty;
use crate::state::PendingState;

/// The set of changes produced by a single [`SurfaceTree::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct SurfaceChanges {
    /// Surfaces whose world position was recomputed.
    pub moved: Vec<u32>,
    /// Surfaces that had a state snapshot applied.
    pub content: Vec<u32>,
    /// Surfaces created since the last evaluate.
    pub added: Vec<u32>,
    /// Surface slots freed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology or stacking changed (traversal order was
    /// rebuilt).
    pub topology_changed: bool,
}

impl SurfaceChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.moved.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl<S: PendingState> SurfaceTree<S> {
    /// Collects the visual changes made since the last call.
    ///
    /// Rebuilds the traversal order if topology changed, then drains each
    /// dirty channel and recomputes world positions in parent-before-child
    /// order.
    pub fn evaluate(&mut self) -> SurfaceChanges {
        let mut changes = SurfaceChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SurfaceChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let moved: Vec<u32> = self
            .dirty
            .drain(dirty::POSITION)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &moved {
            let parent_idx = self.parent[idx as usize];
            let (px, py) = if parent_idx != INVALID {
                self.world_position[parent_idx as usize]
            } else {
                (0, 0)
            };
            let (x, y) = self.position[idx as usize];
            self.world_position[idx as usize] = (px + x, py + y);
        }
        changes.moved = moved;

        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current paint order: depth-first pre-order, each parent
    /// before its sub-surfaces, sub-surfaces bottom to top.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        let mut stack = Vec::new();
        for root in 0..self.len {
            if self.parent[root as usize] != INVALID
                || self.defunct[root as usize]
                || self.freed[root as usize]
            {
                continue;
            }
            stack.push(root);
            while let Some(idx) = stack.pop() {
                self.traversal_order.push(idx);
                // Push children top-first so the bottom one is visited next.
                let mut child = self.first_child[idx as usize];
                let first = stack.len();
                while child != INVALID {
                    stack.push(child);
                    child = self.next_sibling[child as usize];
                }
                stack[first..].reverse();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Placement, PlacementOp};

    #[test]
    fn evaluate_computes_world_positions() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let root = tree.create_surface();
        let child = tree.create_surface();
        let grandchild = tree.create_surface();
        tree.add_subsurface(root, child);
        tree.add_subsurface(child, grandchild);

        tree.set_position(child, 10, 0);
        tree.set_position(grandchild, 0, 5);
        let changes = tree.evaluate();

        assert!(changes.moved.contains(&grandchild.idx));
        assert_eq!(tree.world_position(root), (0, 0));
        assert_eq!(tree.world_position(child), (10, 0));
        assert_eq!(tree.world_position(grandchild), (10, 5));
    }

    #[test]
    fn moving_parent_moves_descendants() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let root = tree.create_surface();
        let child = tree.create_surface();
        let grandchild = tree.create_surface();
        tree.add_subsurface(root, child);
        tree.add_subsurface(child, grandchild);
        tree.set_position(grandchild, 1, 1);
        let _ = tree.evaluate();

        tree.set_position(child, 20, 30);
        let changes = tree.evaluate();
        assert!(changes.moved.contains(&child.idx));
        assert!(changes.moved.contains(&grandchild.idx));
        assert!(!changes.moved.contains(&root.idx));
        assert_eq!(tree.world_position(grandchild), (21, 31));
    }

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let _root = tree.create_surface();
        let _ = tree.evaluate();

        let changes = tree.evaluate();
        assert!(changes.is_empty());
    }

    #[test]
    fn unchanged_position_is_not_reported() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let root = tree.create_surface();
        let child = tree.create_surface();
        tree.add_subsurface(root, child);
        tree.set_position(child, 4, 4);
        let _ = tree.evaluate();

        tree.set_position(child, 4, 4);
        assert!(tree.evaluate().moved.is_empty());
    }

    #[test]
    fn content_marks_are_local() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let root = tree.create_surface();
        let child = tree.create_surface();
        tree.add_subsurface(root, child);
        let _ = tree.evaluate();

        tree.mark_content(root);
        let changes = tree.evaluate();
        assert_eq!(changes.content, [root.idx]);
    }

    #[test]
    fn traversal_order_follows_stacking() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let a = tree.create_surface();
        let b = tree.create_surface();
        let c = tree.create_surface();
        let d = tree.create_surface();

        // Tree: a -> [b -> [d], c]
        tree.add_subsurface(a, b);
        tree.add_subsurface(a, c);
        tree.add_subsurface(b, d);
        let _ = tree.evaluate();
        assert_eq!(tree.traversal_order(), &[a.idx, b.idx, d.idx, c.idx]);

        tree.place(&PlacementOp {
            surface: b,
            sibling: None,
            placement: Placement::Above,
        });
        let changes = tree.evaluate();
        assert!(changes.topology_changed);
        assert_eq!(tree.traversal_order(), &[a.idx, c.idx, b.idx, d.idx]);
    }

    #[test]
    fn evaluate_added_and_removed_lifecycle() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let id = tree.create_surface();

        let changes = tree.evaluate();
        assert!(changes.added.contains(&id.idx));
        assert!(changes.removed.is_empty());

        let changes = tree.evaluate();
        assert!(changes.added.is_empty());

        tree.destroy_surface(id);
        let changes = tree.evaluate();
        assert!(changes.removed.contains(&id.idx));
    }

    #[test]
    fn defunct_surface_is_removed_on_last_release() {
        let mut tree: SurfaceTree = SurfaceTree::new();
        let id = tree.create_surface();
        tree.hold(id);
        let _ = tree.evaluate();

        tree.destroy_surface(id);
        let changes = tree.evaluate();
        assert!(changes.removed.is_empty());
        assert!(!tree.traversal_order().contains(&id.idx));

        tree.release(id);
        let changes = tree.evaluate();
        assert!(changes.removed.contains(&id.idx));
    }
}
