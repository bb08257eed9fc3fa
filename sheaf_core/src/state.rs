// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered pending surface state.
//!
//! Clients mutate a surface's *pending* state between commits. The transaction
//! engine never looks inside a state beyond two things: how to fold a later
//! state into an earlier one ([`PendingState::merge_into`]), and which
//! sub-surface placement operations it carries
//! ([`PendingState::placement_ops`]), since every surface named by a restack
//! request must take part in ordering and dependency tracking.
//!
//! [`SurfaceState`] is the reference state type used by default throughout
//! the crate. Fields fall into two groups:
//!
//! - **Overwrite** fields (buffer attachment, scale, transform, regions) take
//!   the value from the later state whenever the later state set them.
//! - **Accumulate** fields (damage, frame callbacks, placement ops) are
//!   appended, so nothing recorded on either side is lost.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::surface::SurfaceId;

/// Accumulated, not-yet-applied state for one surface.
///
/// `Default` produces the empty state; resetting a state is
/// `core::mem::take`.
pub trait PendingState: Default {
    /// Folds `self` (the later state) into `into` (the earlier state).
    ///
    /// This is a combine, not an overwrite: fields `self` did not set keep
    /// their value in `into`, and accumulating fields are appended.
    fn merge_into(self, into: &mut Self);

    /// Returns the sub-surface placement operations recorded in this state.
    fn placement_ops(&self) -> &[PlacementOp];
}

/// Where a restacked sub-surface goes relative to its reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Directly above the reference.
    Above,
    /// Directly below the reference.
    Below,
}

/// A sub-surface restack request.
///
/// With a `sibling`, `surface` is moved directly above or below it. Without
/// one, `surface` is moved to the top ([`Placement::Above`]) or bottom
/// ([`Placement::Below`]) of its parent's sub-surface stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacementOp {
    /// The sub-surface being restacked.
    pub surface: SurfaceId,
    /// The sibling it is placed relative to, if any.
    pub sibling: Option<SurfaceId>,
    /// Above or below.
    pub placement: Placement,
}

/// An opaque client buffer reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// A buffer attach request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferAttach {
    /// The attached buffer, or `None` to detach (unmap) the surface.
    pub buffer: Option<BufferId>,
    /// Offset of the new buffer relative to the current one.
    pub offset: Vec2,
}

/// Buffer content transform, as in `wl_output.transform`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferTransform {
    /// No transform.
    #[default]
    Normal,
    /// 90 degrees counter-clockwise.
    Rotate90,
    /// 180 degrees.
    Rotate180,
    /// 270 degrees counter-clockwise.
    Rotate270,
    /// Flipped around the vertical axis.
    Flipped,
    /// Flipped, then rotated 90 degrees.
    Flipped90,
    /// Flipped, then rotated 180 degrees.
    Flipped180,
    /// Flipped, then rotated 270 degrees.
    Flipped270,
}

/// Reference pending state for a Wayland surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceState {
    /// Latest buffer attach, if any was requested.
    pub attach: Option<BufferAttach>,
    /// Latest buffer scale, if set.
    pub scale: Option<i32>,
    /// Latest buffer transform, if set.
    pub transform: Option<BufferTransform>,
    /// Latest input region, if set. `Some(None)` resets to infinite.
    pub input_region: Option<Option<Vec<Rect>>>,
    /// Latest opaque region, if set. `Some(None)` resets to empty.
    pub opaque_region: Option<Option<Vec<Rect>>>,
    /// Damage in surface-local coordinates.
    pub surface_damage: Vec<Rect>,
    /// Damage in buffer coordinates.
    pub buffer_damage: Vec<Rect>,
    /// Frame callback ids, in request order.
    pub frame_callbacks: Vec<u32>,
    /// Sub-surface restack requests, in request order.
    pub placement_ops: Vec<PlacementOp>,
}

impl SurfaceState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a buffer attach, replacing any earlier attach.
    pub fn attach(&mut self, buffer: Option<BufferId>, offset: Vec2) {
        self.attach = Some(BufferAttach { buffer, offset });
    }

    /// Adds surface-local damage.
    pub fn damage(&mut self, rect: Rect) {
        self.surface_damage.push(rect);
    }

    /// Adds buffer-space damage.
    pub fn damage_buffer(&mut self, rect: Rect) {
        self.buffer_damage.push(rect);
    }

    /// Queues a frame callback.
    pub fn frame(&mut self, callback: u32) {
        self.frame_callbacks.push(callback);
    }

    /// Records a restack request for a sub-surface of this surface.
    pub fn place(&mut self, surface: SurfaceId, sibling: Option<SurfaceId>, placement: Placement) {
        self.placement_ops.push(PlacementOp {
            surface,
            sibling,
            placement,
        });
    }

    /// Returns whether nothing has been recorded in this state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attach.is_none()
            && self.scale.is_none()
            && self.transform.is_none()
            && self.input_region.is_none()
            && self.opaque_region.is_none()
            && self.surface_damage.is_empty()
            && self.buffer_damage.is_empty()
            && self.frame_callbacks.is_empty()
            && self.placement_ops.is_empty()
    }

    /// Returns the union of all surface-local damage, if any.
    #[must_use]
    pub fn damage_bounds(&self) -> Option<Rect> {
        self.surface_damage
            .iter()
            .copied()
            .reduce(|acc, r| acc.union(r))
    }
}

impl PendingState for SurfaceState {
    fn merge_into(mut self, into: &mut Self) {
        if self.attach.is_some() {
            into.attach = self.attach;
        }
        if self.scale.is_some() {
            into.scale = self.scale;
        }
        if self.transform.is_some() {
            into.transform = self.transform;
        }
        if self.input_region.is_some() {
            into.input_region = self.input_region.take();
        }
        if self.opaque_region.is_some() {
            into.opaque_region = self.opaque_region.take();
        }
        into.surface_damage.append(&mut self.surface_damage);
        into.buffer_damage.append(&mut self.buffer_damage);
        into.frame_callbacks.append(&mut self.frame_callbacks);
        into.placement_ops.append(&mut self.placement_ops);
    }

    fn placement_ops(&self) -> &[PlacementOp] {
        &self.placement_ops
    }
}
