// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Sheaf uses multi-channel dirty tracking (via [`understory_dirty`]) to record
//! which surfaces changed visually while transactions were applied. Each
//! channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`POSITION`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from each sub-surface to its parent. Moving a surface marks its whole
//!   sub-tree, because world positions are inherited.
//!
//! - **Local-only**: [`CONTENT`] is marked when a state snapshot is applied
//!   to a surface. Only that surface appears in the drain output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on tree mutations (add/remove
//!   sub-surface, restack, create/destroy surface). It triggers a
//!   traversal-order rebuild during evaluation.
//!
//! # Consumption
//!
//! Each [`SurfaceTree::evaluate`](crate::surface::SurfaceTree::evaluate) call
//! drains all channels and reports the results as
//! [`SurfaceChanges`](crate::surface::SurfaceChanges).

use understory_dirty::Channel;

/// Sub-surface position changed; world positions of the sub-tree must be
/// recomputed.
pub const POSITION: Channel = Channel::new(0);

/// A state snapshot was applied to the surface.
pub const CONTENT: Channel = Channel::new(1);

/// Tree topology or stacking order changed.
pub const TOPOLOGY: Channel = Channel::new(2);
