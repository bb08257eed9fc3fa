// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface tree data model.
//!
//! A *surface* is a node in the compositor's sub-surface tree. Each surface
//! has:
//!
//! - An identity ([`SurfaceId`]): a generational handle that becomes stale
//!   when the surface's slot is freed.
//! - Topology: parent, first sub-surface, and sibling links forming an ordered
//!   tree. Sibling order is stacking order, bottom first.
//! - A live sub-surface **position** relative to its parent, written only when
//!   a transaction applies.
//! - A **pending state** that the protocol layer accumulates into between
//!   commits.
//! - A **commit chain**: the oldest (`first_committed`) and newest
//!   (`last_committed`) committed transactions that still mention the surface.
//!
//! Surfaces are stored in struct-of-arrays layout with index-based handles.

mod evaluate;
mod id;
mod traverse;
mod tree;

pub use evaluate::SurfaceChanges;
pub use id::{INVALID, SurfaceId};
pub use traverse::{Ancestors, Subsurfaces};
pub use tree::SurfaceTree;
