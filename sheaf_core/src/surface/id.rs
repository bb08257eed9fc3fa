// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface identity type.

use core::fmt;

/// Sentinel value indicating "no surface" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a surface in a [`SurfaceTree`](super::SurfaceTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a surface is freed and the slot is reused.
///
/// Handles order by slot index, then generation. The ordering carries no
/// visual meaning; it only gives unrelated surface trees a stable, total
/// order when a transaction is applied.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl SurfaceId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}@gen{})", self.idx, self.generation)
    }
}
