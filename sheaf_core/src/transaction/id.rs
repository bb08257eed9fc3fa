// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Committed transaction identity type.

use core::fmt;

/// A handle to a committed transaction in a
/// [`CommitQueue`](super::CommitQueue).
///
/// Like [`SurfaceId`](crate::surface::SurfaceId), this carries a generation
/// counter. Once a transaction has been applied or discarded its slot may be
/// reused, and the old handle no longer matches.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl TransactionId {
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

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({}@gen{})", self.idx, self.generation)
    }
}
