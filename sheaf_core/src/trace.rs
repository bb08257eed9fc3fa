// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the transaction engine.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! engine calls as transactions are committed, applied, and torn down. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates the per-surface
//!   [`SurfaceApplyEvent`] and [`ActorSyncEvent`] events plus the
//!   corresponding `TraceSink` methods.

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a transaction is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitEvent {
    /// Commit sequence assigned to the transaction.
    pub sequence: u64,
    /// Number of surfaces the transaction names.
    pub surfaces: u32,
    /// Number of those surfaces that already had an older pending
    /// transaction.
    pub blocked_surfaces: u32,
    /// Number of unsignalled fences. The transaction applies immediately only
    /// when this and `blocked_surfaces` are both zero.
    pub fences: u32,
}

/// Emitted when a ready transaction starts applying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyEvent {
    /// Commit sequence of the transaction.
    pub sequence: u64,
    /// Number of surfaces the transaction names.
    pub surfaces: u32,
    /// Number of those surfaces that carry a state snapshot.
    pub states: u32,
    /// Position of this transaction within its cascade (0 for the one that
    /// started it).
    pub cascade_index: u32,
}

/// Emitted when a cascade has drained its candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadeEvent {
    /// Commit sequence of the transaction that started the cascade.
    pub initial_sequence: u64,
    /// Number of transactions applied.
    pub applied: u32,
    /// Number of candidates examined and found not yet ready.
    pub skipped: u32,
}

/// Emitted when the committed queue is torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalizeEvent {
    /// Number of queued transactions discarded without being applied.
    pub discarded: u32,
}

/// Emitted for each surface as pass one of an apply reaches it.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceApplyEvent {
    /// Commit sequence of the transaction.
    pub sequence: u64,
    /// Slot index of the surface.
    pub surface_index: u32,
    /// Position override written, if any.
    pub position: Option<(i32, i32)>,
    /// Whether a state snapshot was applied.
    pub had_state: bool,
}

/// Emitted for each surface whose child actor state is synced in pass two.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorSyncEvent {
    /// Commit sequence of the transaction.
    pub sequence: u64,
    /// Slot index of the surface.
    pub surface_index: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the transaction engine.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a transaction is committed.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a transaction starts applying.
    fn on_apply(&mut self, e: &ApplyEvent) {
        _ = e;
    }

    /// Called when a cascade finishes.
    fn on_cascade(&mut self, e: &CascadeEvent) {
        _ = e;
    }

    /// Called when the committed queue is torn down.
    fn on_finalize(&mut self, e: &FinalizeEvent) {
        _ = e;
    }

    /// Called per surface in pass one (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_surface_apply(&mut self, e: &SurfaceApplyEvent) {
        _ = e;
    }

    /// Called per surface in pass two (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_actor_sync(&mut self, e: &ActorSyncEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ApplyEvent`].
    #[inline]
    pub fn apply(&mut self, e: &ApplyEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_apply(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CascadeEvent`].
    #[inline]
    pub fn cascade(&mut self, e: &CascadeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cascade(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FinalizeEvent`].
    #[inline]
    pub fn finalize(&mut self, e: &FinalizeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_finalize(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceApplyEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn surface_apply(&mut self, e: &SurfaceApplyEvent) {
        if let Some(s) = &mut self.sink {
            s.on_surface_apply(e);
        }
    }

    /// Emits an [`ActorSyncEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn actor_sync(&mut self, e: &ActorSyncEvent) {
        if let Some(s) = &mut self.sink {
            s.on_actor_sync(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit() -> CommitEvent {
        CommitEvent {
            sequence: 42,
            surfaces: 3,
            blocked_surfaces: 1,
            fences: 0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_commit(&sample_commit());
        sink.on_apply(&ApplyEvent {
            sequence: 42,
            surfaces: 3,
            states: 2,
            cascade_index: 0,
        });
        sink.on_cascade(&CascadeEvent {
            initial_sequence: 42,
            applied: 1,
            skipped: 0,
        });
        sink.on_finalize(&FinalizeEvent { discarded: 0 });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.commit(&sample_commit());
        tracer.finalize(&FinalizeEvent { discarded: 2 });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            commits: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_commit(&mut self, e: &CommitEvent) {
                self.commits.push(e.sequence);
            }
        }

        let mut sink = RecordingSink {
            commits: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.commit(&sample_commit());
        drop(tracer);
        assert_eq!(sink.commits, &[42]);
    }
}
