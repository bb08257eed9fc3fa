// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactional surface-state commits for Wayland compositors.
//!
//! `sheaf_core` decides when, and in what order, committed surface state
//! becomes visible. Clients accumulate pending state on surfaces; the protocol
//! layer folds it into [`Transaction`](transaction::Transaction)s, which the
//! [`Compositor`] applies atomically, in commit order per surface, with
//! parents before their sub-surfaces. It is `no_std` compatible (with
//! `alloc`) and stores surfaces and committed transactions in
//! struct-of-arrays arenas addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   SurfaceTree::pending_state_mut()       (protocol requests)
//!       │
//!       ▼
//!   Compositor::merge_pending_state() ──► Transaction
//!                                             │
//!                 ┌───────────────────────────┘
//!                 ▼
//!   Compositor::commit() ──► CommitQueue ──► cascade ──► StateApplier
//!                                                            │
//!                 ┌──────────────────────────────────────────┘
//!                 ▼
//!   SurfaceTree::evaluate() ──► SurfaceChanges
//! ```
//!
//! **[`surface`]**: Struct-of-arrays sub-surface tree with generational
//! handles, per-surface pending state, commit chains, and hold counts that
//! keep destroyed surfaces alive while transactions mention them.
//!
//! **[`state`]**: The [`PendingState`](state::PendingState) trait and the
//! reference [`SurfaceState`](state::SurfaceState).
//!
//! **[`transaction`]**: Transactions, their per-surface entries, the
//! committed queue, and the apply/cascade engine.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! Applying a transaction marks POSITION (propagating) and CONTENT.
//!
//! **[`backend`]**: The [`StateApplier`](backend::StateApplier) trait the
//! rest of the compositor implements to make state visible.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! commit and cascade instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-surface
//!   apply and actor-sync events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
mod compositor;
pub mod dirty;
pub mod state;
pub mod surface;
pub mod trace;
pub mod transaction;

pub use compositor::Compositor;
