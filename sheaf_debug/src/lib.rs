// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for sheaf transaction
//! diagnostics.
//!
//! This crate provides [`TraceSink`](sheaf_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: Human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: Compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: Writes Chrome Trace Event Format JSON from recorded
//!   bytes.

pub mod chrome;
pub mod pretty;
pub mod recorder;
