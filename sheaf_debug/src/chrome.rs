// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Transaction events carry no wall-clock time, so each event's timestamp is
//! its position in the recording (one microsecond per event). Each cascade is
//! drawn as a span on thread 0 covering the applies it ran; per-surface events
//! go to thread 1.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut cascade_open = false;

    for (ts, recorded) in decode(bytes).enumerate() {
        match recorded {
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Commit",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "sequence": e.sequence,
                        "surfaces": e.surfaces,
                        "blocked_surfaces": e.blocked_surfaces,
                        "fences": e.fences,
                    }
                }));
            }
            RecordedEvent::Apply(e) => {
                if e.cascade_index == 0 {
                    events.push(json!({
                        "ph": "B",
                        "name": "Cascade",
                        "cat": "Apply",
                        "ts": ts,
                        "pid": 0,
                        "tid": 0,
                    }));
                    cascade_open = true;
                }
                events.push(json!({
                    "ph": "i",
                    "name": format!("Apply #{}", e.sequence),
                    "cat": "Apply",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "sequence": e.sequence,
                        "surfaces": e.surfaces,
                        "states": e.states,
                        "cascade_index": e.cascade_index,
                    }
                }));
            }
            RecordedEvent::Cascade(e) => {
                if cascade_open {
                    events.push(json!({
                        "ph": "E",
                        "name": "Cascade",
                        "cat": "Apply",
                        "ts": ts,
                        "pid": 0,
                        "tid": 0,
                        "args": {
                            "initial_sequence": e.initial_sequence,
                            "applied": e.applied,
                            "skipped": e.skipped,
                        }
                    }));
                    cascade_open = false;
                }
            }
            RecordedEvent::Finalize(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Finalize",
                    "cat": "Commit",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "discarded": e.discarded,
                    }
                }));
            }
            RecordedEvent::SurfaceApply(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SurfaceApply",
                    "cat": "Rich",
                    "ts": ts,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "sequence": e.sequence,
                        "surface": e.surface_index,
                        "position": e.position.map(|(x, y)| [x, y]),
                        "had_state": e.had_state,
                    }
                }));
            }
            RecordedEvent::ActorSync(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ActorSync",
                    "cat": "Rich",
                    "ts": ts,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "sequence": e.sequence,
                        "surface": e.surface_index,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
