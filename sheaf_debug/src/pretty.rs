// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use sheaf_core::trace::{
    ActorSyncEvent, ApplyEvent, CascadeEvent, CommitEvent, FinalizeEvent, SurfaceApplyEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_commit(&mut self, e: &CommitEvent) {
        let verdict = if e.blocked_surfaces == 0 && e.fences == 0 {
            "ready"
        } else {
            "queued"
        };
        let _ = writeln!(
            self.writer,
            "[commit] seq={} surfaces={} blocked={} fences={} {verdict}",
            e.sequence, e.surfaces, e.blocked_surfaces, e.fences,
        );
    }

    fn on_apply(&mut self, e: &ApplyEvent) {
        let _ = writeln!(
            self.writer,
            "[apply] seq={} surfaces={} states={} cascade#{}",
            e.sequence, e.surfaces, e.states, e.cascade_index,
        );
    }

    fn on_cascade(&mut self, e: &CascadeEvent) {
        let _ = writeln!(
            self.writer,
            "[cascade] from seq={} applied={} skipped={}",
            e.initial_sequence, e.applied, e.skipped,
        );
    }

    fn on_finalize(&mut self, e: &FinalizeEvent) {
        let _ = writeln!(self.writer, "[finalize] discarded={}", e.discarded);
    }

    fn on_surface_apply(&mut self, e: &SurfaceApplyEvent) {
        let position = match e.position {
            Some((x, y)) => format!(" pos=({x},{y})"),
            None => String::new(),
        };
        let state = if e.had_state { " state" } else { "" };
        let _ = writeln!(
            self.writer,
            "  [surface] seq={} #{}{position}{state}",
            e.sequence, e.surface_index,
        );
    }

    fn on_actor_sync(&mut self, e: &ActorSyncEvent) {
        let _ = writeln!(
            self.writer,
            "  [sync] seq={} #{}",
            e.sequence, e.surface_index,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(f: impl FnOnce(&mut PrettyPrintSink<Vec<u8>>)) -> String {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_commit() {
        let output = lines(|sink| {
            sink.on_commit(&CommitEvent {
                sequence: 4,
                surfaces: 2,
                blocked_surfaces: 1,
                fences: 0,
            });
        });
        assert!(output.starts_with("[commit]"), "got: {output}");
        assert!(output.contains("seq=4"), "got: {output}");
        assert!(output.contains("queued"), "got: {output}");
    }

    #[test]
    fn pretty_print_surface_apply() {
        let output = lines(|sink| {
            sink.on_surface_apply(&SurfaceApplyEvent {
                sequence: 1,
                surface_index: 3,
                position: Some((-2, 5)),
                had_state: true,
            });
            sink.on_surface_apply(&SurfaceApplyEvent {
                sequence: 1,
                surface_index: 4,
                position: None,
                had_state: false,
            });
        });
        let mut it = output.lines();
        assert_eq!(it.next(), Some("  [surface] seq=1 #3 pos=(-2,5) state"));
        assert_eq!(it.next(), Some("  [surface] seq=1 #4"));
    }
}
