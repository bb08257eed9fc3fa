// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use sheaf_core::trace::{
    ActorSyncEvent, ApplyEvent, CascadeEvent, CommitEvent, FinalizeEvent, SurfaceApplyEvent,
    TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_COMMIT: u8 = 1;
const TAG_APPLY: u8 = 2;
const TAG_CASCADE: u8 = 3;
const TAG_FINALIZE: u8 = 4;
const TAG_SURFACE_APPLY: u8 = 5;
const TAG_ACTOR_SYNC: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_point(&mut self, v: Option<(i32, i32)>) {
        let (present, (x, y)) = match v {
            Some(p) => (1, p),
            None => (0, (0, 0)),
        };
        self.write_u8(present);
        self.write_i32(x);
        self.write_i32(y);
    }
}

impl TraceSink for RecorderSink {
    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.sequence);
        self.write_u32(e.surfaces);
        self.write_u32(e.blocked_surfaces);
        self.write_u32(e.fences);
    }

    fn on_apply(&mut self, e: &ApplyEvent) {
        self.write_u8(TAG_APPLY);
        self.write_u64(e.sequence);
        self.write_u32(e.surfaces);
        self.write_u32(e.states);
        self.write_u32(e.cascade_index);
    }

    fn on_cascade(&mut self, e: &CascadeEvent) {
        self.write_u8(TAG_CASCADE);
        self.write_u64(e.initial_sequence);
        self.write_u32(e.applied);
        self.write_u32(e.skipped);
    }

    fn on_finalize(&mut self, e: &FinalizeEvent) {
        self.write_u8(TAG_FINALIZE);
        self.write_u32(e.discarded);
    }

    fn on_surface_apply(&mut self, e: &SurfaceApplyEvent) {
        self.write_u8(TAG_SURFACE_APPLY);
        self.write_u64(e.sequence);
        self.write_u32(e.surface_index);
        self.write_option_point(e.position);
        self.write_u8(u8::from(e.had_state));
    }

    fn on_actor_sync(&mut self, e: &ActorSyncEvent) {
        self.write_u8(TAG_ACTOR_SYNC);
        self.write_u64(e.sequence);
        self.write_u32(e.surface_index);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// An [`ApplyEvent`].
    Apply(ApplyEvent),
    /// A [`CascadeEvent`].
    Cascade(CascadeEvent),
    /// A [`FinalizeEvent`].
    Finalize(FinalizeEvent),
    /// A [`SurfaceApplyEvent`].
    SurfaceApply(SurfaceApplyEvent),
    /// An [`ActorSyncEvent`].
    ActorSync(ActorSyncEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Iteration stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes: [u8; N] = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_option_point(&mut self) -> Option<Option<(i32, i32)>> {
        let present = self.read_u8()?;
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        Some((present != 0).then_some((x, y)))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            sequence: self.read_u64()?,
            surfaces: self.read_u32()?,
            blocked_surfaces: self.read_u32()?,
            fences: self.read_u32()?,
        }))
    }

    fn decode_apply(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Apply(ApplyEvent {
            sequence: self.read_u64()?,
            surfaces: self.read_u32()?,
            states: self.read_u32()?,
            cascade_index: self.read_u32()?,
        }))
    }

    fn decode_cascade(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Cascade(CascadeEvent {
            initial_sequence: self.read_u64()?,
            applied: self.read_u32()?,
            skipped: self.read_u32()?,
        }))
    }

    fn decode_finalize(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Finalize(FinalizeEvent {
            discarded: self.read_u32()?,
        }))
    }

    fn decode_surface_apply(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceApply(SurfaceApplyEvent {
            sequence: self.read_u64()?,
            surface_index: self.read_u32()?,
            position: self.read_option_point()?,
            had_state: self.read_u8()? != 0,
        }))
    }

    fn decode_actor_sync(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ActorSync(ActorSyncEvent {
            sequence: self.read_u64()?,
            surface_index: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_COMMIT => self.decode_commit(),
            TAG_APPLY => self.decode_apply(),
            TAG_CASCADE => self.decode_cascade(),
            TAG_FINALIZE => self.decode_finalize(),
            TAG_SURFACE_APPLY => self.decode_surface_apply(),
            TAG_ACTOR_SYNC => self.decode_actor_sync(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use sheaf_core::Compositor;
    use sheaf_core::backend::StateApplier;
    use sheaf_core::state::SurfaceState;
    use sheaf_core::surface::{SurfaceId, SurfaceTree};
    use sheaf_core::trace::Tracer;
    use sheaf_core::transaction::{FenceId, Transaction};

    use super::*;

    struct Discard;

    impl StateApplier<SurfaceState> for Discard {
        fn apply_state(&mut self, _: &mut SurfaceTree, _: SurfaceId, _: SurfaceState) {}
    }

    #[test]
    fn records_a_live_cascade() {
        let mut c: Compositor = Compositor::new();
        let parent = c.surfaces_mut().create_surface();
        let child = c.surfaces_mut().create_surface();
        c.surfaces_mut().add_subsurface(parent, child);

        let mut first = Transaction::new();
        c.merge_pending_state(&mut first, parent);
        first.add_fence(FenceId(1));
        let mut second = Transaction::new();
        c.merge_pending_state(&mut second, parent);
        c.add_subsurface_position(&mut second, child, 3, -4);

        let mut rec = RecorderSink::new();
        let mut tracer = Tracer::new(&mut rec);
        let first = c.commit_traced(first, &mut Discard, &mut tracer);
        let _ = c.commit_traced(second, &mut Discard, &mut tracer);
        let _ = c.signal_fence_traced(first, FenceId(1), &mut Discard, &mut tracer);
        drop(tracer);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::Commit(CommitEvent {
                    sequence: 1,
                    surfaces: 1,
                    blocked_surfaces: 0,
                    fences: 1,
                }),
                RecordedEvent::Commit(CommitEvent {
                    sequence: 2,
                    surfaces: 2,
                    blocked_surfaces: 1,
                    fences: 0,
                }),
                RecordedEvent::Apply(ApplyEvent {
                    sequence: 1,
                    surfaces: 1,
                    states: 1,
                    cascade_index: 0,
                }),
                RecordedEvent::SurfaceApply(SurfaceApplyEvent {
                    sequence: 1,
                    surface_index: parent.index(),
                    position: None,
                    had_state: true,
                }),
                RecordedEvent::ActorSync(ActorSyncEvent {
                    sequence: 1,
                    surface_index: parent.index(),
                }),
                RecordedEvent::Apply(ApplyEvent {
                    sequence: 2,
                    surfaces: 2,
                    states: 1,
                    cascade_index: 1,
                }),
                RecordedEvent::SurfaceApply(SurfaceApplyEvent {
                    sequence: 2,
                    surface_index: parent.index(),
                    position: None,
                    had_state: true,
                }),
                RecordedEvent::SurfaceApply(SurfaceApplyEvent {
                    sequence: 2,
                    surface_index: child.index(),
                    position: Some((3, -4)),
                    had_state: false,
                }),
                RecordedEvent::ActorSync(ActorSyncEvent {
                    sequence: 2,
                    surface_index: parent.index(),
                }),
                RecordedEvent::Cascade(CascadeEvent {
                    initial_sequence: 1,
                    applied: 2,
                    skipped: 0,
                }),
            ]
        );
    }

    #[test]
    fn finalize_round_trips() {
        let mut rec = RecorderSink::new();
        rec.on_finalize(&FinalizeEvent { discarded: 9 });
        let events: Vec<_> = decode(&rec.into_bytes()).collect();
        assert_eq!(
            events,
            vec![RecordedEvent::Finalize(FinalizeEvent { discarded: 9 })]
        );
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_cascade(&CascadeEvent {
            initial_sequence: 1,
            applied: 1,
            skipped: 0,
        });
        rec.on_finalize(&FinalizeEvent { discarded: 0 });
        let bytes = rec.as_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::Cascade(_)));
    }
}
