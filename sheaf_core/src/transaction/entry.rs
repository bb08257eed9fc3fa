// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface transaction payload.

use crate::state::PendingState;

/// What one transaction will do to one surface.
///
/// Entries are created lazily. An entry normally carries a state snapshot, a
/// sub-surface position override, or both; entries with neither exist only
/// for surfaces named by a placement operation, so that they take part in
/// ordering and dependency tracking.
#[derive(Debug)]
pub struct TransactionEntry<S> {
    pub(crate) state: Option<S>,
    pub(crate) position: Option<(i32, i32)>,
}

impl<S> Default for TransactionEntry<S> {
    fn default() -> Self {
        Self {
            state: None,
            position: None,
        }
    }
}

impl<S> TransactionEntry<S> {
    /// Returns the state snapshot to apply, if any.
    #[must_use]
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    /// Returns the sub-surface position override, if any.
    #[must_use]
    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }
}

impl<S: PendingState> TransactionEntry<S> {
    /// Folds `self` (the later entry) into `to`.
    ///
    /// The position override is last-write-wins; state snapshots are combined
    /// with [`PendingState::merge_into`].
    pub(crate) fn merge_into(self, to: &mut Self) {
        if self.position.is_some() {
            to.position = self.position;
        }
        let Some(from) = self.state else {
            return;
        };
        if let Some(into) = to.state.as_mut() {
            from.merge_into(into);
        } else {
            to.state = Some(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::state::SurfaceState;

    fn entry(position: Option<(i32, i32)>, callback: Option<u32>) -> TransactionEntry<SurfaceState> {
        TransactionEntry {
            state: callback.map(|c| {
                let mut s = SurfaceState::new();
                s.frame(c);
                s
            }),
            position,
        }
    }

    #[test]
    fn later_position_wins() {
        let mut to = entry(Some((1, 1)), None);
        entry(Some((2, 3)), None).merge_into(&mut to);
        assert_eq!(to.position(), Some((2, 3)));

        entry(None, None).merge_into(&mut to);
        assert_eq!(to.position(), Some((2, 3)));
    }

    #[test]
    fn states_are_combined() {
        let mut to = entry(None, Some(1));
        entry(None, Some(2)).merge_into(&mut to);
        assert_eq!(to.state().unwrap().frame_callbacks, vec![1, 2]);
    }

    #[test]
    fn state_is_adopted_when_missing() {
        let mut to = entry(Some((5, 5)), None);
        entry(None, Some(4)).merge_into(&mut to);
        assert_eq!(to.state().unwrap().frame_callbacks, vec![4]);
        assert_eq!(to.position(), Some((5, 5)));
    }
}
