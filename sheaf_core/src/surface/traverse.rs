// Copyright 2026 the Sheaf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, SurfaceId};
use super::tree::SurfaceTree;

/// An iterator over the immediate sub-surfaces of a surface, bottom first.
///
/// Created by [`SurfaceTree::subsurfaces`].
#[derive(Debug)]
pub struct Subsurfaces<'a, S> {
    tree: &'a SurfaceTree<S>,
    current: u32,
}

impl<'a, S> Subsurfaces<'a, S> {
    pub(crate) fn new(tree: &'a SurfaceTree<S>, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl<S> Iterator for Subsurfaces<'_, S> {
    type Item = SurfaceId;

    fn next(&mut self) -> Option<SurfaceId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(SurfaceId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

/// An iterator over the strict ancestors of a surface, nearest first.
///
/// Created by [`SurfaceTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a, S> {
    tree: &'a SurfaceTree<S>,
    current: u32,
}

impl<'a, S> Ancestors<'a, S> {
    pub(crate) fn new(tree: &'a SurfaceTree<S>, parent: u32) -> Self {
        Self {
            tree,
            current: parent,
        }
    }
}

impl<S> Iterator for Ancestors<'_, S> {
    type Item = SurfaceId;

    fn next(&mut self) -> Option<SurfaceId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(SurfaceId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}
