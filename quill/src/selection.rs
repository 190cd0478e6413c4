//! Cursor and selection state in logical terms.
//!
//! The field keeps endpoints as logical indices plus the [`Side`] they were
//! placed on, not as [`Position`](crate::Position)s, because fragment
//! identifiers die with every display map rebuild. Positions are derived from
//! the current map whenever the host asks for them.

use crate::{display_map::DisplayMap, position::Side};
use std::ops::Range;

/// A caret endpoint: a logical index and the side of the boundary it attaches to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub index: usize,
    pub side: Side,
}

impl Endpoint {
    pub fn new(index: usize, side: Side) -> Self {
        Self { index, side }
    }

    /// Clamp into `0..=len`, returning whether the index changed.
    pub(crate) fn clamp(&mut self, len: usize) -> bool {
        let clamped = self.index > len;
        self.index = self.index.min(len);
        clamped
    }

    /// Clamp to `map` and move out of any atomic entry to the edge the caret is
    /// drawn on.
    pub(crate) fn fit(&mut self, map: &DisplayMap) {
        self.clamp(map.len());
        if let Some((index, side)) = map.snap(self.index) {
            *self = Endpoint::new(index, side);
        }
    }
}

/// A selection between where it started (`anchor`) and its live end (`focus`).
///
/// Anchor may come after focus; [`range`](Selection::range) orders them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    pub anchor: Endpoint,
    pub focus: Endpoint,
}

impl Selection {
    pub fn new(anchor: Endpoint, focus: Endpoint) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(at: Endpoint) -> Self {
        Self::new(at, at)
    }

    /// Logical range covered, independent of which end is the anchor.
    pub fn range(&self) -> Range<usize> {
        let (a, b) = (self.anchor.index, self.focus.index);
        a.min(b)..a.max(b)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor.index == self.focus.index
    }

    /// True if the focus is the lower bound.
    pub fn is_reversed(&self) -> bool {
        self.focus.index < self.anchor.index
    }
}
