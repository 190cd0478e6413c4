//! Positions and their resolution in both directions.
//!
//! A [`Position`] is a caret endpoint in display terms: a fragment, an offset
//! within that fragment's span, and the [`Side`] of the character boundary it
//! sits on. [`to_logical_index`] turns it into a plain logical index;
//! [`resolve_hit`] builds one from a surface hit.
//!
//! Neither direction panics on bad input. Offsets past the end of a span clamp
//! to its right edge, and identifiers from an older display map report
//! [`Diagnostic::UnresolvedHit`].

use crate::{
    diagnostic::Diagnostic,
    display_map::{DisplayMap, Fragment, FragmentId, FragmentKind},
    surface::{Hit, Rect, RenderingSurface},
};

/// Which side of a character boundary a position sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    /// Before the character, on its left edge.
    #[default]
    Left,
    /// After the character, on its right edge.
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub fragment: FragmentId,
    /// Offset of the addressed entry within its span (`atomicIndex - index`).
    pub atomic_offset: usize,
    pub side: Side,
}

impl Position {
    pub fn new(fragment: FragmentId, atomic_offset: usize, side: Side) -> Self {
        Self {
            fragment,
            atomic_offset,
            side,
        }
    }

    /// Position on one side of a display map entry.
    pub fn on(fragment: &Fragment, side: Side) -> Self {
        Self::new(fragment.id, fragment.sub_offset(), side)
    }
}

/// Logical index of a position.
pub fn to_logical_index(map: &DisplayMap, position: &Position) -> Result<usize, Diagnostic> {
    let entries = map.entries(position.fragment).ok_or(Diagnostic::UnresolvedHit {
        fragment: position.fragment,
    })?;
    let Some(last) = entries.last() else {
        return Err(Diagnostic::UnresolvedHit {
            fragment: position.fragment,
        });
    };

    let (entry, side) = match entries
        .iter()
        .find(|f| f.sub_offset() == position.atomic_offset)
    {
        Some(entry) => (entry, position.side),
        None => (last, Side::Right),
    };
    Ok(edge(entry, side))
}

/// Logical index of one edge of an entry.
fn edge(fragment: &Fragment, side: Side) -> usize {
    let range = fragment.logical_range();
    match side {
        Side::Left => range.start,
        Side::Right => range.end,
    }
}

/// Resolve a surface hit into a position.
///
/// Atomic fragments resolve to their left or right edge by comparing the hit's
/// `client_x` with the middle of the fragment's box. Non-atomic fragments pick
/// the entry whose sub-offset matches and apply the same rule to that char's
/// box; a sub-offset past the last char resolves to the right edge of the
/// last entry.
pub fn resolve_hit(
    map: &DisplayMap,
    hit: &Hit,
    surface: &dyn RenderingSurface,
) -> Result<Position, Diagnostic> {
    let entries = map.entries(hit.fragment).ok_or(Diagnostic::UnresolvedHit {
        fragment: hit.fragment,
    })?;
    let Some(last) = entries.last() else {
        return Err(Diagnostic::UnresolvedHit {
            fragment: hit.fragment,
        });
    };

    let (entry, sub_offset) = match last.kind {
        FragmentKind::Atomic { .. } => (last, 0),
        FragmentKind::NonAtomic { .. } => {
            match entries.iter().find(|f| f.sub_offset() == hit.sub_offset) {
                Some(entry) => (entry, hit.sub_offset),
                None => return Ok(Position::on(last, Side::Right)),
            }
        },
    };

    let side = side_of(surface.bounding_box(hit.fragment, sub_offset), hit.client_x);
    Ok(Position::on(entry, side))
}

/// Left half of the box resolves left, right half right. No geometry resolves left.
fn side_of(rect: Option<Rect>, client_x: f32) -> Side {
    match rect {
        Some(rect) if client_x >= rect.mid_x() => Side::Right,
        _ => Side::Left,
    }
}
