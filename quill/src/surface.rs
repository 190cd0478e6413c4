//! Rendering surface abstraction.
//!
//! The core never measures or paints. A host implements [`RenderingSurface`] on
//! top of its toolkit's own hit-testing and layout, and the resolver only asks
//! it two questions: what did a point land on, and where is an entry drawn.
//!
//! [`MonospaceSurface`] is a headless implementation on a fixed-width grid, used
//! by the command line driver and by tests.

use crate::{
    display_map::{DisplayMap, FragmentId},
    position::{Position, Side},
    text::char_len,
};

/// A point on the surface that landed on a fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub fragment: FragmentId,
    /// Offset of the hit entry within its span. Always 0 for atomic fragments.
    pub sub_offset: usize,
    pub client_x: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn mid_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

pub trait RenderingSurface {
    /// Fragment entry under a surface point, if any.
    fn hit_test(&self, x: f32, y: f32) -> Option<Hit>;

    /// Box of the entry at `sub_offset` within `fragment`'s span.
    fn bounding_box(&self, fragment: FragmentId, sub_offset: usize) -> Option<Rect>;
}

#[derive(Clone, Debug, PartialEq)]
struct Cell {
    fragment: FragmentId,
    sub_offset: usize,
    rect: Rect,
}

/// Single-line layout where every drawn char takes one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct MonospaceSurface {
    line_height: f32,
    cells: Vec<Cell>,
}

impl MonospaceSurface {
    /// Lay `map` out left to right. Entries drawing no text still take one cell
    /// so they stay hittable.
    pub fn layout(map: &DisplayMap, cell_width: f32, line_height: f32) -> Self {
        let mut x = 0.0;
        let cells = map
            .fragments()
            .iter()
            .map(|fragment| {
                let width = char_len(&fragment.text).max(1) as f32 * cell_width;
                let cell = Cell {
                    fragment: fragment.id,
                    sub_offset: fragment.sub_offset(),
                    rect: Rect::new(x, 0.0, width, line_height),
                };
                x += width;
                cell
            })
            .collect();
        Self { line_height, cells }
    }

    /// Total drawn width.
    pub fn width(&self) -> f32 {
        self.cells.last().map(|cell| cell.rect.right()).unwrap_or(0.0)
    }

    /// Surface x of a caret placed at `position`.
    pub fn caret_x(&self, position: &Position) -> Option<f32> {
        let rect = self.bounding_box(position.fragment, position.atomic_offset)?;
        Some(match position.side {
            Side::Left => rect.x,
            Side::Right => rect.right(),
        })
    }
}

impl RenderingSurface for MonospaceSurface {
    fn hit_test(&self, x: f32, y: f32) -> Option<Hit> {
        if y < 0.0 || y >= self.line_height {
            return None;
        }
        let cell = self
            .cells
            .iter()
            .find(|cell| x < cell.rect.right())
            .or_else(|| self.cells.last())?;
        Some(Hit {
            fragment: cell.fragment,
            sub_offset: cell.sub_offset,
            client_x: x,
        })
    }

    fn bounding_box(&self, fragment: FragmentId, sub_offset: usize) -> Option<Rect> {
        self.cells
            .iter()
            .find(|cell| cell.fragment == fragment && cell.sub_offset == sub_offset)
            .map(|cell| cell.rect)
    }
}
