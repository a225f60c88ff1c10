use serde::{Deserialize, Serialize};

use crate::layout::{LayoutResult, Objective};
use crate::page::{PageSpec, Point, Rect};

/// Straight segment in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// Placement of every cell and tile of a layout on the page.
///
/// Row 0 is the topmost visual row. Page y grows upward, so a row's bottom
/// edge is measured down from the top of the grid block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetGeometry {
    pub page: PageSpec,
    pub layout: LayoutResult,
    /// Left edge of the grid block
    pub origin_x: f64,
    /// Distance from the top page edge to the top of the grid block
    pub origin_top: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl SheetGeometry {
    pub fn new(page: PageSpec, layout: LayoutResult) -> Self {
        let columns = f64::from(layout.columns);
        let rows = f64::from(layout.rows);

        match layout.objective {
            Objective::TightPack => {
                // Tiles touch; the block is centered in the printable area
                let size = layout.tile_size;
                let slack_x = (page.effective_width() - columns * size).max(0.0);
                let slack_y = (page.effective_height() - rows * size).max(0.0);
                Self {
                    page,
                    layout,
                    origin_x: page.margin + slack_x / 2.0,
                    origin_top: page.margin + slack_y / 2.0,
                    cell_width: size,
                    cell_height: size,
                }
            }
            Objective::SquareCut => Self {
                page,
                layout,
                origin_x: 0.0,
                origin_top: 0.0,
                cell_width: page.width / columns,
                cell_height: page.height / rows,
            },
        }
    }

    /// (column, row) of a tile index, row-major
    pub fn cell_position(&self, index: u32) -> (u32, u32) {
        (index % self.layout.columns, index / self.layout.columns)
    }

    pub fn cell_rect(&self, index: u32) -> Rect {
        let (column, row) = self.cell_position(index);
        let x = self.origin_x + f64::from(column) * self.cell_width;
        let y = self.page.height - self.origin_top - f64::from(row + 1) * self.cell_height;
        Rect::new(x, y, self.cell_width, self.cell_height)
    }

    /// Tile square centered in its cell
    pub fn tile_rect(&self, index: u32) -> Rect {
        let cell = self.cell_rect(index);
        let size = self.layout.tile_size;
        Rect::new(
            cell.x + (cell.width - size) / 2.0,
            cell.y + (cell.height - size) / 2.0,
            size,
            size,
        )
    }

    /// Rectangles of all tiles that get drawn
    pub fn tile_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        (0..self.layout.count).map(move |index| self.tile_rect(index))
    }

    /// Internal grid boundaries, each spanning the full page
    pub fn cut_lines(&self) -> Vec<Segment> {
        let mut lines = Vec::new();

        for column in 1..self.layout.columns {
            let x = self.origin_x + f64::from(column) * self.cell_width;
            lines.push(Segment {
                from: Point::new(x, 0.0),
                to: Point::new(x, self.page.height),
            });
        }

        for row in 1..self.layout.rows {
            let y = self.page.height - self.origin_top - f64::from(row) * self.cell_height;
            lines.push(Segment {
                from: Point::new(0.0, y),
                to: Point::new(self.page.width, y),
            });
        }

        lines
    }
}
