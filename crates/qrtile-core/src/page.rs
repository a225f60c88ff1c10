//! Page model: physical sheet size, printer margin and page coordinates.
//!
//! All lengths are millimetres. Page coordinates put the origin at the
//! bottom-left corner with y growing upward, which is what PDF uses.

use serde::{Deserialize, Serialize};

use crate::TileError;

/// A4 width in millimetres
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 height in millimetres
pub const A4_HEIGHT_MM: f64 = 297.0;
/// Default non-printable border
pub const DEFAULT_MARGIN_MM: f64 = 5.0;

/// Tolerance for floating comparisons against the printable area
pub const EPSILON: f64 = 1e-9;

/// Page size and printer margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSpec {
    pub width: f64,
    pub height: f64,
    /// Border on every side that the printer cannot reach
    pub margin: f64,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            width: A4_WIDTH_MM,
            height: A4_HEIGHT_MM,
            margin: DEFAULT_MARGIN_MM,
        }
    }
}

impl PageSpec {
    pub fn new(width: f64, height: f64, margin: f64) -> Self {
        Self { width, height, margin }
    }

    /// A4 portrait with the given margin
    pub fn a4(margin: f64) -> Self {
        Self::new(A4_WIDTH_MM, A4_HEIGHT_MM, margin)
    }

    pub fn effective_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn effective_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Region where tiles may be placed
    pub fn printable_area(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            self.effective_width(),
            self.effective_height(),
        )
    }

    /// Checks that the page leaves a positive printable area.
    pub fn validate(&self) -> Result<(), TileError> {
        let finite = self.width.is_finite() && self.height.is_finite() && self.margin.is_finite();
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(TileError::Configuration(format!(
                "page size must be positive, got {}x{} mm",
                self.width, self.height
            )));
        }
        if self.margin < 0.0 {
            return Err(TileError::Configuration(format!(
                "margin must not be negative, got {} mm",
                self.margin
            )));
        }
        if self.effective_width() <= 0.0 || self.effective_height() <= 0.0 {
            return Err(TileError::Configuration(format!(
                "margin {} mm leaves no printable area on a {}x{} mm page",
                self.margin, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, `(x, y)` is the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Containment with [`EPSILON`] slack on every edge
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.top() <= self.top() + EPSILON
    }
}
