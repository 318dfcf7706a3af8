//! Pixel window for scanning a part of the grid
//!
//! Coordinates are in pixels and follow the usual image convention where
//! (0,0) is the top-left cell of the grid.

/// Rectangular block of grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// Column of the top-left cell
    pub x: usize,

    /// Row of the top-left cell
    pub y: usize,

    /// Width of the window in cells
    pub width: usize,

    /// Height of the window in cells
    pub height: usize,
}

impl PixelWindow {
    /// Create a new window
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        PixelWindow { x, y, width, height }
    }

    /// Column immediately right of the window (exclusive)
    pub fn end_x(&self) -> usize {
        self.x + self.width
    }

    /// Row immediately below the window (exclusive)
    pub fn end_y(&self) -> usize {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Iterate over `(col, row)` pairs in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y..self.end_y()).flat_map(move |row| (self.x..self.end_x()).map(move |col| (col, row)))
    }
}
