//! Grid geometry shared by every band of a stack

use geo::{coord, Coord, Rect};

use crate::coordinate::{BoundingBox, CoordinateSystem};
use super::window::PixelWindow;

/// North-up affine transform from pixel to world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the top-left corner
    pub origin_x: f64,
    /// Cell width in world units
    pub pixel_width: f64,
    /// Y coordinate of the top-left corner
    pub origin_y: f64,
    /// Cell height in world units, negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        GeoTransform { origin_x, pixel_width, origin_y, pixel_height }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, 0.0, self.origin_y, 0.0, self.pixel_height]
    }
}

/// Dimensions, georeferencing and CRS of a raster grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Pixel to world transform
    pub transform: GeoTransform,
    /// Reference frame, if known
    pub crs: Option<CoordinateSystem>,
}

impl GridSpec {
    pub fn new(width: usize, height: usize, transform: GeoTransform, crs: Option<CoordinateSystem>) -> Self {
        GridSpec { width, height, transform, crs }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// World-space extent of the grid
    pub fn extent(&self) -> BoundingBox {
        let t = &self.transform;
        let x0 = t.origin_x;
        let x1 = t.origin_x + self.width as f64 * t.pixel_width;
        let y0 = t.origin_y;
        let y1 = t.origin_y + self.height as f64 * t.pixel_height;
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Smallest cell side, used as the sampling step along lines
    pub fn min_pixel_size(&self) -> f64 {
        self.transform.pixel_width.abs().min(self.transform.pixel_height.abs())
    }

    /// Cell containing a world coordinate
    ///
    /// Coordinates on the far edges of the extent belong to the last
    /// column/row. Returns `None` outside the grid.
    pub fn world_to_pixel(&self, c: &Coord<f64>) -> Option<(usize, usize)> {
        if self.width == 0 || self.height == 0 || !self.extent().contains(c) {
            return None;
        }
        let t = &self.transform;
        let col = ((c.x - t.origin_x) / t.pixel_width).floor();
        let row = ((c.y - t.origin_y) / t.pixel_height).floor();
        let col = (col.max(0.0) as usize).min(self.width - 1);
        let row = (row.max(0.0) as usize).min(self.height - 1);
        Some((col, row))
    }

    /// Row-major index of a cell
    pub fn pixel_index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    /// World coordinate of a cell centre
    pub fn pixel_center(&self, col: usize, row: usize) -> Coord<f64> {
        let t = &self.transform;
        coord! {
            x: t.origin_x + (col as f64 + 0.5) * t.pixel_width,
            y: t.origin_y + (row as f64 + 0.5) * t.pixel_height,
        }
    }

    /// World-space rectangle covered by a cell
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect<f64> {
        let t = &self.transform;
        let x0 = t.origin_x + col as f64 * t.pixel_width;
        let y0 = t.origin_y + row as f64 * t.pixel_height;
        Rect::new(
            coord! { x: x0, y: y0 },
            coord! { x: x0 + t.pixel_width, y: y0 + t.pixel_height },
        )
    }

    /// Cells overlapped by a world-space box, clamped to the grid
    ///
    /// Returns `None` when the box misses the grid entirely.
    pub fn window_for(&self, bbox: &BoundingBox) -> Option<PixelWindow> {
        if !self.extent().intersects(bbox) {
            return None;
        }
        let t = &self.transform;

        let cx0 = (bbox.min_x - t.origin_x) / t.pixel_width;
        let cx1 = (bbox.max_x - t.origin_x) / t.pixel_width;
        let ry0 = (bbox.min_y - t.origin_y) / t.pixel_height;
        let ry1 = (bbox.max_y - t.origin_y) / t.pixel_height;

        let col_min = cx0.min(cx1).floor().max(0.0) as usize;
        let col_max = (cx0.max(cx1).ceil().max(0.0) as usize).min(self.width);
        let row_min = ry0.min(ry1).floor().max(0.0) as usize;
        let row_max = (ry0.max(ry1).ceil().max(0.0) as usize).min(self.height);

        let col_min = col_min.min(self.width);
        let row_min = row_min.min(self.height);

        Some(PixelWindow::new(
            col_min,
            row_min,
            col_max.saturating_sub(col_min),
            row_max.saturating_sub(row_min),
        ))
    }

    /// Check that another grid lines up with this one cell for cell
    pub fn is_aligned_with(&self, other: &GridSpec) -> bool {
        const EPS: f64 = 1e-9;
        let a = self.transform.to_gdal();
        let b = other.transform.to_gdal();
        self.width == other.width
            && self.height == other.height
            && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= EPS * x.abs().max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridSpec {
        // 4 x 3 cells of 10 units, top-left at (100, 50)
        GridSpec::new(4, 3, GeoTransform::new(100.0, 10.0, 50.0, -10.0), None)
    }

    #[test]
    fn test_extent() {
        assert_eq!(grid().extent(), BoundingBox::new(100.0, 20.0, 140.0, 50.0));
    }

    #[test]
    fn test_world_to_pixel() {
        let g = grid();
        assert_eq!(g.world_to_pixel(&coord! { x: 105.0, y: 45.0 }), Some((0, 0)));
        assert_eq!(g.world_to_pixel(&coord! { x: 135.0, y: 25.0 }), Some((3, 2)));
        assert_eq!(g.world_to_pixel(&coord! { x: 140.0, y: 20.0 }), Some((3, 2)));
        assert_eq!(g.world_to_pixel(&coord! { x: 99.0, y: 25.0 }), None);
    }

    #[test]
    fn test_pixel_center_and_rect() {
        let g = grid();
        assert_eq!(g.pixel_center(1, 1), coord! { x: 115.0, y: 35.0 });
        let rect = g.cell_rect(1, 1);
        assert_eq!(rect.min(), coord! { x: 110.0, y: 30.0 });
        assert_eq!(rect.max(), coord! { x: 120.0, y: 40.0 });
    }

    #[test]
    fn test_window_is_clamped() {
        let g = grid();
        let window = g.window_for(&BoundingBox::new(115.0, 0.0, 200.0, 38.0)).unwrap();
        assert_eq!(window, PixelWindow::new(1, 1, 3, 2));
        assert!(g.window_for(&BoundingBox::new(0.0, 0.0, 10.0, 10.0)).is_none());
    }
}
