//! Re-extraction of polygons too small to own a zone cell

use geo::{BoundingRect, Centroid, Intersects, MultiPolygon};

use crate::config::SmallMethod;
use crate::coordinate::BoundingBox;
use crate::raster::GridSpec;
use super::point_line::CellSample;

/// Resolve what an unrealized polygon samples
///
/// `Centroid` reads the pixel under the polygon centroid, missing when the
/// centroid is off the grid. `Full` covers every cell whose footprint
/// intersects the polygon.
pub fn small_polygon_sample(polygons: &MultiPolygon<f64>, grid: &GridSpec, method: SmallMethod) -> CellSample {
    match method {
        SmallMethod::Centroid => {
            let pixel = polygons.centroid()
                .and_then(|c| grid.world_to_pixel(&c.0))
                .map(|(col, row)| grid.pixel_index(col, row));
            CellSample::Pixel(pixel)
        },
        SmallMethod::Full => {
            let window = polygons.bounding_rect()
                .and_then(|rect| grid.window_for(&BoundingBox::from_rect(&rect)));
            let cells = match window {
                Some(window) => window.cells()
                    .filter(|&(col, row)| polygons.intersects(&grid.cell_rect(col, row)))
                    .map(|(col, row)| grid.pixel_index(col, row))
                    .collect(),
                None => Vec::new(),
            };
            CellSample::Cells(cells)
        },
    }
}
