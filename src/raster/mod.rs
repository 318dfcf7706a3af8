//! Raster grids and multi-date stacks

mod grid;
mod stack;
mod window;

pub use self::grid::{GeoTransform, GridSpec};
pub use self::stack::{RasterLayer, RasterSource, RasterTimeStack};
pub use self::window::PixelWindow;
