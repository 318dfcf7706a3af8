//! Zone rasters for polygon extraction
//!
//! Polygons are burned onto the stack grid by synthetic identifier; the
//! resulting raster and the dataset it was burned from are kept in a
//! scratch directory for the duration of one extraction call.

mod raster;
pub mod scratch;
pub mod zone_file;

pub use self::raster::{rasterize, ZoneDepth, ZoneRaster};
pub use self::scratch::ScratchSpace;
