//! Zone rasters: synthetic identifiers burned onto the stack grid

use std::collections::BTreeSet;

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use log::debug;

use crate::coordinate::BoundingBox;
use crate::raster::GridSpec;
use crate::vector::{Shape, TaggedFeature};

/// Sample width of a zone raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneDepth {
    U8,
    U16,
    U32,
}

impl ZoneDepth {
    /// Smallest width that holds `max_id`
    pub fn for_max_id(max_id: u32) -> ZoneDepth {
        if max_id <= u8::MAX as u32 {
            ZoneDepth::U8
        } else if max_id <= u16::MAX as u32 {
            ZoneDepth::U16
        } else {
            ZoneDepth::U32
        }
    }

    pub fn bits(&self) -> u16 {
        match self {
            ZoneDepth::U8 => 8,
            ZoneDepth::U16 => 16,
            ZoneDepth::U32 => 32,
        }
    }

    pub fn bytes(&self) -> usize {
        self.bits() as usize / 8
    }

    pub fn from_bits(bits: u16) -> Option<ZoneDepth> {
        match bits {
            8 => Some(ZoneDepth::U8),
            16 => Some(ZoneDepth::U16),
            32 => Some(ZoneDepth::U32),
            _ => None,
        }
    }
}

/// Single-band grid of owning zone identifiers, `0` for unowned cells
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRaster {
    pub width: usize,
    pub height: usize,
    pub depth: ZoneDepth,
    pub ids: Vec<u32>,
}

impl ZoneRaster {
    /// Owned cells as `(pixel index, zone id)`, in pixel order
    pub fn owned_pixels(&self) -> Vec<(usize, u32)> {
        self.ids.iter()
            .enumerate()
            .filter(|&(_, &id)| id != 0)
            .map(|(index, &id)| (index, id))
            .collect()
    }

    /// Distinct zone identifiers present in the grid, ascending
    pub fn realized_zones(&self) -> BTreeSet<u32> {
        self.ids.iter().copied().filter(|&id| id != 0).collect()
    }
}

/// Burn polygon identifiers onto a grid
///
/// A cell belongs to a polygon when its centre lies inside it. Features are
/// burned in the order given, so a later feature takes over cells it shares
/// with an earlier one.
///
/// # Arguments
/// * `features` - Tagged polygon features
/// * `grid` - Target grid
///
/// # Returns
/// The zone raster, sized to the grid
pub fn rasterize(features: &[TaggedFeature], grid: &GridSpec) -> ZoneRaster {
    let max_id = features.iter().map(|f| f.id).max().unwrap_or(0);
    let depth = ZoneDepth::for_max_id(max_id);
    let mut ids = vec![0u32; grid.pixel_count()];

    for feature in features {
        let polygons: &MultiPolygon<f64> = match &feature.shape {
            Shape::Polygons(mp) => mp,
            _ => continue,
        };
        let Some(rect) = polygons.bounding_rect() else {
            continue;
        };
        let Some(window) = grid.window_for(&BoundingBox::from_rect(&rect)) else {
            continue;
        };

        for (col, row) in window.cells() {
            let center = Point(grid.pixel_center(col, row));
            if polygons.contains(&center) {
                ids[grid.pixel_index(col, row)] = feature.id;
            }
        }
    }

    debug!("Rasterized {} features at {}-bit depth", features.len(), depth.bits());

    ZoneRaster {
        width: grid.width,
        height: grid.height,
        depth,
        ids,
    }
}
