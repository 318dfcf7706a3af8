//! Reprojection, identity tagging and cropping of feature sets
//!
//! Every feature receives its synthetic identifier (`1..=N`, user order)
//! before it is cropped. Cropping may drop features or change their
//! geometry; the identifier is the only thing later stages use to find
//! their way back to the original feature.

use geo::{BooleanOps, BoundingRect, MultiPoint, MultiPolygon};
use log::{debug, info};

use crate::coordinate::{BoundingBox, CoordinateTransformer};
use crate::errors::{ExtractError, ExtractResult};
use crate::raster::GridSpec;
use crate::utils::diagnostics::Diagnostics;
use super::feature::{GeometryKind, Shape, SpatialFeatureSet};

/// A feature reduced to its synthetic identifier and geometry
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedFeature {
    pub id: u32,
    pub shape: Shape,
}

/// Features ready for extraction
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// Geometry family of the whole set
    pub kind: GeometryKind,
    /// Number of features before cropping
    pub original_count: usize,
    /// Cropped features that still touch the raster, ascending id
    pub inside: Vec<TaggedFeature>,
    /// Identifiers of features that fell entirely outside the raster
    pub outside: Vec<u32>,
}

/// Reproject, tag and crop a feature set against a raster grid
///
/// # Arguments
/// * `set` - Features in user order
/// * `grid` - Target raster grid
/// * `diagnostics` - Warning channel
///
/// # Returns
/// The prepared features, or an error for unsupported geometries or
/// reference frames
pub fn prepare_features(set: &SpatialFeatureSet, grid: &GridSpec, diagnostics: &mut Diagnostics) -> ExtractResult<PreparedFeatures> {
    let kind = set.kind()?;
    let original_count = set.len();
    if u32::try_from(original_count).is_err() {
        return Err(ExtractError::InvalidInput(format!("Too many features: {}", original_count)));
    }

    let reprojection = match (set.crs, grid.crs) {
        (Some(from), Some(to)) if from != to => {
            info!("Reprojecting features from {} to {}", from.description(), to.description());
            Some(CoordinateTransformer::new(from, to)?)
        },
        (Some(_), None) | (None, Some(_)) => {
            diagnostics.warn("Features or raster lack a reference frame; assuming both share one");
            None
        },
        _ => None,
    };

    let extent = grid.extent();
    let mut inside = Vec::with_capacity(original_count);
    let mut outside = Vec::new();

    for (index, feature) in set.features.iter().enumerate() {
        let id = index as u32 + 1;

        let geometry = match &reprojection {
            Some(transformer) => transformer.transform_geometry(&feature.geometry)?,
            None => feature.geometry.clone(),
        };
        let shape = Shape::from_geometry(geometry)?;

        match crop_shape(shape, &extent) {
            Some(shape) => inside.push(TaggedFeature { id, shape }),
            None => outside.push(id),
        }
    }

    debug!("{} features inside the raster extent, {} outside", inside.len(), outside.len());

    Ok(PreparedFeatures {
        kind,
        original_count,
        inside,
        outside,
    })
}

/// Crop a shape to an extent, `None` when nothing is left
pub fn crop_shape(shape: Shape, extent: &BoundingBox) -> Option<Shape> {
    let cropped = match shape {
        Shape::Points(mp) => {
            Shape::Points(MultiPoint(mp.0.into_iter().filter(|p| extent.contains(&p.0)).collect()))
        },
        Shape::Lines(mls) => {
            let bounds = BoundingBox::from_rect(&mls.bounding_rect()?);
            if extent.contains_bbox(&bounds) {
                Shape::Lines(mls)
            } else if !extent.intersects(&bounds) {
                return None;
            } else {
                Shape::Lines(extent.to_polygon().clip(&mls, false))
            }
        },
        Shape::Polygons(mp) => {
            let bounds = BoundingBox::from_rect(&mp.bounding_rect()?);
            if extent.contains_bbox(&bounds) {
                Shape::Polygons(mp)
            } else if !extent.intersects(&bounds) {
                return None;
            } else {
                Shape::Polygons(mp.intersection(&MultiPolygon(vec![extent.to_polygon()])))
            }
        },
    };

    if cropped.is_empty() {
        None
    } else {
        Some(cropped)
    }
}
