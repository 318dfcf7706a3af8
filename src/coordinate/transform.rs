//! Coordinate transformation functionality

use super::crs::CoordinateSystem;
use crate::errors::{ExtractError, ExtractResult};
use geo::{coord, Coord, Geometry, MapCoords};
use proj4rs::proj::Proj;

/// Transformer between two coordinate systems
///
/// Both projections are resolved once through the EPSG definitions
/// database; geographic frames are taken and returned in degrees.
pub struct CoordinateTransformer {
    from: CoordinateSystem,
    to: CoordinateSystem,
    source: Proj,
    target: Proj,
}

impl CoordinateTransformer {
    /// Create a transformer, failing when either frame has no known definition
    pub fn new(from: CoordinateSystem, to: CoordinateSystem) -> ExtractResult<Self> {
        Ok(CoordinateTransformer {
            from,
            to,
            source: Self::projection(&from)?,
            target: Self::projection(&to)?,
        })
    }

    fn projection(crs: &CoordinateSystem) -> ExtractResult<Proj> {
        let definition = crs.proj_string().ok_or_else(|| ExtractError::InvalidInput(format!(
            "Unsupported coordinate system {}: no projection definition",
            crs.description()
        )))?;

        Proj::from_proj_string(definition).map_err(|e| ExtractError::InvalidInput(format!(
            "Invalid projection for {}: {:?}",
            crs.description(), e
        )))
    }

    /// Transform a coordinate from the source to the target frame
    pub fn transform_coord(&self, c: Coord<f64>) -> ExtractResult<Coord<f64>> {
        if self.from == self.to {
            return Ok(c);
        }

        // proj4rs works in radians on geographic frames
        let mut point = if self.from.is_geographic() {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };

        proj4rs::transform::transform(&self.source, &self.target, &mut point).map_err(|e| {
            ExtractError::InvalidInput(format!(
                "Coordinate ({}, {}) cannot be transformed from {} to {}: {:?}",
                c.x, c.y, self.from.description(), self.to.description(), e
            ))
        })?;

        if self.to.is_geographic() {
            Ok(coord! { x: point.0.to_degrees(), y: point.1.to_degrees() })
        } else {
            Ok(coord! { x: point.0, y: point.1 })
        }
    }

    /// Transform every vertex of a geometry
    pub fn transform_geometry(&self, geometry: &Geometry<f64>) -> ExtractResult<Geometry<f64>> {
        if self.from == self.to {
            return Ok(geometry.clone());
        }

        geometry.try_map_coords(|c| self.transform_coord(c))
    }
}
