//! Zonal extraction for polygon features
//!
//! Polygons are written out with their synthetic identifier, read back and
//! burned onto the stack grid. The zone raster goes through a scratch
//! GeoTIFF so the ids the loop aggregates by are exactly those that were
//! persisted. Polygons that end up owning no cell are either re-extracted
//! directly or left missing.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::SmallMethod;
use crate::errors::{ExtractError, ExtractResult};
use crate::output::{ColumnOrigin, ColumnSet};
use crate::raster::{GridSpec, RasterSource};
use crate::utils::diagnostics::Diagnostics;
use crate::utils::progress::ProgressTracker;
use crate::validation::ResolvedParams;
use crate::vector::{geojson, Shape, TaggedFeature};
use crate::zone::{rasterize, zone_file, ScratchSpace, ZoneRaster};
use super::aggregate::{Aggregation, Aggregator};
use super::point_line::CellSample;
use super::small::small_polygon_sample;

/// Burn the tagged polygons through the scratch space and read the zone
/// raster back, checking it still lines up with the stack grid
pub fn build_zone_raster(features: &[TaggedFeature], grid: &GridSpec, scratch: &ScratchSpace) -> ExtractResult<(Vec<TaggedFeature>, ZoneRaster)> {
    let vector_path = scratch.vector_path();
    geojson::write_tagged(&vector_path, features)?;
    let tagged = geojson::read_tagged(&vector_path)?;

    let zone = rasterize(&tagged, grid);
    let raster_path = scratch.raster_path();
    zone_file::write_zone_raster(&raster_path, &zone, &grid.transform)?;
    let (zone, transform) = zone_file::read_zone_raster(&raster_path)?;

    let zone_grid = GridSpec::new(zone.width, zone.height, transform, grid.crs);
    if !grid.is_aligned_with(&zone_grid) {
        return Err(ExtractError::GenericError(format!(
            "Zone raster {}x{} does not line up with the {}x{} stack grid",
            zone.width, zone.height, grid.width, grid.height
        )));
    }

    Ok((tagged, zone))
}

/// Aggregate every polygon zone on every selected date
///
/// # Arguments
/// * `stack` - Raster source
/// * `features` - Cropped, tagged polygons
/// * `params` - Resolved parameters
/// * `columns` - Column set receiving the values
/// * `diagnostics` - Warning channel
/// * `progress` - Per-date progress
pub fn extract_zonal<S: RasterSource + ?Sized>(
    stack: &S,
    features: &[TaggedFeature],
    params: &ResolvedParams,
    columns: &mut ColumnSet,
    diagnostics: &mut Diagnostics,
    progress: &ProgressTracker,
) -> ExtractResult<()> {
    let grid = stack.grid();
    let scratch = ScratchSpace::new(params.scratch_dir.as_deref())?;
    let (tagged, zone) = build_zone_raster(features, grid, &scratch)?;

    let owned = zone.owned_pixels();
    let realized = zone.realized_zones();
    for &id in &realized {
        columns.set_origin(id, ColumnOrigin::Zonal);
    }
    info!("{} of {} polygons own zone cells ({} cells in total)", realized.len(), tagged.len(), owned.len());

    let unrealized_set = unrealized_ids(&tagged, &zone);
    let unrealized: Vec<&TaggedFeature> = tagged.iter().filter(|f| unrealized_set.contains(&f.id)).collect();
    let small: Vec<(u32, CellSample)> = if unrealized.is_empty() {
        Vec::new()
    } else if params.small {
        debug!("Re-extracting {} small polygons by {}", unrealized.len(), params.small_method);
        unrealized.iter()
            .filter_map(|f| match &f.shape {
                Shape::Polygons(mp) => Some((f.id, small_polygon_sample(mp, grid, params.small_method))),
                _ => None,
            })
            .collect()
    } else {
        let names: Vec<&str> = unrealized.iter()
            .filter_map(|f| params.names.get(f.id as usize - 1).map(String::as_str))
            .collect();
        diagnostics.warn(format!(
            "{} polygons are too small to own a raster cell and were left missing: {}",
            unrealized.len(),
            names.join(", ")
        ));
        Vec::new()
    };
    for (id, _) in &small {
        columns.set_origin(*id, ColumnOrigin::SmallPolygon);
    }

    let aggregator = params.aggregator.as_ref();
    let full_mean = Aggregation::Mean;
    let small_aggregator: &dyn Aggregator = match params.small_method {
        SmallMethod::Full => &full_mean,
        SmallMethod::Centroid => aggregator,
    };

    for (row, band) in params.bands.iter().enumerate() {
        let values = stack.read_band(band.index)?;

        let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for &(index, id) in &owned {
            groups.entry(id).or_default().push(values[index]);
        }
        for (id, group) in &groups {
            columns.set_value(*id, row, aggregator.aggregate(group, params.skip_missing));
        }

        for (id, sample) in &small {
            columns.set_value(*id, row, sample.read(&values, small_aggregator, params.skip_missing));
        }

        progress.increment(1);
    }

    Ok(())
}

/// Synthetic identifiers of polygons that own no zone cell
pub fn unrealized_ids(features: &[TaggedFeature], zone: &ZoneRaster) -> BTreeSet<u32> {
    let realized = zone.realized_zones();
    features.iter().map(|f| f.id).filter(|id| !realized.contains(id)).collect()
}
