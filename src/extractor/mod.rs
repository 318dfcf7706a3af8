//! Time-series extraction from a raster stack
//!
//! The pipeline validates its inputs, tags and crops the features against
//! the stack grid, branches into the point/line or polygon path by geometry
//! kind and assembles the keyed columns into the requested output shape.

pub mod aggregate;
pub mod point_line;
pub mod polygon;
pub mod small;

use log::info;

use crate::config::ExtractOptions;
use crate::errors::ExtractResult;
use crate::output::{assemble, ColumnSet, Extraction};
use crate::raster::RasterSource;
use crate::utils::diagnostics::Diagnostics;
use crate::utils::progress::ProgressTracker;
use crate::validation;
use crate::vector::{prepare::prepare_features, GeometryKind, SpatialInput};

pub use self::aggregate::{Aggregation, Aggregator, FnAggregator};

/// Extract one value per feature and selected date
///
/// # Arguments
/// * `stack` - Raster stack with one dated band per acquisition
/// * `spatial` - Features, or a path to a GeoJSON feature collection
/// * `options` - Extraction options
///
/// # Returns
/// The extraction with its warnings. `output` is `None` when no band falls
/// inside the date window. Fatal input problems are returned as errors.
pub fn extract_time_series<S: RasterSource + ?Sized>(
    stack: &S,
    spatial: impl Into<SpatialInput>,
    options: &ExtractOptions,
) -> ExtractResult<Extraction> {
    let mut diagnostics = Diagnostics::new();
    let params = validation::validate(stack, spatial.into(), options, &mut diagnostics)?;

    if params.bands.is_empty() {
        diagnostics.warn(format!("No raster band is dated between {} and {}; nothing to extract", params.start, params.end));
        return Ok(Extraction { output: None, warnings: diagnostics.into_warnings() });
    }

    let grid = stack.grid();
    let prepared = prepare_features(&params.features, grid, &mut diagnostics)?;

    let mut columns = ColumnSet::new(prepared.original_count, params.bands.len());
    if !prepared.outside.is_empty() {
        columns.mark_outside(&prepared.outside);
        diagnostics.warn(format!(
            "{} of {} features lie outside the raster extent; their values are missing",
            prepared.outside.len(),
            prepared.original_count
        ));
    }

    if !prepared.inside.is_empty() {
        let progress = ProgressTracker::new(params.bands.len() as u64, "Extracting dates", params.verbose);
        match prepared.kind {
            GeometryKind::Polygon => {
                polygon::extract_zonal(stack, &prepared.inside, &params, &mut columns, &mut diagnostics, &progress)?
            },
            GeometryKind::Point | GeometryKind::Line => {
                point_line::extract_sampled(stack, &prepared.inside, &params, &mut columns, &progress)?
            },
        }
        progress.finish();
    }

    let dates = params.bands.iter().map(|b| b.date).collect();
    let output = assemble(dates, columns, &params.names, params.out_format);
    info!("Extracted {} dates for {} features", output.row_count(), output.column_count());

    Ok(Extraction { output: Some(output), warnings: diagnostics.into_warnings() })
}
