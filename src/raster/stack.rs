//! Multi-date raster stacks
//!
//! The extractor reads rasters through the [`RasterSource`] trait, which
//! exposes just what it needs: the grid, the band date labels and one band
//! of pixel values at a time. [`RasterTimeStack`] is the in-memory
//! implementation.

use crate::errors::{ExtractError, ExtractResult};
use super::grid::GridSpec;

/// Read access to a multi-date single-variable raster stack
pub trait RasterSource {
    /// Grid shared by every band
    fn grid(&self) -> &GridSpec;

    /// Number of bands in native order
    fn band_count(&self) -> usize;

    /// Date metadata of a band, if any
    fn band_label(&self, band: usize) -> Option<&str>;

    /// Number of values a band holds, 0 for a missing band
    fn band_len(&self, band: usize) -> usize;

    /// Pixel values of a band in row-major order, nodata as `NaN`
    fn read_band(&self, band: usize) -> ExtractResult<Vec<f64>>;
}

/// One dated band of a stack
#[derive(Debug, Clone)]
pub struct RasterLayer {
    /// Date metadata (any label the date parser understands)
    pub label: Option<String>,
    /// Value marking missing pixels
    pub nodata: Option<f64>,
    /// Row-major pixel values
    pub values: Vec<f64>,
}

impl RasterLayer {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        RasterLayer {
            label: Some(label.into()),
            nodata: None,
            values,
        }
    }

    /// Layer without date metadata
    pub fn unlabeled(values: Vec<f64>) -> Self {
        RasterLayer {
            label: None,
            nodata: None,
            values,
        }
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

/// In-memory raster stack
#[derive(Debug, Clone)]
pub struct RasterTimeStack {
    grid: GridSpec,
    layers: Vec<RasterLayer>,
}

impl RasterTimeStack {
    pub fn new(grid: GridSpec) -> Self {
        RasterTimeStack {
            grid,
            layers: Vec::new(),
        }
    }

    /// Append a layer, keeping native order
    pub fn push_layer(&mut self, layer: RasterLayer) {
        self.layers.push(layer);
    }

    pub fn with_layer(mut self, layer: RasterLayer) -> Self {
        self.push_layer(layer);
        self
    }

    pub fn layers(&self) -> &[RasterLayer] {
        &self.layers
    }
}

impl RasterSource for RasterTimeStack {
    fn grid(&self) -> &GridSpec {
        &self.grid
    }

    fn band_count(&self) -> usize {
        self.layers.len()
    }

    fn band_label(&self, band: usize) -> Option<&str> {
        self.layers.get(band).and_then(|layer| layer.label.as_deref())
    }

    fn band_len(&self, band: usize) -> usize {
        self.layers.get(band).map_or(0, |layer| layer.values.len())
    }

    fn read_band(&self, band: usize) -> ExtractResult<Vec<f64>> {
        let layer = self.layers.get(band)
            .ok_or_else(|| ExtractError::InvalidInput(format!("Band {} does not exist", band)))?;

        if layer.values.len() != self.grid.pixel_count() {
            return Err(ExtractError::InvalidInput(format!(
                "Band {} holds {} values, grid expects {}",
                band, layer.values.len(), self.grid.pixel_count()
            )));
        }

        let values = match layer.nodata {
            Some(nodata) => layer.values.iter()
                .map(|&v| if v == nodata { f64::NAN } else { v })
                .collect(),
            None => layer.values.clone(),
        };
        Ok(values)
    }
}
