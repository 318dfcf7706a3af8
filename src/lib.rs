pub mod errors;
pub mod config;
pub mod utils;
pub mod coordinate;
pub mod raster;
pub mod vector;
pub mod zone;
pub mod validation;
pub mod extractor;
pub mod output;
pub mod api;

pub use crate::api::ZonalKit;

pub use config::{ExtractOptions, OutFormat, SmallMethod};
pub use errors::{ErrorKind, ExtractError, ExtractResult};
pub use coordinate::{BoundingBox, CoordinateSystem};
pub use raster::{GeoTransform, GridSpec, RasterLayer, RasterSource, RasterTimeStack};
pub use vector::{AttributeValue, Feature, SpatialFeatureSet, SpatialInput};
pub use extractor::{extract_time_series, Aggregation, Aggregator, FnAggregator};
pub use output::{Column, ColumnOrigin, Extraction, ExtractionOutput, OutputTable, TimeSeries};
