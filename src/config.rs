//! Extraction options
//!
//! Options can be built in code or loaded from TOML:
//!
//! ```toml
//! start_date = "2010-01-01"
//! end_date = "2010-06-30"
//! id_field = "field_id"
//! aggregation = "median"
//! out_format = "table"
//! small = true
//! small_method = "full"
//! skip_missing = true
//! verbose = false
//! scratch_dir = "/var/tmp"
//! ```
//!
//! Format and small-polygon method names are kept as given here and
//! normalised during validation, where unknown values fall back to their
//! defaults with a warning.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::errors::ExtractResult;
use crate::extractor::aggregate::Aggregator;

/// Shape of the extraction result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutFormat {
    /// Plain table with a leading date column
    Table,
    /// Date-indexed time series
    TimeSeries,
}

impl OutFormat {
    pub const DEFAULT: OutFormat = OutFormat::TimeSeries;

    pub fn parse(name: &str) -> Option<OutFormat> {
        match name.trim().to_lowercase().as_str() {
            "table" | "dframe" | "data.frame" => Some(OutFormat::Table),
            "timeseries" | "time_series" | "xts" => Some(OutFormat::TimeSeries),
            _ => None,
        }
    }
}

impl fmt::Display for OutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutFormat::Table => write!(f, "table"),
            OutFormat::TimeSeries => write!(f, "timeseries"),
        }
    }
}

/// How polygons that own no zone cell are re-extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallMethod {
    /// Pixel under the polygon centroid
    Centroid,
    /// Mean of every pixel the polygon touches
    Full,
}

impl SmallMethod {
    pub const DEFAULT: SmallMethod = SmallMethod::Centroid;

    pub fn parse(name: &str) -> Option<SmallMethod> {
        match name.trim().to_lowercase().as_str() {
            "centroid" | "centroids" => Some(SmallMethod::Centroid),
            "full" => Some(SmallMethod::Full),
            _ => None,
        }
    }
}

impl fmt::Display for SmallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmallMethod::Centroid => write!(f, "centroid"),
            SmallMethod::Full => write!(f, "full"),
        }
    }
}

/// Options of one extraction call
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractOptions {
    /// First date to extract, defaults to the earliest band
    pub start_date: Option<String>,
    /// Last date to extract, defaults to the latest band
    pub end_date: Option<String>,
    /// Attribute naming the output columns
    pub id_field: Option<String>,
    /// Name of a built-in aggregation
    #[serde(alias = "aggregation_fn", alias = "fun")]
    pub aggregation: String,
    /// `table` or `timeseries`
    pub out_format: String,
    /// Re-extract polygons too small to own a cell
    pub small: bool,
    /// `centroid` or `full`
    pub small_method: String,
    /// Drop missing values before aggregating
    #[serde(alias = "na_rm")]
    pub skip_missing: bool,
    /// Show progress while iterating dates
    pub verbose: bool,
    /// Parent of the per-call scratch directory, defaults to the system temp dir
    pub scratch_dir: Option<PathBuf>,
    /// Custom aggregation, takes precedence over `aggregation`
    #[serde(skip)]
    pub aggregator: Option<Arc<dyn Aggregator>>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            start_date: None,
            end_date: None,
            id_field: None,
            aggregation: "mean".to_string(),
            out_format: OutFormat::DEFAULT.to_string(),
            small: true,
            small_method: SmallMethod::DEFAULT.to_string(),
            skip_missing: true,
            verbose: false,
            scratch_dir: None,
            aggregator: None,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        ExtractOptions::default()
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(content: &str) -> ExtractResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ExtractResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn with_dates(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_date = start.map(str::to_string);
        self.end_date = end.map(str::to_string);
        self
    }

    pub fn with_id_field(mut self, field: &str) -> Self {
        self.id_field = Some(field.to_string());
        self
    }

    pub fn with_aggregation(mut self, name: &str) -> Self {
        self.aggregation = name.to_string();
        self
    }

    pub fn with_aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn with_out_format(mut self, format: OutFormat) -> Self {
        self.out_format = format.to_string();
        self
    }

    pub fn with_small(mut self, small: bool, method: SmallMethod) -> Self {
        self.small = small;
        self.small_method = method.to_string();
        self
    }

    pub fn with_skip_missing(mut self, skip: bool) -> Self {
        self.skip_missing = skip;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_scratch_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.scratch_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.aggregation, "mean");
        assert_eq!(OutFormat::parse(&options.out_format), Some(OutFormat::TimeSeries));
        assert_eq!(SmallMethod::parse(&options.small_method), Some(SmallMethod::Centroid));
        assert!(options.small);
        assert!(options.skip_missing);
    }

    #[test]
    fn test_from_toml() {
        let options = ExtractOptions::from_toml_str(r#"
            start_date = "2010-01-01"
            id_field = "name"
            fun = "max"
            out_format = "table"
            small_method = "full"
            na_rm = false
            scratch_dir = "/var/tmp"
        "#).unwrap();

        assert_eq!(options.start_date.as_deref(), Some("2010-01-01"));
        assert_eq!(options.end_date, None);
        assert_eq!(options.aggregation, "max");
        assert_eq!(options.out_format, "table");
        assert_eq!(options.small_method, "full");
        assert!(!options.skip_missing);
        assert!(options.small);
        assert_eq!(options.scratch_dir, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    fn test_unknown_toml_key_is_rejected() {
        let err = ExtractOptions::from_toml_str("colour = \"blue\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_format_aliases() {
        assert_eq!(OutFormat::parse("xts"), Some(OutFormat::TimeSeries));
        assert_eq!(OutFormat::parse("DFrame"), Some(OutFormat::Table));
        assert_eq!(OutFormat::parse("parquet"), None);
        assert_eq!(SmallMethod::parse("centroids"), Some(SmallMethod::Centroid));
    }
}
