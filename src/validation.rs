//! Input validation and parameter resolution
//!
//! Turns the raw inputs of an extraction call into a fully resolved
//! parameter set. Fatal problems (bad stack, bad dates, unreadable
//! features) fail fast; recoverable ones are normalised and reported on
//! the warning channel.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};

use crate::config::{ExtractOptions, OutFormat, SmallMethod};
use crate::errors::{ExtractError, ExtractResult};
use crate::extractor::aggregate::{Aggregation, Aggregator};
use crate::raster::RasterSource;
use crate::utils::date_utils;
use crate::utils::diagnostics::Diagnostics;
use crate::vector::{geojson, SpatialFeatureSet, SpatialInput};

/// A stack band picked for extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedBand {
    /// Band position in the stack
    pub index: usize,
    /// Band date
    pub date: NaiveDate,
}

/// Validated, normalised parameters of one extraction call
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    /// Features in user order
    pub features: SpatialFeatureSet,
    /// Bands inside the date window, ascending by date
    pub bands: Vec<SelectedBand>,
    /// First date of the window
    pub start: NaiveDate,
    /// Last date of the window
    pub end: NaiveDate,
    /// Column name of each feature, indexed by synthetic id - 1
    pub names: Vec<String>,
    /// Identifier field actually used for naming
    pub id_field: Option<String>,
    pub aggregator: Arc<dyn Aggregator>,
    pub out_format: OutFormat,
    pub small: bool,
    pub small_method: SmallMethod,
    pub skip_missing: bool,
    pub verbose: bool,
    /// Parent of the scratch directory
    pub scratch_dir: Option<PathBuf>,
}

/// Parse the date of every band in native order
///
/// Every band must also hold exactly one value per grid cell.
pub fn stack_dates<S: RasterSource + ?Sized>(stack: &S) -> ExtractResult<Vec<NaiveDate>> {
    if stack.band_count() == 0 {
        return Err(ExtractError::InvalidInput("Raster stack has no bands".to_string()));
    }

    let expected = stack.grid().pixel_count();
    (0..stack.band_count()).map(|band| {
        let len = stack.band_len(band);
        if len != expected {
            return Err(ExtractError::InvalidInput(format!(
                "Band {} holds {} values, grid expects {}",
                band + 1, len, expected
            )));
        }
        let label = stack.band_label(band).ok_or_else(|| {
            ExtractError::InvalidInput(format!("Band {} carries no date", band + 1))
        })?;
        date_utils::parse_date(label).ok_or_else(|| {
            ExtractError::InvalidInput(format!("Band {} date '{}' is not a valid date", band + 1, label))
        })
    }).collect()
}

/// Resolve the inclusive date window, defaulting to the stack range
pub fn resolve_window(dates: &[NaiveDate], start: Option<&str>, end: Option<&str>) -> ExtractResult<(NaiveDate, NaiveDate)> {
    let first = dates.iter().min().copied()
        .ok_or_else(|| ExtractError::InvalidInput("Raster stack has no dates".to_string()))?;
    let last = dates.iter().max().copied().unwrap_or(first);

    let start = match start {
        Some(s) => date_utils::coerce_date(s)?,
        None => first,
    };
    let end = match end {
        Some(e) => date_utils::coerce_date(e)?,
        None => last,
    };

    if start > end {
        return Err(ExtractError::InvalidDateRange(start.to_string(), end.to_string()));
    }
    Ok((start, end))
}

/// Bands whose date falls in the window, ascending by date
///
/// The sort is stable, so bands sharing a date keep their stack order.
pub fn select_bands(dates: &[NaiveDate], start: NaiveDate, end: NaiveDate) -> Vec<SelectedBand> {
    let mut bands: Vec<SelectedBand> = dates.iter()
        .enumerate()
        .filter(|(_, d)| **d >= start && **d <= end)
        .map(|(index, &date)| SelectedBand { index, date })
        .collect();
    bands.sort_by_key(|b| b.date);
    bands
}

/// Column names for every feature
///
/// Uses the identifier field when every feature has it and its values are
/// unique; otherwise warns and falls back to `1..N`.
///
/// # Returns
/// The names in feature order and the field actually used
pub fn resolve_names(set: &SpatialFeatureSet, id_field: Option<&str>, diagnostics: &mut Diagnostics) -> (Vec<String>, Option<String>) {
    let fallback = || (1..=set.len()).map(|i| i.to_string()).collect::<Vec<_>>();

    let Some(field) = id_field else {
        return (fallback(), None);
    };

    let values: Option<Vec<String>> = set.features.iter()
        .map(|f| f.attribute(field).map(|v| v.to_string()))
        .collect();

    let Some(values) = values else {
        diagnostics.warn(format!(
            "Identifier field '{}' is missing from the features; columns are named by feature index",
            field
        ));
        return (fallback(), None);
    };

    let unique: HashSet<&String> = values.iter().collect();
    if unique.len() != values.len() {
        diagnostics.warn(format!(
            "Identifier field '{}' has duplicate values; columns are named by feature index",
            field
        ));
        return (fallback(), None);
    }

    (values, Some(field.to_string()))
}

/// Validate and resolve all inputs of an extraction call
///
/// # Arguments
/// * `stack` - Raster stack with dated bands
/// * `spatial` - Features or a path to load them from
/// * `options` - Raw options
/// * `diagnostics` - Warning channel
///
/// # Returns
/// The resolved parameters, or the first fatal validation error
pub fn validate<S: RasterSource + ?Sized>(
    stack: &S,
    spatial: SpatialInput,
    options: &ExtractOptions,
    diagnostics: &mut Diagnostics,
) -> ExtractResult<ResolvedParams> {
    let dates = stack_dates(stack)?;
    let (start, end) = resolve_window(&dates, options.start_date.as_deref(), options.end_date.as_deref())?;
    let bands = select_bands(&dates, start, end);
    debug!("Date window {} to {} selects {} of {} bands", start, end, bands.len(), dates.len());

    let small_method = SmallMethod::parse(&options.small_method).unwrap_or_else(|| {
        diagnostics.warn(format!(
            "Unknown small_method '{}'; using '{}'",
            options.small_method, SmallMethod::DEFAULT
        ));
        SmallMethod::DEFAULT
    });
    let out_format = OutFormat::parse(&options.out_format).unwrap_or_else(|| {
        diagnostics.warn(format!(
            "Unknown out_format '{}'; using '{}'",
            options.out_format, OutFormat::DEFAULT
        ));
        OutFormat::DEFAULT
    });

    let aggregator: Arc<dyn Aggregator> = match &options.aggregator {
        Some(custom) => Arc::clone(custom),
        None => Arc::new(Aggregation::parse(&options.aggregation)?),
    };

    let features = match spatial {
        SpatialInput::Features(set) => set,
        SpatialInput::Path(path) => geojson::load_features(&path)?,
    };
    let kind = features.kind()?;
    info!("Extracting {} {} features with {}", features.len(), kind, aggregator.name());

    let (names, id_field) = resolve_names(&features, options.id_field.as_deref(), diagnostics);

    Ok(ResolvedParams {
        features,
        bands,
        start,
        end,
        names,
        id_field,
        aggregator,
        out_format,
        small: options.small,
        small_method,
        skip_missing: options.skip_missing,
        verbose: options.verbose,
        scratch_dir: options.scratch_dir.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::raster::{GeoTransform, GridSpec, RasterLayer, RasterTimeStack};
    use crate::vector::Feature;
    use geo::point;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stack(labels: &[&str]) -> RasterTimeStack {
        let grid = GridSpec::new(1, 1, GeoTransform::new(0.0, 1.0, 1.0, -1.0), None);
        labels.iter().fold(RasterTimeStack::new(grid), |s, l| s.with_layer(RasterLayer::new(*l, vec![1.0])))
    }

    fn points(n: usize) -> SpatialFeatureSet {
        (0..n).fold(SpatialFeatureSet::new(), |s, i| {
            s.with_feature(Feature::new(point! { x: 0.5, y: 0.5 }).with_attribute("code", format!("f{}", i % 2)))
        })
    }

    #[test]
    fn test_stack_dates_require_labels() {
        assert_eq!(stack(&[]).band_count(), 0);
        assert_eq!(stack_dates(&stack(&[])).unwrap_err().kind(), ErrorKind::Type);
        assert_eq!(stack_dates(&stack(&["2010-01-01", "someday"])).unwrap_err().kind(), ErrorKind::Type);

        let grid = GridSpec::new(1, 1, GeoTransform::new(0.0, 1.0, 1.0, -1.0), None);
        let unlabeled = RasterTimeStack::new(grid).with_layer(RasterLayer::unlabeled(vec![1.0]));
        assert_eq!(stack_dates(&unlabeled).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_stack_dates_check_band_size() {
        let grid = GridSpec::new(2, 2, GeoTransform::new(0.0, 1.0, 2.0, -1.0), None);
        let short = RasterTimeStack::new(grid)
            .with_layer(RasterLayer::new("2010-01-01", vec![1.0; 4]))
            .with_layer(RasterLayer::new("2010-01-02", vec![1.0]));

        let err = stack_dates(&short).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("Band 2"));
    }

    #[test]
    fn test_window_defaults_and_errors() {
        let dates = vec![ymd(2010, 1, 3), ymd(2010, 1, 1), ymd(2010, 1, 2)];
        assert_eq!(resolve_window(&dates, None, None).unwrap(), (ymd(2010, 1, 1), ymd(2010, 1, 3)));
        assert_eq!(
            resolve_window(&dates, Some("2010.01.02"), None).unwrap(),
            (ymd(2010, 1, 2), ymd(2010, 1, 3))
        );
        assert_eq!(resolve_window(&dates, Some("2010-01-03"), Some("2010-01-01")).unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(resolve_window(&dates, Some("tomorrow"), None).unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_select_bands_sorts_by_date() {
        let dates = vec![ymd(2010, 1, 3), ymd(2010, 1, 1), ymd(2010, 1, 2)];
        let bands = select_bands(&dates, ymd(2010, 1, 1), ymd(2010, 1, 2));
        assert_eq!(bands, vec![
            SelectedBand { index: 1, date: ymd(2010, 1, 1) },
            SelectedBand { index: 2, date: ymd(2010, 1, 2) },
        ]);
    }

    #[test]
    fn test_names_fall_back_on_bad_field() {
        let mut diagnostics = Diagnostics::new();
        let (names, field) = resolve_names(&points(2), Some("code"), &mut diagnostics);
        assert_eq!(names, vec!["f0", "f1"]);
        assert_eq!(field.as_deref(), Some("code"));
        assert!(diagnostics.warnings().is_empty());

        let (names, field) = resolve_names(&points(3), Some("code"), &mut diagnostics);
        assert_eq!(names, vec!["1", "2", "3"]);
        assert_eq!(field, None);

        let (_, field) = resolve_names(&points(2), Some("absent"), &mut diagnostics);
        assert_eq!(field, None);
        assert_eq!(diagnostics.warnings().len(), 2);
    }

    #[test]
    fn test_unknown_options_are_normalised() {
        let options = ExtractOptions {
            out_format: "spreadsheet".to_string(),
            small_method: "exact".to_string(),
            ..ExtractOptions::default()
        };
        let mut diagnostics = Diagnostics::new();
        let params = validate(&stack(&["2010-01-01"]), points(1).into(), &options, &mut diagnostics).unwrap();

        assert_eq!(params.out_format, OutFormat::TimeSeries);
        assert_eq!(params.small_method, SmallMethod::Centroid);
        assert_eq!(diagnostics.warnings().len(), 2);
    }

    #[test]
    fn test_unknown_aggregation_is_fatal() {
        let options = ExtractOptions::default().with_aggregation("mode");
        let mut diagnostics = Diagnostics::new();
        let err = validate(&stack(&["2010-01-01"]), points(1).into(), &options, &mut diagnostics).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_missing_vector_path_is_load_error() {
        let mut diagnostics = Diagnostics::new();
        let input = SpatialInput::Path("/definitely/not/here.geojson".into());
        let err = validate(&stack(&["2010-01-01"]), input, &ExtractOptions::default(), &mut diagnostics).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
    }
}
