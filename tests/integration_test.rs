//! Integration tests for time-series extraction

use std::sync::Arc;

use chrono::NaiveDate;
use geo::{line_string, point, polygon, LineString, Polygon};

use zonalkit::coordinate::CoordinateTransformer;
use zonalkit::vector::geojson;
use zonalkit::{
    extract_time_series, AttributeValue, ColumnOrigin, CoordinateSystem, ErrorKind, ExtractError, ExtractOptions,
    ExtractResult, ExtractionOutput, Feature, FnAggregator, GeoTransform, GridSpec, OutFormat, RasterLayer,
    RasterSource, RasterTimeStack, SmallMethod, SpatialFeatureSet, SpatialInput, ZonalKit,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 4x4 grid of unit cells over (0,0)-(4,4); band k holds `pixel index + 100 k`
fn stack(dates: &[&str]) -> RasterTimeStack {
    let grid = GridSpec::new(4, 4, GeoTransform::new(0.0, 1.0, 4.0, -1.0), None);
    dates.iter().enumerate().fold(RasterTimeStack::new(grid), |s, (k, date)| {
        s.with_layer(RasterLayer::new(*date, (0..16).map(|i| i as f64 + 100.0 * k as f64).collect()))
    })
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn three_fields() -> SpatialFeatureSet {
    SpatialFeatureSet::new()
        .with_feature(Feature::new(rect(0.0, 0.0, 2.0, 2.0)).with_attribute("name", "inside"))
        .with_feature(Feature::new(rect(3.0, 2.0, 5.0, 4.0)).with_attribute("name", "straddling"))
        .with_feature(Feature::new(rect(10.0, 10.0, 12.0, 12.0)).with_attribute("name", "outside"))
}

fn table(output: Option<ExtractionOutput>) -> zonalkit::OutputTable {
    output.expect("extraction produced no output").into_table()
}

#[test]
fn test_polygons_inside_straddling_and_outside() {
    init_logging();
    let options = ExtractOptions::default()
        .with_dates(Some("2010-01-01"), Some("2010-01-02"))
        .with_id_field("name")
        .with_out_format(OutFormat::Table);

    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02", "2010-01-03"]), three_fields(), &options).unwrap();
    let table = table(extraction.output);

    assert_eq!(table.dates, vec![ymd(2010, 1, 1), ymd(2010, 1, 2)]);
    assert_eq!(table.column_names(), vec!["inside", "straddling", "outside"]);

    // Cells 8, 9, 12 and 13
    assert_eq!(table.value(0, "inside"), Some(10.5));
    assert_eq!(table.value(1, "inside"), Some(110.5));
    // Only the interior cells 3 and 7 count
    assert_eq!(table.value(0, "straddling"), Some(5.0));
    assert_eq!(table.value(1, "straddling"), Some(105.0));

    let outside = table.column("outside").unwrap();
    assert_eq!(outside.origin, ColumnOrigin::Outside);
    assert!(outside.values.iter().all(|v| v.is_nan()));
    assert_eq!(table.column("inside").unwrap().origin, ColumnOrigin::Zonal);

    assert_eq!(extraction.warnings.len(), 1);
    assert!(extraction.warnings[0].contains("outside the raster extent"));
}

#[test]
fn test_single_point_matches_pixel_lookup() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(point! { x: 2.5, y: 3.5 }));
    let options = ExtractOptions::default().with_out_format(OutFormat::Table);

    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), set, &options).unwrap();
    let table = table(extraction.output);

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_count(), 1);
    assert_eq!(table.column("1").unwrap().values, vec![2.0, 102.0]);
    assert_eq!(table.column("1").unwrap().origin, ColumnOrigin::Sampled);
    assert!(extraction.warnings.is_empty());
}

#[test]
fn test_default_output_is_a_time_series() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(point! { x: 0.5, y: 0.5 }));
    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), set, &ExtractOptions::default()).unwrap();

    let output = extraction.output.unwrap();
    let series = output.as_time_series().expect("time series by default");
    assert_eq!(series.index(), &[ymd(2010, 1, 1), ymd(2010, 1, 2)]);
    assert_eq!(series.value(ymd(2010, 1, 2), "1"), Some(112.0));
}

#[test]
fn test_small_polygon_by_centroid() {
    let set = SpatialFeatureSet::new()
        .with_feature(Feature::new(rect(0.0, 0.0, 1.0, 1.0)))
        .with_feature(Feature::new(rect(1.6, 2.6, 1.9, 2.9)));
    let options = ExtractOptions::default()
        .with_out_format(OutFormat::Table)
        .with_small(true, SmallMethod::Centroid);

    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), set, &options).unwrap();
    let table = table(extraction.output);

    // Centroid (1.75, 2.75) lies in cell 5
    assert_eq!(table.column("2").unwrap().values, vec![5.0, 105.0]);
    assert_eq!(table.column("2").unwrap().origin, ColumnOrigin::SmallPolygon);
    assert_eq!(table.column("1").unwrap().values, vec![12.0, 112.0]);
    assert!(extraction.warnings.is_empty());
}

#[test]
fn test_small_polygon_full_cover() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(rect(1.8, 1.8, 2.2, 2.2)));
    let options = ExtractOptions::default()
        .with_out_format(OutFormat::Table)
        .with_small(true, SmallMethod::Full);

    let extraction = extract_time_series(&stack(&["2010-01-01"]), set, &options).unwrap();
    // Mean of cells 5, 6, 9 and 10
    assert_eq!(table(extraction.output).value(0, "1"), Some(7.5));
}

#[test]
fn test_small_polygon_left_missing_when_disabled() {
    let set = SpatialFeatureSet::new()
        .with_feature(Feature::new(rect(0.0, 0.0, 1.0, 1.0)))
        .with_feature(Feature::new(rect(1.6, 2.6, 1.9, 2.9)));
    let options = ExtractOptions::default()
        .with_out_format(OutFormat::Table)
        .with_small(false, SmallMethod::Centroid);

    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), set, &options).unwrap();
    let table = table(extraction.output);

    let small = table.column("2").unwrap();
    assert!(small.values.iter().all(|v| v.is_nan()));
    assert_eq!(small.origin, ColumnOrigin::Unrealized);
    assert_eq!(extraction.warnings.len(), 1);
    assert!(extraction.warnings[0].contains("too small"));
}

#[test]
fn test_all_features_outside() {
    let set = SpatialFeatureSet::new()
        .with_feature(Feature::new(rect(10.0, 10.0, 11.0, 11.0)))
        .with_feature(Feature::new(rect(-5.0, -5.0, -4.0, -4.0)));
    let options = ExtractOptions::default().with_out_format(OutFormat::Table);

    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), set, &options).unwrap();
    let table = table(extraction.output);

    assert_eq!(table.column_count(), 2);
    for column in &table.columns {
        assert_eq!(column.origin, ColumnOrigin::Outside);
        assert!(column.values.iter().all(|v| v.is_nan()));
    }
}

#[test]
fn test_id_field_fallbacks() {
    let duplicated = SpatialFeatureSet::new()
        .with_feature(Feature::new(point! { x: 0.5, y: 0.5 }).with_attribute("code", 7i64))
        .with_feature(Feature::new(point! { x: 1.5, y: 0.5 }).with_attribute("code", 7i64));
    let options = ExtractOptions::default().with_id_field("code");
    let extraction = extract_time_series(&stack(&["2010-01-01"]), duplicated, &options).unwrap();
    assert_eq!(extraction.output.unwrap().column_names(), vec!["1", "2"]);
    assert_eq!(extraction.warnings.len(), 1);

    let options = ExtractOptions::default().with_id_field("missing");
    let extraction = extract_time_series(&stack(&["2010-01-01"]), three_fields(), &options).unwrap();
    assert_eq!(extraction.output.unwrap().column_names(), vec!["1", "2", "3"]);
    assert!(extraction.warnings.iter().any(|w| w.contains("'missing'")));
}

#[test]
fn test_column_count_matches_feature_count() {
    let mut set = SpatialFeatureSet::new();
    for i in 0..6 {
        let x = i as f64 * 1.5 - 2.0;
        set.push(Feature::new(point! { x: x, y: 1.5 }).with_attribute("id", AttributeValue::Integer(i)));
    }
    let options = ExtractOptions::default().with_id_field("id");
    let extraction = extract_time_series(&stack(&["2010-01-01", "2010-01-02", "2010-01-03"]), set, &options).unwrap();

    let output = extraction.output.unwrap();
    assert_eq!(output.row_count(), 3);
    assert_eq!(output.column_count(), 6);
    assert_eq!(output.column_names(), vec!["0", "1", "2", "3", "4", "5"]);
}

#[test]
fn test_repeated_runs_are_identical() {
    let options = ExtractOptions::default().with_out_format(OutFormat::Table);
    let raster = stack(&["2010-01-01", "2010-01-02", "2010-01-03"]);

    let first = table(extract_time_series(&raster, three_fields(), &options).unwrap().output);
    let second = table(extract_time_series(&raster, three_fields(), &options).unwrap().output);
    assert_eq!(first.to_csv_string().unwrap(), second.to_csv_string().unwrap());
}

#[test]
fn test_bands_are_reordered_by_date() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(point! { x: 0.5, y: 3.5 }));
    let options = ExtractOptions::default().with_out_format(OutFormat::Table);
    let raster = stack(&["2010-01-03", "X2010.01.01", "MOD13Q1_2010_002"]);

    let table = table(extract_time_series(&raster, set, &options).unwrap().output);
    assert_eq!(table.dates, vec![ymd(2010, 1, 1), ymd(2010, 1, 2), ymd(2010, 1, 3)]);
    assert_eq!(table.column("1").unwrap().values, vec![100.0, 200.0, 0.0]);
}

#[test]
fn test_empty_window_returns_no_output() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(point! { x: 0.5, y: 0.5 }));
    let options = ExtractOptions::default().with_dates(Some("2011-01-01"), Some("2011-12-31"));

    let extraction = extract_time_series(&stack(&["2010-01-01"]), set, &options).unwrap();
    assert!(extraction.is_empty());
    assert_eq!(extraction.warnings.len(), 1);
}

#[test]
fn test_fatal_error_kinds() {
    let points = || SpatialFeatureSet::new().with_feature(Feature::new(point! { x: 0.5, y: 0.5 }));

    let err = extract_time_series(&stack(&[]), points(), &ExtractOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);

    let options = ExtractOptions::default().with_dates(Some("2010-01-02"), Some("2010-01-01"));
    let err = extract_time_series(&stack(&["2010-01-01"]), points(), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    let options = ExtractOptions::default().with_dates(Some("last tuesday"), None);
    let err = extract_time_series(&stack(&["2010-01-01"]), points(), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let missing = SpatialInput::Path("/no/such/fields.geojson".into());
    let err = extract_time_series(&stack(&["2010-01-01"]), missing, &ExtractOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);

    let mixed = points().with_feature(Feature::new(rect(0.0, 0.0, 1.0, 1.0)));
    let err = extract_time_series(&stack(&["2010-01-01"]), mixed, &ExtractOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_features_from_geojson_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fields.geojson");
    geojson::write_features(&path, &three_fields()).unwrap();

    let options = ExtractOptions::default().with_id_field("name").with_out_format(OutFormat::Table);
    let extraction = extract_time_series(&stack(&["2010-01-01"]), path.as_path(), &options).unwrap();

    let table = table(extraction.output);
    assert_eq!(table.column_names(), vec!["inside", "straddling", "outside"]);
    assert_eq!(table.value(0, "inside"), Some(10.5));
}

#[test]
fn test_line_aggregates_touched_cells() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(line_string![(x: 0.2, y: 2.5), (x: 3.8, y: 2.5)]));
    let options = ExtractOptions::default().with_out_format(OutFormat::Table).with_aggregation("max");

    let table = table(extract_time_series(&stack(&["2010-01-01"]), set, &options).unwrap().output);
    assert_eq!(table.value(0, "1"), Some(7.0));
}

#[test]
fn test_nodata_and_skip_missing() {
    let grid = GridSpec::new(2, 1, GeoTransform::new(0.0, 1.0, 1.0, -1.0), None);
    let raster = RasterTimeStack::new(grid)
        .with_layer(RasterLayer::new("2010-01-01", vec![4.0, -9999.0]).with_nodata(-9999.0));
    let set = SpatialFeatureSet::new().with_feature(Feature::new(rect(0.0, 0.0, 2.0, 1.0)));

    let options = ExtractOptions::default().with_out_format(OutFormat::Table);
    let skipped = table(extract_time_series(&raster, set.clone(), &options).unwrap().output);
    assert_eq!(skipped.value(0, "1"), Some(4.0));

    let options = options.with_skip_missing(false);
    let kept = table(extract_time_series(&raster, set, &options).unwrap().output);
    assert!(kept.value(0, "1").unwrap().is_nan());
}

#[test]
fn test_custom_aggregator() {
    let range = FnAggregator::new("range", |values: &[f64]| {
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        max - min
    });
    let options = ExtractOptions::default()
        .with_out_format(OutFormat::Table)
        .with_aggregator(Arc::new(range));

    let set = SpatialFeatureSet::new().with_feature(Feature::new(rect(0.0, 0.0, 2.0, 2.0)));
    let table = table(extract_time_series(&stack(&["2010-01-01"]), set, &options).unwrap().output);
    // Cells 8, 9, 12 and 13
    assert_eq!(table.value(0, "1"), Some(5.0));
}

#[test]
fn test_options_from_toml() {
    let options = ExtractOptions::from_toml_str(r#"
        start_date = "2010-01-02"
        out_format = "table"
        aggregation = "min"
    "#).unwrap();

    let set = SpatialFeatureSet::new().with_feature(Feature::new(rect(0.0, 0.0, 2.0, 2.0)));
    let table = table(extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), set, &options).unwrap().output);
    assert_eq!(table.dates, vec![ymd(2010, 1, 2)]);
    assert_eq!(table.value(0, "1"), Some(108.0));
}

#[test]
fn test_facade_writes_csv_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("zonalkit.log");
    let csv_path = dir.path().join("fields.csv");

    let kit = ZonalKit::new(log_path.to_str()).unwrap();
    let options = ExtractOptions::default().with_id_field("name");
    let warnings = kit.extract_to_csv(&stack(&["2010-01-01", "2010-01-02"]), three_fields(), &options, &csv_path).unwrap();
    assert_eq!(warnings.len(), 1);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "date,inside,straddling,outside");
    assert_eq!(lines[1], "2010-01-01,10.5,5,");
    assert_eq!(lines.len(), 3);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Extraction summary"));
    assert!(log.contains("inside, straddling, outside"));
}

#[test]
fn test_lonlat_features_on_utm_grid() {
    let to_utm = CoordinateTransformer::new(CoordinateSystem::WGS84, CoordinateSystem::UTM(33, true)).unwrap();
    let centre = to_utm.transform_coord(geo::coord! { x: 15.0, y: 52.0 }).unwrap();

    // 4x4 grid of 1 km cells, the projected centre in the middle of cell 10
    let grid = GridSpec::new(
        4, 4,
        GeoTransform::new(centre.x - 2500.0, 1000.0, centre.y + 2500.0, -1000.0),
        Some(CoordinateSystem::UTM(33, true)),
    );
    let raster = RasterTimeStack::new(grid)
        .with_layer(RasterLayer::new("2010-01-01", (0..16).map(f64::from).collect()));
    let options = ExtractOptions::default().with_out_format(OutFormat::Table);

    let points = SpatialFeatureSet::new()
        .with_crs(CoordinateSystem::WGS84)
        .with_feature(Feature::new(point! { x: 15.0, y: 52.0 }));
    let extraction = extract_time_series(&raster, points, &options).unwrap();
    assert!(extraction.warnings.is_empty());
    assert_eq!(table(extraction.output).value(0, "1"), Some(10.0));

    // Covers the whole grid
    let polygons = SpatialFeatureSet::new()
        .with_crs(CoordinateSystem::WGS84)
        .with_feature(Feature::new(rect(14.9, 51.9, 15.1, 52.1)));
    let extraction = extract_time_series(&raster, polygons, &options).unwrap();
    assert_eq!(table(extraction.output).value(0, "1"), Some(7.5));
}

#[test]
fn test_short_band_fails_even_when_nothing_is_read() {
    let grid = GridSpec::new(2, 2, GeoTransform::new(0.0, 1.0, 2.0, -1.0), None);
    let raster = RasterTimeStack::new(grid)
        .with_layer(RasterLayer::new("2010-01-01", vec![1.0; 4]))
        .with_layer(RasterLayer::new("2011-01-01", vec![1.0]));
    let outside = SpatialFeatureSet::new().with_feature(Feature::new(rect(10.0, 10.0, 12.0, 12.0)));

    // The short band lies outside the window and no feature touches the grid
    let options = ExtractOptions::default().with_dates(None, Some("2010-12-31"));
    let err = extract_time_series(&raster, outside, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

/// Stack whose second band cannot be read
struct FailingStack {
    inner: RasterTimeStack,
}

impl RasterSource for FailingStack {
    fn grid(&self) -> &GridSpec {
        self.inner.grid()
    }

    fn band_count(&self) -> usize {
        self.inner.band_count()
    }

    fn band_label(&self, band: usize) -> Option<&str> {
        self.inner.band_label(band)
    }

    fn band_len(&self, band: usize) -> usize {
        self.inner.band_len(band)
    }

    fn read_band(&self, band: usize) -> ExtractResult<Vec<f64>> {
        if band == 1 {
            return Err(ExtractError::GenericError("disk went away".to_string()));
        }
        self.inner.read_band(band)
    }
}

#[test]
fn test_scratch_removed_when_extraction_fails() {
    let root = tempfile::tempdir().unwrap();
    let options = ExtractOptions::default().with_scratch_dir(root.path());

    let failing = FailingStack { inner: stack(&["2010-01-01", "2010-01-02"]) };
    let err = extract_time_series(&failing, three_fields(), &options).unwrap_err();
    assert!(err.to_string().contains("disk went away"));
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);

    extract_time_series(&stack(&["2010-01-01", "2010-01-02"]), three_fields(), &options).unwrap();
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_single_vertex_line_is_sampled() {
    let set = SpatialFeatureSet::new().with_feature(Feature::new(LineString::from(vec![(1.5, 2.5)])));
    let options = ExtractOptions::default().with_out_format(OutFormat::Table);

    let extraction = extract_time_series(&stack(&["2010-01-01"]), set, &options).unwrap();
    assert!(extraction.warnings.is_empty());
    assert_eq!(table(extraction.output).value(0, "1"), Some(5.0));
}
