//! Spatial feature collections

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use geo::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon};

use crate::coordinate::CoordinateSystem;
use crate::errors::{ExtractError, ExtractResult};

/// Attribute value of a feature
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Null => write!(f, "NA"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

/// The three geometry families the extractor distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Family of a geometry, `None` for collections
    pub fn of(geometry: &Geometry<f64>) -> Option<GeometryKind> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(GeometryKind::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => Some(GeometryKind::Line),
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                Some(GeometryKind::Polygon)
            },
            Geometry::GeometryCollection(_) => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Point => write!(f, "point"),
            GeometryKind::Line => write!(f, "line"),
            GeometryKind::Polygon => write!(f, "polygon"),
        }
    }
}

/// Geometry normalised to the multi-part form of its family
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Points(MultiPoint<f64>),
    Lines(MultiLineString<f64>),
    Polygons(MultiPolygon<f64>),
}

impl Shape {
    pub fn from_geometry(geometry: Geometry<f64>) -> ExtractResult<Shape> {
        let shape = match geometry {
            Geometry::Point(p) => Shape::Points(MultiPoint(vec![p])),
            Geometry::MultiPoint(mp) => Shape::Points(mp),
            Geometry::Line(l) => Shape::Lines(MultiLineString(vec![LineString::from(vec![l.start, l.end])])),
            Geometry::LineString(ls) => Shape::Lines(MultiLineString(vec![ls])),
            Geometry::MultiLineString(mls) => Shape::Lines(mls),
            Geometry::Polygon(p) => Shape::Polygons(MultiPolygon(vec![p])),
            Geometry::MultiPolygon(mp) => Shape::Polygons(mp),
            Geometry::Rect(r) => Shape::Polygons(MultiPolygon(vec![r.to_polygon()])),
            Geometry::Triangle(t) => Shape::Polygons(MultiPolygon(vec![t.to_polygon()])),
            Geometry::GeometryCollection(_) => {
                return Err(ExtractError::InvalidInput("Geometry collections are not supported".to_string()));
            },
        };
        Ok(shape)
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Points(_) => GeometryKind::Point,
            Shape::Lines(_) => GeometryKind::Line,
            Shape::Polygons(_) => GeometryKind::Polygon,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Points(mp) => mp.0.is_empty(),
            Shape::Lines(mls) => mls.0.iter().all(|ls| ls.0.is_empty()),
            Shape::Polygons(mp) => mp.0.is_empty(),
        }
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Shape::Points(mp) => Geometry::MultiPoint(mp.clone()),
            Shape::Lines(mls) => Geometry::MultiLineString(mls.clone()),
            Shape::Polygons(mp) => Geometry::MultiPolygon(mp.clone()),
        }
    }
}

/// A feature: geometry plus attribute table row
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Feature {
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// Ordered collection of features of a single geometry kind
#[derive(Debug, Clone, Default)]
pub struct SpatialFeatureSet {
    /// Reference frame of the coordinates, if known
    pub crs: Option<CoordinateSystem>,
    /// Features in user order
    pub features: Vec<Feature>,
}

impl SpatialFeatureSet {
    pub fn new() -> Self {
        SpatialFeatureSet::default()
    }

    pub fn with_crs(mut self, crs: CoordinateSystem) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Shared geometry kind of all features
    ///
    /// # Returns
    /// The kind, or a type error for empty, mixed or unsupported sets
    pub fn kind(&self) -> ExtractResult<GeometryKind> {
        let mut kind = None;
        for (i, feature) in self.features.iter().enumerate() {
            let this = GeometryKind::of(&feature.geometry).ok_or_else(|| {
                ExtractError::InvalidInput(format!("Feature {} has an unsupported geometry type", i + 1))
            })?;
            match kind {
                None => kind = Some(this),
                Some(k) if k != this => {
                    return Err(ExtractError::InvalidInput(format!(
                        "Features mix {} and {} geometries", k, this
                    )));
                },
                _ => {},
            }
        }
        kind.ok_or_else(|| ExtractError::InvalidInput("Spatial feature set is empty".to_string()))
    }
}

/// Where the features come from
#[derive(Debug, Clone)]
pub enum SpatialInput {
    /// Features already in memory
    Features(SpatialFeatureSet),
    /// Path to a GeoJSON feature collection
    Path(PathBuf),
}

impl From<SpatialFeatureSet> for SpatialInput {
    fn from(set: SpatialFeatureSet) -> Self {
        SpatialInput::Features(set)
    }
}

impl From<PathBuf> for SpatialInput {
    fn from(path: PathBuf) -> Self {
        SpatialInput::Path(path)
    }
}

impl From<&std::path::Path> for SpatialInput {
    fn from(path: &std::path::Path) -> Self {
        SpatialInput::Path(path.to_path_buf())
    }
}
