//! GeoJSON reading and writing
//!
//! Feature sets are loaded from GeoJSON feature collections, and the
//! polygon path persists its tagged polygons in the same format before
//! rasterizing them. Only the subset needed here is modelled: the six
//! simple geometry types, a `properties` object and the legacy named
//! `crs` member.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use geo::{coord, Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::coordinate::{CoordinateSystem, CoordinateSystemFactory};
use crate::errors::{ExtractError, ExtractResult};
use super::feature::{AttributeValue, Feature, Shape, SpatialFeatureSet};
use super::prepare::TaggedFeature;

/// Property carrying the synthetic identifier in persisted datasets
pub const ZONE_ID_PROPERTY: &str = "zone_id";

type Position = Vec<f64>;

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<CrsDoc>,
    features: Vec<FeatureDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsDoc {
    #[serde(rename = "type")]
    kind: String,
    properties: CrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsProperties {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeatureDoc {
    #[serde(rename = "type")]
    kind: String,
    geometry: Option<GeometryDoc>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeometryDoc {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

fn to_coord(position: &[f64]) -> Result<Coord<f64>, String> {
    match position {
        [x, y, ..] => Ok(coord! { x: *x, y: *y }),
        _ => Err(format!("position needs at least two values, got {}", position.len())),
    }
}

fn to_line(positions: &[Position]) -> Result<LineString<f64>, String> {
    positions.iter().map(|p| to_coord(p)).collect::<Result<Vec<_>, _>>().map(LineString::from)
}

fn to_polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>, String> {
    let (exterior, interiors) = rings.split_first().ok_or("polygon without rings")?;
    let interiors = interiors.iter().map(|r| to_line(r)).collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(to_line(exterior)?, interiors))
}

impl GeometryDoc {
    fn to_geometry(&self) -> Result<Geometry<f64>, String> {
        let geometry = match self {
            GeometryDoc::Point { coordinates } => Geometry::Point(Point(to_coord(coordinates)?)),
            GeometryDoc::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint(
                coordinates.iter().map(|p| to_coord(p).map(Point)).collect::<Result<Vec<_>, _>>()?,
            )),
            GeometryDoc::LineString { coordinates } => Geometry::LineString(to_line(coordinates)?),
            GeometryDoc::MultiLineString { coordinates } => Geometry::MultiLineString(MultiLineString(
                coordinates.iter().map(|l| to_line(l)).collect::<Result<Vec<_>, _>>()?,
            )),
            GeometryDoc::Polygon { coordinates } => Geometry::Polygon(to_polygon(coordinates)?),
            GeometryDoc::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon(
                coordinates.iter().map(|p| to_polygon(p)).collect::<Result<Vec<_>, _>>()?,
            )),
        };
        Ok(geometry)
    }

    fn from_shape(shape: &Shape) -> GeometryDoc {
        fn position(c: &Coord<f64>) -> Position {
            vec![c.x, c.y]
        }
        fn line(ls: &LineString<f64>) -> Vec<Position> {
            ls.0.iter().map(position).collect()
        }
        fn rings(p: &Polygon<f64>) -> Vec<Vec<Position>> {
            std::iter::once(p.exterior()).chain(p.interiors().iter()).map(line).collect()
        }

        match shape {
            Shape::Points(mp) => GeometryDoc::MultiPoint {
                coordinates: mp.0.iter().map(|p| position(&p.0)).collect(),
            },
            Shape::Lines(mls) => GeometryDoc::MultiLineString {
                coordinates: mls.0.iter().map(line).collect(),
            },
            Shape::Polygons(mp) => GeometryDoc::MultiPolygon {
                coordinates: mp.0.iter().map(rings).collect(),
            },
        }
    }
}

fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Integer(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::Text(s.clone()),
        other => AttributeValue::Text(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Text(s) => Value::String(s.clone()),
        AttributeValue::Integer(i) => Value::Number((*i).into()),
        AttributeValue::Float(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null => Value::Null,
    }
}

fn crs_doc(crs: &CoordinateSystem) -> CrsDoc {
    CrsDoc {
        kind: "name".to_string(),
        properties: CrsProperties {
            name: format!("urn:ogc:def:crs:EPSG::{}", crs.epsg_code()),
        },
    }
}

fn read_document(path: &Path) -> Result<FeatureCollectionDoc, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let doc: FeatureCollectionDoc = serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string())?;
    if doc.kind != "FeatureCollection" {
        return Err(format!("expected a FeatureCollection, found {}", doc.kind));
    }
    Ok(doc)
}

fn write_document(path: &Path, doc: &FeatureCollectionDoc) -> ExtractResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, doc)?;
    writer.flush()?;
    Ok(())
}

/// Load a feature set from a GeoJSON feature collection
///
/// # Arguments
/// * `path` - Path to the GeoJSON file
///
/// # Returns
/// The features in file order, or a load error if the file is missing,
/// malformed, or holds a feature without a supported geometry
pub fn load_features(path: &Path) -> ExtractResult<SpatialFeatureSet> {
    info!("Loading spatial features from {}", path.display());
    let load_error = |reason: String| ExtractError::LoadFailed(path.display().to_string(), reason);

    let doc = read_document(path).map_err(load_error)?;

    let crs = match &doc.crs {
        Some(crs) => Some(CoordinateSystemFactory::from_string(&crs.properties.name)
            .map_err(|e| load_error(e.to_string()))?),
        None => None,
    };

    let mut set = SpatialFeatureSet { crs, features: Vec::with_capacity(doc.features.len()) };
    for (i, feature) in doc.features.iter().enumerate() {
        let geometry = feature.geometry.as_ref()
            .ok_or_else(|| load_error(format!("feature {} has no geometry", i + 1)))?
            .to_geometry()
            .map_err(|e| load_error(format!("feature {}: {}", i + 1, e)))?;

        let attributes: BTreeMap<String, AttributeValue> = feature.properties.iter()
            .flatten()
            .map(|(k, v)| (k.clone(), attribute_from_json(v)))
            .collect();

        set.push(Feature { geometry, attributes });
    }

    debug!("Loaded {} features", set.len());
    Ok(set)
}

/// Write a feature set as a GeoJSON feature collection
pub fn write_features(path: &Path, set: &SpatialFeatureSet) -> ExtractResult<()> {
    let mut features = Vec::with_capacity(set.len());
    for feature in &set.features {
        let shape = Shape::from_geometry(feature.geometry.clone())?;
        let properties: Map<String, Value> = feature.attributes.iter()
            .map(|(k, v)| (k.clone(), attribute_to_json(v)))
            .collect();
        features.push(FeatureDoc {
            kind: "Feature".to_string(),
            geometry: Some(GeometryDoc::from_shape(&shape)),
            properties: Some(properties),
        });
    }

    let doc = FeatureCollectionDoc {
        kind: "FeatureCollection".to_string(),
        crs: set.crs.as_ref().map(crs_doc),
        features,
    };
    write_document(path, &doc)
}

/// Persist tagged features with their synthetic identifier as `zone_id`
pub fn write_tagged(path: &Path, features: &[TaggedFeature]) -> ExtractResult<()> {
    debug!("Writing {} tagged features to {}", features.len(), path.display());
    let features = features.iter().map(|f| {
        let mut properties = Map::new();
        properties.insert(ZONE_ID_PROPERTY.to_string(), Value::Number(f.id.into()));
        FeatureDoc {
            kind: "Feature".to_string(),
            geometry: Some(GeometryDoc::from_shape(&f.shape)),
            properties: Some(properties),
        }
    }).collect();

    let doc = FeatureCollectionDoc {
        kind: "FeatureCollection".to_string(),
        crs: None,
        features,
    };
    write_document(path, &doc)
}

/// Read back a dataset written by [`write_tagged`]
pub fn read_tagged(path: &Path) -> ExtractResult<Vec<TaggedFeature>> {
    let doc = read_document(path)
        .map_err(|e| ExtractError::GenericError(format!("Tagged dataset {} is unreadable: {}", path.display(), e)))?;

    doc.features.iter().map(|feature| {
        let id = feature.properties.as_ref()
            .and_then(|p| p.get(ZONE_ID_PROPERTY))
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| ExtractError::GenericError(format!("Feature without a valid {}", ZONE_ID_PROPERTY)))?;
        let geometry = feature.geometry.as_ref()
            .ok_or_else(|| ExtractError::GenericError(format!("Zone {} has no geometry", id)))?
            .to_geometry()
            .map_err(ExtractError::GenericError)?;
        Ok(TaggedFeature { id, shape: Shape::from_geometry(geometry)? })
    }).collect()
}
