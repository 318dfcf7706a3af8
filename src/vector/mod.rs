//! Vector features: model, GeoJSON I/O and extraction preparation

mod feature;
pub mod geojson;
pub mod prepare;

pub use self::feature::{AttributeValue, Feature, GeometryKind, Shape, SpatialFeatureSet, SpatialInput};
pub use self::prepare::{PreparedFeatures, TaggedFeature};
