//! Geometry kernel and GeoJSON input.

pub mod geojson;
pub mod kernel;

pub use geojson::{
    geometry_from_value, normalize_crs, parse_feature_collection, read_feature_collection,
    LoadError,
};
pub use kernel::BBox;
