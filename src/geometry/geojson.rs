//! GeoJSON reading into `geo` geometries.
//!
//! Only the parts of GeoJSON the validator needs are modelled: feature
//! collections, the seven geometry types and the legacy `crs` member.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::models::{Feature, FeatureCollection};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("file too large: {size_mb:.2}MB > {max_mb}MB")]
    TooLarge { size_mb: f64, max_mb: u64 },
    #[error("file is empty")]
    Empty,
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid type: {0:?}, expected 'FeatureCollection'")]
    NotFeatureCollection(String),
    #[error("feature {index}: {reason}")]
    Feature { index: usize, reason: String },
}

impl LoadError {
    /// Name of the failing check this error is reported under
    pub fn test_name(&self) -> &'static str {
        match self {
            LoadError::Io(_) | LoadError::TooLarge { .. } | LoadError::Empty => "file_access",
            _ => "geojson_loading",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
    #[serde(default)]
    crs: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    GeometryCollection {
        geometries: Vec<RawGeometry>,
    },
}

fn to_coord(position: &[f64]) -> Result<Coord<f64>, String> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(format!(
            "position needs at least 2 values, got {}",
            position.len()
        )),
    }
}

fn to_line_string(positions: &[Vec<f64>]) -> Result<LineString<f64>, String> {
    positions
        .iter()
        .map(|p| to_coord(p))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|r| to_line_string(r));
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(vec![]),
    };
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

impl RawGeometry {
    fn into_geometry(self) -> Result<Geometry<f64>, String> {
        let geometry = match self {
            RawGeometry::Point { coordinates } => {
                Geometry::Point(Point::from(to_coord(&coordinates)?))
            }
            RawGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates
                    .iter()
                    .map(|p| to_coord(p).map(Point::from))
                    .collect::<Result<_, _>>()?,
            )),
            RawGeometry::LineString { coordinates } => {
                Geometry::LineString(to_line_string(&coordinates)?)
            }
            RawGeometry::MultiLineString { coordinates } => {
                Geometry::MultiLineString(MultiLineString::new(
                    coordinates
                        .iter()
                        .map(|l| to_line_string(l))
                        .collect::<Result<_, _>>()?,
                ))
            }
            RawGeometry::Polygon { coordinates } => Geometry::Polygon(to_polygon(&coordinates)?),
            RawGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|p| to_polygon(p))
                    .collect::<Result<_, _>>()?,
            )),
            RawGeometry::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection::new_from(
                    geometries
                        .into_iter()
                        .map(RawGeometry::into_geometry)
                        .collect::<Result<_, _>>()?,
                ))
            }
        };
        Ok(geometry)
    }
}

/// Convert a standalone GeoJSON geometry object
pub fn geometry_from_value(value: serde_json::Value) -> Result<Geometry<f64>, String> {
    let raw: RawGeometry = serde_json::from_value(value).map_err(|e| e.to_string())?;
    raw.into_geometry()
}

/// Normalize the common spellings of a CRS identifier to `EPSG:<code>`.
///
/// CRS84 is axis-swapped WGS84 and treated as `EPSG:4326`, as GeoJSON readers do.
pub fn normalize_crs(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_lowercase();

    if lower.ends_with("crs84") {
        return "EPSG:4326".to_string();
    }
    if let Some(rest) = lower.strip_prefix("urn:ogc:def:crs:epsg:") {
        // urn:ogc:def:crs:EPSG::4326 or urn:ogc:def:crs:EPSG:6.6:4326
        if let Some(code) = rest.rsplit(':').next().filter(|c| !c.is_empty()) {
            return format!("EPSG:{}", code);
        }
    }
    if let Some(code) = lower.strip_prefix("epsg:") {
        return format!("EPSG:{}", code);
    }
    trimmed.to_string()
}

fn declared_crs(crs: &serde_json::Value) -> Option<String> {
    crs.get("properties")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .map(normalize_crs)
}

/// Parse GeoJSON text. `assume_crs` is used when the document declares none.
pub fn parse_feature_collection(
    bytes: &[u8],
    assume_crs: Option<&str>,
) -> Result<FeatureCollection, LoadError> {
    let raw: RawCollection = serde_json::from_slice(bytes)?;
    if raw.kind != "FeatureCollection" {
        return Err(LoadError::NotFeatureCollection(raw.kind));
    }

    let crs = raw
        .crs
        .as_ref()
        .and_then(declared_crs)
        .or_else(|| assume_crs.map(normalize_crs));

    let features = raw
        .features
        .into_iter()
        .enumerate()
        .map(|(index, f)| {
            let geometry = f
                .geometry
                .map(RawGeometry::into_geometry)
                .transpose()
                .map_err(|reason| LoadError::Feature { index, reason })?;
            Ok(Feature {
                geometry,
                properties: f.properties.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(FeatureCollection::new(features, crs))
}

/// Read and parse a GeoJSON file, refusing files above `max_bytes`.
pub fn read_feature_collection(
    path: &Path,
    max_bytes: u64,
    assume_crs: Option<&str>,
) -> Result<FeatureCollection, LoadError> {
    let size = fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(LoadError::TooLarge {
            size_mb: size as f64 / (1024.0 * 1024.0),
            max_mb: max_bytes / (1024 * 1024),
        });
    }
    if size == 0 {
        return Err(LoadError::Empty);
    }
    let bytes = fs::read(path)?;
    parse_feature_collection(&bytes, assume_crs)
}
