//! Locality names and the feature collections under validation.

use geo::Geometry;
use serde::{Deserialize, Serialize};

/// Placeholder used when no locality can be derived from a file identifier.
pub const UNKNOWN_LOCALITY: &str = "unknown";

/// Normalized (trimmed, lower-cased) place name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalityName(String);

impl LocalityName {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_LOCALITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the placeholder and for names that normalize to nothing
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty() || self.0 == UNKNOWN_LOCALITY
    }
}

impl std::fmt::Display for LocalityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocalityName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A single feature. Identity is its position in the collection.
#[derive(Debug, Clone)]
pub struct Feature {
    /// `None` when the source feature had a null geometry
    pub geometry: Option<Geometry<f64>>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: serde_json::Map::new(),
        }
    }

    pub fn null() -> Self {
        Self {
            geometry: None,
            properties: serde_json::Map::new(),
        }
    }
}

/// Read-only input to the validation engine.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    /// Declared coordinate reference, e.g. "EPSG:4326"
    pub crs: Option<String>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>, crs: Option<String>) -> Self {
        Self { features, crs }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Non-null geometries paired with their feature index
    pub fn geometries(&self) -> impl Iterator<Item = (usize, &Geometry<f64>)> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.geometry.as_ref().map(|g| (i, g)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    #[test]
    fn test_locality_normalized() {
        let name = LocalityName::new("  Gothenburg ");
        assert_eq!(name.as_str(), "gothenburg");
        assert!(!name.is_unknown());
    }

    #[test]
    fn test_locality_unknown() {
        assert!(LocalityName::unknown().is_unknown());
        assert!(LocalityName::new("UNKNOWN").is_unknown());
        assert!(LocalityName::new("   ").is_unknown());
    }

    #[test]
    fn test_geometries_skip_nulls_keep_index() {
        let collection = FeatureCollection::new(
            vec![
                Feature::null(),
                Feature::new(Geometry::Point(point!(x: 1.0, y: 2.0))),
            ],
            None,
        );
        let indices: Vec<usize> = collection.geometries().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1]);
    }
}
