//! Nominatim search client.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use super::{PlaceSearch, SearchError, SearchHit};
use crate::config::SearchConfig;
use crate::geometry::geometry_from_value;

/// Name keys worth querying again under their own spelling
const EXTRA_NAME_KEYS: &[&str] = &["official_name", "local_name", "short_name"];

#[derive(Debug, Deserialize)]
struct GeoJsonResponse {
    #[serde(default)]
    features: Vec<GeoJsonHit>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonHit {
    #[serde(default)]
    geometry: Option<serde_json::Value>,
    #[serde(default)]
    properties: HitProperties,
}

#[derive(Debug, Default, Deserialize)]
struct HitProperties {
    #[serde(rename = "type")]
    feature_type: Option<String>,
    /// Older Nominatim versions call this `class`, the GeoJSON output `category`
    #[serde(alias = "category")]
    class: Option<String>,
    display_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameDetailsHit {
    name: Option<String>,
    #[serde(default)]
    namedetails: Option<HashMap<String, Option<String>>>,
}

/// Parse a `format=geojson` search response.
///
/// Missing optional properties become empty strings. Hits whose geometry
/// cannot be read keep `geometry: None`.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchHit>, SearchError> {
    let response: GeoJsonResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    Ok(response
        .features
        .into_iter()
        .map(|hit| {
            let geometry = hit.geometry.and_then(|value| match geometry_from_value(value) {
                Ok(g) => Some(g),
                Err(e) => {
                    debug!("Skipping unreadable result geometry: {}", e);
                    None
                }
            });
            SearchHit {
                geometry,
                feature_type: hit.properties.feature_type.unwrap_or_default(),
                class: hit.properties.class.unwrap_or_default(),
                display_name: hit.properties.display_name.unwrap_or_default(),
                name: hit.properties.name.unwrap_or_default(),
            }
        })
        .collect())
}

/// Parse a `format=json&namedetails=1` response into the distinct names it mentions.
pub fn parse_name_details(body: &str) -> Result<Vec<String>, SearchError> {
    let hits: Vec<NameDetailsHit> =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    for hit in hits {
        if let Some(name) = &hit.name {
            push(name);
        }
        let Some(details) = hit.namedetails else {
            continue;
        };
        // HashMap order is arbitrary; sort for stable query order
        let mut keys: Vec<&String> = details.keys().collect();
        keys.sort();
        for key in keys {
            let wanted = key.starts_with("name") || EXTRA_NAME_KEYS.contains(&key.as_str());
            if let (true, Some(Some(value))) = (wanted, details.get(key)) {
                push(value);
            }
        }
    }

    Ok(names)
}

/// Client for the public Nominatim search API (or a compatible mirror)
pub struct NominatimClient {
    client: Client,
    endpoint: Url,
    result_limit: usize,
    discovery_limit: usize,
}

impl NominatimClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| SearchError::Malformed(format!("endpoint {}: {}", config.endpoint, e)))?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            result_limit: config.result_limit,
            discovery_limit: config.discovery_limit,
        })
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<String, SearchError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(params);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl PlaceSearch for NominatimClient {
    async fn search_polygons(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let limit = self.result_limit.to_string();
        let body = self
            .get(&[
                ("q", query),
                ("format", "geojson"),
                ("limit", limit.as_str()),
                ("polygon_geojson", "1"),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .await?;
        parse_search_response(&body)
    }

    async fn discover_names(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let limit = self.discovery_limit.to_string();
        let body = self
            .get(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("namedetails", "1"),
                ("addressdetails", "1"),
                ("accept-language", "en,local"),
            ])
            .await?;
        parse_name_details(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Geometry;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {
                        "category": "boundary",
                        "type": "administrative",
                        "name": "Utrecht",
                        "display_name": "Utrecht, Netherlands"
                    },
                    "geometry": {"type": "Polygon", "coordinates": [[[5.0, 52.0], [5.2, 52.0], [5.2, 52.2], [5.0, 52.0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"type": "city", "name": null},
                    "geometry": {"type": "Point", "coordinates": [5.1, 52.1]}
                }
            ]
        }"#;

        let hits = parse_search_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].class, "boundary");
        assert_eq!(hits[0].feature_type, "administrative");
        assert_eq!(hits[0].display_name, "Utrecht, Netherlands");
        assert!(matches!(hits[0].geometry, Some(Geometry::Polygon(_))));
        assert_eq!(hits[1].name, "");
        assert_eq!(hits[1].class, "");
        assert!(matches!(hits[1].geometry, Some(Geometry::Point(_))));
    }

    #[test]
    fn test_unreadable_geometry_kept_as_none() {
        let body = r#"{"features": [{"properties": {}, "geometry": {"type": "Blob"}}]}"#;
        let hits = parse_search_response(body).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].geometry.is_none());
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            parse_search_response("<html>rate limited</html>"),
            Err(SearchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_name_details() {
        let body = r#"[
            {"name": "Göteborg", "namedetails": {
                "name": "Göteborg",
                "name:en": "Gothenburg",
                "official_name": "Göteborgs Stad",
                "alt_name": "Gbg",
                "name:fi": null
            }},
            {"name": "Gothenburg"}
        ]"#;
        let names = parse_name_details(body).unwrap();
        assert_eq!(names, vec!["Göteborg", "Gothenburg", "Göteborgs Stad"]);
    }
}
