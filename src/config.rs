//! Validator configuration.
//!
//! Every component receives its settings from a [`ValidatorConfig`] passed in
//! at construction. The config can be loaded from TOML; missing fields fall
//! back to the documented defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::boundary::AliasEntry;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid region envelope: {0}")]
    Envelope(String),
    #[error("invalid feature count bounds: min {min} > max {max}")]
    FeatureCount { min: usize, max: usize },
    #[error("invalid search endpoint {0:?}: {1}")]
    Endpoint(String, url::ParseError),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{0} is too large")]
    TooLarge(&'static str),
}

/// Longitude/latitude rectangle that every collection must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionEnvelope {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl RegionEnvelope {
    /// Check that the rectangle is well formed and lies on the globe.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::Envelope("bounds must be finite".into()));
        }
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(ConfigError::Envelope(format!(
                "min must be below max: [{}, {}, {}, {}]",
                self.min_lon, self.min_lat, self.max_lon, self.max_lat
            )));
        }
        if self.min_lon < -180.0 || self.max_lon > 180.0 {
            return Err(ConfigError::Envelope("longitude outside [-180, 180]".into()));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(ConfigError::Envelope("latitude outside [-90, 90]".into()));
        }
        Ok(())
    }

    /// True if the `(min_x, min_y, max_x, max_y)` box lies inside the envelope.
    pub fn contains_bbox(&self, bbox: (f64, f64, f64, f64)) -> bool {
        let (min_x, min_y, max_x, max_y) = bbox;
        min_x >= self.min_lon
            && max_x <= self.max_lon
            && min_y >= self.min_lat
            && max_y <= self.max_lat
    }
}

impl Default for RegionEnvelope {
    /// Continental Europe, extended for the Atlantic and eastern territories.
    fn default() -> Self {
        Self {
            min_lon: -31.0,
            min_lat: 34.0,
            max_lon: 45.0,
            max_lat: 72.0,
        }
    }
}

/// Settings for the external geocoding search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Results requested per polygon search
    pub result_limit: usize,
    /// Results requested by the name discovery pre-query
    pub discovery_limit: usize,
    pub discover_names: bool,
    pub user_agent: String,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            timeout_secs: 30,
            result_limit: 5,
            discovery_limit: 3,
            discover_names: true,
            user_agent: format!("boundcheck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub min_feature_count: usize,
    pub max_feature_count: usize,
    /// Enforced by the file loader, not the engine
    pub max_file_size_mb: u64,
    pub required_crs: String,
    /// CRS given to files that do not declare one. The default `None`
    /// leaves it absent, which makes the coordinate system check fail.
    pub assume_crs_when_absent: Option<String>,
    pub region: RegionEnvelope,
    pub cache_ttl_secs: u64,
    /// Pause between files in a batch run
    pub batch_delay_ms: u64,
    pub search: SearchConfig,
    pub aliases: Vec<AliasEntry>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_feature_count: 1,
            max_feature_count: 10_000,
            max_file_size_mb: 100,
            required_crs: "EPSG:4326".to_string(),
            assume_crs_when_absent: None,
            region: RegionEnvelope::default(),
            cache_ttl_secs: 3600,
            batch_delay_ms: 1000,
            search: SearchConfig::default(),
            aliases: AliasEntry::builtin(),
        }
    }
}

impl ValidatorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: ValidatorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every validation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.region.validate()?;
        if self.min_feature_count > self.max_feature_count {
            return Err(ConfigError::FeatureCount {
                min: self.min_feature_count,
                max: self.max_feature_count,
            });
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Zero("cache_ttl_secs"));
        }
        self.cache_ttl()?;
        if self.max_file_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(ConfigError::TooLarge("max_file_size_mb"));
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigError::Zero("search.timeout_secs"));
        }
        if self.search.result_limit == 0 {
            return Err(ConfigError::Zero("search.result_limit"));
        }
        Url::parse(&self.search.endpoint)
            .map_err(|e| ConfigError::Endpoint(self.search.endpoint.clone(), e))?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or(ConfigError::TooLarge("cache_ttl_secs"))
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }
}
