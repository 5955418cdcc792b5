//! External geocoding search.
//!
//! [`PlaceSearch`] is the seam between the boundary resolver and the
//! network; [`NominatimClient`] is the production implementation.

mod client;

use geo::Geometry;
use thiserror::Error;

pub use client::{parse_name_details, parse_search_response, NominatimClient};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout
        } else {
            SearchError::Http(err)
        }
    }
}

/// One search result, with every optional field already defaulted.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// `None` if the result carried no readable geometry
    pub geometry: Option<Geometry<f64>>,
    pub feature_type: String,
    pub class: String,
    pub display_name: String,
    pub name: String,
}

/// A geocoding service that can be searched for place polygons.
#[allow(async_fn_in_trait)]
pub trait PlaceSearch {
    /// Search for `query`, requesting polygon geometry and address detail.
    async fn search_polygons(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;

    /// Official, local, short and translated names known for `query`.
    async fn discover_names(&self, query: &str) -> Result<Vec<String>, SearchError>;
}
