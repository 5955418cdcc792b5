//! Boundary resolution: variants → searches → scored candidates.

use chrono::{DateTime, Utc};
use geo::Geometry;
use tracing::{debug, info, warn};

use super::scoring::{BestCandidate, BoundaryCandidate, Scorer};
use super::variants::{generate_variants, Discovery, NameVariant};
use super::AliasTable;
use crate::geometry::kernel;
use crate::models::LocalityName;
use crate::nominatim::PlaceSearch;

/// The polygon chosen as a locality's administrative extent.
#[derive(Debug, Clone)]
pub struct ResolvedBoundary {
    pub locality: LocalityName,
    /// Always a Polygon or MultiPolygon
    pub geometry: Geometry<f64>,
    pub display_name: String,
    pub feature_type: String,
    pub class: String,
    pub area_km2: f64,
    pub score: f64,
    /// Variant query that produced the winning candidate
    pub query: String,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedBoundary {
    pub fn from_candidate(
        locality: LocalityName,
        candidate: BoundaryCandidate,
        score: f64,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            locality,
            geometry: candidate.geometry,
            display_name: candidate.display_name,
            feature_type: candidate.feature_type,
            class: candidate.class,
            area_km2: candidate.area_km2,
            score,
            query: candidate.query,
            resolved_at,
        }
    }

    pub fn centroid(&self) -> Option<(f64, f64)> {
        kernel::centroid(&self.geometry)
    }
}

/// Anything that can turn a locality into a boundary. `None` means no
/// confident match was found; it is an outcome, not an error.
#[allow(async_fn_in_trait)]
pub trait ResolveBoundary {
    async fn resolve(&self, locality: &LocalityName) -> Option<ResolvedBoundary>;
}

/// Resolves boundaries through a [`PlaceSearch`] implementation.
///
/// Searches run sequentially, one per name variant, without retries. A
/// failed variant is logged and skipped.
pub struct BoundaryResolver<S> {
    search: S,
    aliases: AliasTable,
    discover_names: bool,
}

impl<S: PlaceSearch> BoundaryResolver<S> {
    pub fn new(search: S, aliases: AliasTable, discover_names: bool) -> Self {
        Self {
            search,
            aliases,
            discover_names,
        }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    /// Variant list for `locality`, including the optional discovery pre-query
    pub async fn variants(&self, locality: &LocalityName) -> Vec<NameVariant> {
        let discovery = if self.discover_names {
            match self.search.discover_names(locality.as_str()).await {
                Ok(names) => {
                    debug!("Discovered {} names for '{}'", names.len(), locality);
                    Discovery::Found(names)
                }
                Err(e) => {
                    warn!("Name discovery for '{}' failed: {}", locality, e);
                    Discovery::Failed
                }
            }
        } else {
            Discovery::Skipped
        };
        generate_variants(locality, &self.aliases, &discovery)
    }
}

impl<S: PlaceSearch> ResolveBoundary for BoundaryResolver<S> {
    async fn resolve(&self, locality: &LocalityName) -> Option<ResolvedBoundary> {
        info!("Resolving boundary for '{}'", locality);

        let variants = self.variants(locality).await;
        let scorer = Scorer::new(&self.aliases);
        let mut best = BestCandidate::new(&scorer);

        for variant in &variants {
            debug!("Trying query '{}' ({:?})", variant.query, variant.kind);
            let hits = match self.search.search_polygons(&variant.query).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Search for '{}' failed: {}", variant.query, e);
                    continue;
                }
            };

            for hit in hits {
                let Some(candidate) = BoundaryCandidate::from_hit(hit, &variant.query) else {
                    continue;
                };
                let area = candidate.area_km2;
                if best.offer(candidate) {
                    info!(
                        "New best boundary candidate: {:.2} km² from query '{}'",
                        area, variant.query
                    );
                }
            }
        }

        match best.into_best() {
            Some((candidate, score)) => {
                info!(
                    "Resolved '{}' to '{}' ({:.2} km², score {:.1})",
                    locality,
                    candidate.display_name,
                    candidate.area_km2,
                    score.total()
                );
                Some(ResolvedBoundary::from_candidate(
                    locality.clone(),
                    candidate,
                    score.total(),
                    Utc::now(),
                ))
            }
            None => {
                warn!("No suitable boundary polygon found for '{}'", locality);
                None
            }
        }
    }
}
