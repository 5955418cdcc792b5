//! Locality boundary matching.
//!
//! Resolves a locality name to the polygon of its administrative extent by
//! searching a geocoder under several name variants and ranking the
//! returned polygons. Resolved outcomes are memoized in a [`BoundaryCache`].

mod aliases;
mod cache;
mod resolver;
pub mod scoring;
pub mod variants;

pub use aliases::{AliasEntry, AliasTable, LargeMunicipality};
pub use cache::{BoundaryCache, Clock, SystemClock};
pub use resolver::{BoundaryResolver, ResolveBoundary, ResolvedBoundary};
pub use scoring::{select_best, BoundaryCandidate, CandidateScore, Scorer};
pub use variants::{generate_variants, Discovery, NameVariant, VariantKind, MAX_VARIANTS};

#[cfg(test)]
pub(crate) use resolver::tests as resolver_tests;
