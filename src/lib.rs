//! Boundcheck - GeoJSON boundary matching and geometric validation
//!
//! This library resolves locality names to administrative boundaries via a
//! geocoder and validates feature collections against them. The `validate`
//! binary drives it over a directory of files.

pub mod batch;
pub mod boundary;
mod cancel;
pub mod config;
pub mod geometry;
pub mod models;
pub mod nominatim;
pub mod report;
pub mod validation;

pub use batch::{run_batch, validate_file, FileIdentifier};
pub use boundary::{BoundaryCache, BoundaryResolver, ResolvedBoundary};
pub use cancel::CancelFlag;
pub use config::ValidatorConfig;
pub use models::{CheckResult, FeatureCollection, FileReport, LocalityName};
pub use validation::ValidationEngine;
