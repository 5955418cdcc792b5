//! Geometric and metadata validation of feature collections.

pub mod checks;
mod engine;

pub use checks::CheckError;
pub use engine::ValidationEngine;
