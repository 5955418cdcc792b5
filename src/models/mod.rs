//! Core data models for the validator.

pub mod collection;
pub mod report;

pub use collection::{Feature, FeatureCollection, LocalityName, UNKNOWN_LOCALITY};
pub use report::{CheckResult, FileReport, OverallStatus, ResultKind};
