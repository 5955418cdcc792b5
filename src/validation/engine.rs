//! Runs every check over one collection in a fixed order.

use futures::FutureExt;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

use super::checks::{self, CheckError};
use crate::boundary::{BoundaryCache, Clock, ResolveBoundary, SystemClock};
use crate::cancel::CancelFlag;
use crate::config::ValidatorConfig;
use crate::models::{CheckResult, FeatureCollection, LocalityName};

type CheckFn = fn(&FeatureCollection, &ValidatorConfig) -> Result<CheckResult, CheckError>;

/// Checks that only look at the collection, in report order
const STRUCTURAL_CHECKS: [(&str, CheckFn); 6] = [
    (checks::FEATURE_COUNT, checks::feature_count),
    (checks::NULL_GEOMETRIES, checks::null_geometries),
    (checks::EMPTY_GEOMETRIES, checks::empty_geometries),
    (checks::GEOMETRY_VALIDITY, checks::geometry_validity),
    (checks::COORDINATE_SYSTEM, checks::coordinate_system),
    (checks::REGION_BOUNDS, checks::region_bounds),
];

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Collapse both failure paths of a check into its single result.
fn settle(
    name: &str,
    outcome: Result<Result<CheckResult, CheckError>, Box<dyn Any + Send>>,
) -> CheckResult {
    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!("Check '{}' failed to run: {}", name, e);
            CheckResult::critical(name, &e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Check '{}' panicked: {}", name, message);
            CheckResult::critical(name, &message)
        }
    }
}

/// Validation engine bound to a configuration and a shared boundary cache.
///
/// Every check produces exactly one result; a check that errors or panics
/// yields a critical result and the remaining checks still run.
pub struct ValidationEngine<'a, R, C = SystemClock> {
    config: &'a ValidatorConfig,
    cache: &'a BoundaryCache<R, C>,
}

impl<'a, R: ResolveBoundary, C: Clock> ValidationEngine<'a, R, C> {
    pub fn new(config: &'a ValidatorConfig, cache: &'a BoundaryCache<R, C>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &ValidatorConfig {
        self.config
    }

    pub fn cache(&self) -> &BoundaryCache<R, C> {
        self.cache
    }

    pub async fn validate(
        &self,
        collection: &FeatureCollection,
        locality: &LocalityName,
    ) -> Vec<CheckResult> {
        self.validate_with_cancel(collection, locality, &CancelFlag::new())
            .await
            .unwrap_or_default()
    }

    /// Like [`validate`](Self::validate), but returns `None` if `cancel`
    /// is raised before all checks have run.
    pub async fn validate_with_cancel(
        &self,
        collection: &FeatureCollection,
        locality: &LocalityName,
        cancel: &CancelFlag,
    ) -> Option<Vec<CheckResult>> {
        let mut results = Vec::with_capacity(STRUCTURAL_CHECKS.len() + 1);

        for (name, check) in STRUCTURAL_CHECKS {
            if cancel.is_cancelled() {
                return None;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| check(collection, self.config)));
            let result = settle(name, outcome);
            debug!("{}: passed={} {}", name, result.passed, result.message);
            results.push(result);
        }

        if cancel.is_cancelled() {
            return None;
        }
        let outcome = AssertUnwindSafe(self.boundary_check(collection, locality))
            .catch_unwind()
            .await;
        results.push(settle(checks::BOUNDARY, outcome));

        Some(results)
    }

    async fn boundary_check(
        &self,
        collection: &FeatureCollection,
        locality: &LocalityName,
    ) -> Result<CheckResult, CheckError> {
        if locality.is_unknown() {
            return Ok(CheckResult::fail(
                checks::BOUNDARY,
                "Cannot validate boundaries: locality unknown",
            )
            .with_detail("reason", "locality_unknown"));
        }

        let Some(boundary) = self.cache.get_or_resolve(locality).await else {
            return Ok(CheckResult::fail(
                checks::BOUNDARY,
                format!("Boundary unavailable for {}", locality),
            )
            .with_detail("reason", "boundary_unavailable")
            .with_detail("locality", locality.as_str()));
        };

        checks::boundary_containment(collection, &boundary)
    }
}
