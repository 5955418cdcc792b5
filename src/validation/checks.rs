//! Individual checks over a feature collection.
//!
//! Each check yields exactly one [`CheckResult`]. An `Err` means the check
//! itself could not run; the engine turns it into a critical result.

use thiserror::Error;

use crate::boundary::ResolvedBoundary;
use crate::config::ValidatorConfig;
use crate::geometry::{kernel, normalize_crs};
use crate::models::{CheckResult, FeatureCollection};

pub const FEATURE_COUNT: &str = "feature_count";
pub const NULL_GEOMETRIES: &str = "null_geometries";
pub const EMPTY_GEOMETRIES: &str = "empty_geometries";
pub const GEOMETRY_VALIDITY: &str = "geometry_validity";
pub const COORDINATE_SYSTEM: &str = "coordinate_system";
pub const REGION_BOUNDS: &str = "region_bounds";
pub const BOUNDARY: &str = "geographic_boundary_check";

/// Offending indices listed in a detail map, at most
const MAX_LISTED_INDICES: usize = 50;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("non-finite coordinates in bounding box")]
    NonFinite,
    #[error("resolved boundary is a {0}, not a polygon")]
    BoundaryNotPolygonal(&'static str),
}

fn listed(indices: &[usize]) -> serde_json::Value {
    indices
        .iter()
        .take(MAX_LISTED_INDICES)
        .copied()
        .collect::<Vec<_>>()
        .into()
}

/// Non-empty collection with a feature count inside the configured bounds
pub fn feature_count(
    collection: &FeatureCollection,
    config: &ValidatorConfig,
) -> Result<CheckResult, CheckError> {
    let count = collection.len();
    let (min, max) = (config.min_feature_count, config.max_feature_count);

    let result = if count == 0 {
        CheckResult::fail(FEATURE_COUNT, "Collection has no features")
    } else if count < min {
        CheckResult::fail(FEATURE_COUNT, format!("Too few features: {} < {}", count, min))
    } else if count > max {
        CheckResult::fail(FEATURE_COUNT, format!("Too many features: {} > {}", count, max))
    } else {
        CheckResult::pass(FEATURE_COUNT, format!("Feature count OK: {}", count))
    };
    Ok(result.with_detail("feature_count", count))
}

pub fn null_geometries(
    collection: &FeatureCollection,
    _config: &ValidatorConfig,
) -> Result<CheckResult, CheckError> {
    let nulls: Vec<usize> = collection
        .features
        .iter()
        .enumerate()
        .filter(|(_, f)| f.geometry.is_none())
        .map(|(i, _)| i)
        .collect();

    if nulls.is_empty() {
        return Ok(CheckResult::pass(NULL_GEOMETRIES, "No null geometries"));
    }
    Ok(CheckResult::fail(
        NULL_GEOMETRIES,
        format!("{} features have null geometry", nulls.len()),
    )
    .with_detail("count", nulls.len())
    .with_detail("indices", listed(&nulls)))
}

pub fn empty_geometries(
    collection: &FeatureCollection,
    _config: &ValidatorConfig,
) -> Result<CheckResult, CheckError> {
    let empties: Vec<usize> = collection
        .geometries()
        .filter(|(_, g)| kernel::is_empty(g))
        .map(|(i, _)| i)
        .collect();

    if empties.is_empty() {
        return Ok(CheckResult::pass(EMPTY_GEOMETRIES, "No empty geometries"));
    }
    Ok(CheckResult::fail(
        EMPTY_GEOMETRIES,
        format!("{} features have empty geometry", empties.len()),
    )
    .with_detail("count", empties.len())
    .with_detail("indices", listed(&empties)))
}

/// Null and empty geometries are left to their own checks
pub fn geometry_validity(
    collection: &FeatureCollection,
    _config: &ValidatorConfig,
) -> Result<CheckResult, CheckError> {
    let invalid: Vec<usize> = collection
        .geometries()
        .filter(|(_, g)| !kernel::is_empty(g) && !kernel::is_valid(g))
        .map(|(i, _)| i)
        .collect();

    if invalid.is_empty() {
        return Ok(CheckResult::pass(GEOMETRY_VALIDITY, "All geometries are valid"));
    }
    Ok(CheckResult::fail(
        GEOMETRY_VALIDITY,
        format!("{} invalid geometries found", invalid.len()),
    )
    .with_detail("count", invalid.len())
    .with_detail("indices", listed(&invalid)))
}

pub fn coordinate_system(
    collection: &FeatureCollection,
    config: &ValidatorConfig,
) -> Result<CheckResult, CheckError> {
    let expected = normalize_crs(&config.required_crs);
    let result = match collection.crs.as_deref().map(normalize_crs) {
        None => CheckResult::fail(COORDINATE_SYSTEM, "No CRS defined"),
        Some(crs) if crs != expected => CheckResult::fail(
            COORDINATE_SYSTEM,
            format!("Wrong CRS: {}, expected {}", crs, expected),
        )
        .with_detail("crs", crs),
        Some(crs) => CheckResult::pass(COORDINATE_SYSTEM, format!("Correct CRS: {}", crs)),
    };
    Ok(result)
}

/// Combined bounding box must lie inside the configured region envelope
pub fn region_bounds(
    collection: &FeatureCollection,
    config: &ValidatorConfig,
) -> Result<CheckResult, CheckError> {
    let Some(bbox) = kernel::combined_bounding_box(collection.geometries().map(|(_, g)| g))
    else {
        return Ok(CheckResult::fail(REGION_BOUNDS, "No coordinates to check"));
    };

    let (min_x, min_y, max_x, max_y) = bbox;
    if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
        return Err(CheckError::NonFinite);
    }

    let bounds = serde_json::json!([min_x, min_y, max_x, max_y]);
    if config.region.contains_bbox(bbox) {
        return Ok(
            CheckResult::pass(REGION_BOUNDS, "Coordinates within region bounds")
                .with_detail("bounds", bounds),
        );
    }
    Ok(CheckResult::fail(
        REGION_BOUNDS,
        format!(
            "Coordinates outside region bounds: [{:.6}, {:.6}, {:.6}, {:.6}]",
            min_x, min_y, max_x, max_y
        ),
    )
    .with_detail("bounds", bounds))
}

/// Lenient containment: passes when every feature at least intersects the
/// boundary. Null geometries count as not intersecting.
pub fn boundary_containment(
    collection: &FeatureCollection,
    boundary: &ResolvedBoundary,
) -> Result<CheckResult, CheckError> {
    if !kernel::is_areal(&boundary.geometry) {
        return Err(CheckError::BoundaryNotPolygonal(kernel::type_name(
            &boundary.geometry,
        )));
    }

    let total = collection.len();
    let mut within = 0usize;
    let mut outside: Vec<usize> = Vec::new();

    for (index, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            outside.push(index);
            continue;
        };
        if kernel::intersects(geometry, &boundary.geometry) {
            if kernel::within(geometry, &boundary.geometry) {
                within += 1;
            }
        } else {
            outside.push(index);
        }
    }

    let intersecting = total - outside.len();
    let locality = &boundary.locality;

    let result = if outside.is_empty() {
        CheckResult::pass(
            BOUNDARY,
            format!(
                "All {} features intersect with {} boundary",
                total, locality
            ),
        )
    } else {
        CheckResult::fail(
            BOUNDARY,
            format!(
                "{} of {} features fall outside {} boundary",
                outside.len(),
                total,
                locality
            ),
        )
        .with_detail("outside_indices", listed(&outside))
    };

    let result = match boundary.centroid() {
        Some((x, y)) => result.with_detail("boundary_centroid", serde_json::json!([x, y])),
        None => result,
    };

    Ok(result
        .with_detail("total_features", total)
        .with_detail("features_within", within)
        .with_detail("features_intersecting", intersecting)
        .with_detail("features_outside", outside.len())
        .with_detail("boundary_area_km2", boundary.area_km2)
        .with_detail("boundary_display_name", boundary.display_name.as_str())
        .with_detail("boundary_query", boundary.query.as_str()))
}
