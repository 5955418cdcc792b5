//! Thin adapters over `geo` for the structural and spatial predicates the
//! checks and the boundary scorer need.

use geo::{
    BoundingRect, Centroid, ChamberlainDuquetteArea, Geometry, HasDimensions, Intersects, Relate,
    Validation,
};

/// Bounding box as `(min_x, min_y, max_x, max_y)`
pub type BBox = (f64, f64, f64, f64);

const M2_PER_KM2: f64 = 1_000_000.0;

/// No self-intersections, closed rings, finite coordinates, etc.
pub fn is_valid(geometry: &Geometry<f64>) -> bool {
    geometry.is_valid()
}

pub fn is_empty(geometry: &Geometry<f64>) -> bool {
    geometry.is_empty()
}

/// Polygon or MultiPolygon, the only shapes accepted as boundaries
pub fn is_areal(geometry: &Geometry<f64>) -> bool {
    matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
}

pub fn type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

pub fn bounding_box(geometry: &Geometry<f64>) -> Option<BBox> {
    geometry
        .bounding_rect()
        .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

/// Union of the bounding boxes of all non-empty geometries
pub fn combined_bounding_box<'a, I>(geometries: I) -> Option<BBox>
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    geometries
        .into_iter()
        .filter_map(bounding_box)
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
}

/// Approximate area on the sphere in km². Used to compare candidates only;
/// non-areal geometries have zero area.
pub fn area_km2(geometry: &Geometry<f64>) -> f64 {
    let m2 = match geometry {
        Geometry::Polygon(p) => p.chamberlain_duquette_unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.chamberlain_duquette_unsigned_area(),
        _ => 0.0,
    };
    m2 / M2_PER_KM2
}

pub fn centroid(geometry: &Geometry<f64>) -> Option<(f64, f64)> {
    geometry.centroid().map(|p| (p.x(), p.y()))
}

/// Any shared interior or boundary point
pub fn intersects(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    a.intersects(b)
}

/// `a` lies completely inside `b`
pub fn within(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    a.relate(b).is_within()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use geo::{polygon, Coord, LineString, Polygon};

    pub(crate) fn square(min_x: f64, min_y: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
            (x: min_x, y: min_y),
        ])
    }

    #[test]
    fn test_bowtie_is_invalid() {
        let bowtie = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 0.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        ));
        assert!(!is_valid(&bowtie));
        assert!(is_valid(&square(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_empty_polygon() {
        let empty = Geometry::Polygon(Polygon::new(LineString::new(vec![]), vec![]));
        assert!(is_empty(&empty));
        assert!(!is_empty(&square(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_combined_bbox() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, -2.0, 1.0);
        assert_eq!(combined_bounding_box([&a, &b]), Some((0.0, -2.0, 6.0, 1.0)));
        assert_eq!(combined_bounding_box(std::iter::empty()), None);
    }

    #[test]
    fn test_area_one_degree_at_equator() {
        // One degree square at the equator is roughly 12,300 km²
        let area = area_km2(&square(0.0, 0.0, 1.0));
        assert!(area > 12_000.0 && area < 12_500.0, "area was {}", area);
        assert_eq!(area_km2(&Geometry::Point(geo::point!(x: 0.0, y: 0.0))), 0.0);
    }

    #[test]
    fn test_touching_intersects_but_not_within() {
        let boundary = square(0.0, 0.0, 1.0);
        let touching = square(1.0, 0.0, 1.0);
        let inside = square(0.25, 0.25, 0.5);
        let outside = square(3.0, 3.0, 1.0);

        assert!(intersects(&touching, &boundary));
        assert!(!within(&touching, &boundary));
        assert!(intersects(&inside, &boundary));
        assert!(within(&inside, &boundary));
        assert!(!intersects(&outside, &boundary));
    }
}
