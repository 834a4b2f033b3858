use crate::models::{Coordinate, Geometry};

/// Resolves a geometry to a single marker coordinate.
///
/// Polygons use the arithmetic mean of the outer ring's vertices
/// (holes ignored); multi-polygons use the first polygon's outer ring
/// only. This is a vertex average, not an area-weighted centroid; it
/// is good enough for marker placement and kept that way on purpose.
/// Anything that is not a point or (multi-)polygon is unplaceable.
pub fn centroid(geometry: &Geometry) -> Option<Coordinate> {
    match geometry {
        Geometry::Point { coordinates } => Some(Coordinate {
            lng: coordinates[0],
            lat: coordinates[1],
        }),
        Geometry::Polygon { coordinates } => ring_average(coordinates.first()?),
        Geometry::MultiPolygon { coordinates } => {
            ring_average(coordinates.first()?.first()?)
        }
        _ => None,
    }
}

fn ring_average(ring: &[[f64; 2]]) -> Option<Coordinate> {
    if ring.is_empty() {
        return None;
    }
    let mut lng = 0.0;
    let mut lat = 0.0;
    for vertex in ring {
        lng += vertex[0];
        lat += vertex[1];
    }
    let n = ring.len() as f64;
    Some(Coordinate {
        lng: lng / n,
        lat: lat / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_passes_through_exactly() {
        let geometry = Geometry::Point { coordinates: [2.1, 41.4] };
        assert_eq!(centroid(&geometry), Some(Coordinate { lng: 2.1, lat: 41.4 }));
    }

    #[test]
    fn polygon_averages_outer_ring_vertices() {
        let geometry = Geometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]]],
        };
        assert_eq!(centroid(&geometry), Some(Coordinate { lng: 1.0, lat: 1.0 }));
    }

    #[test]
    fn polygon_holes_are_ignored() {
        let geometry = Geometry::Polygon {
            coordinates: vec![
                vec![[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]],
                vec![[100.0, 100.0], [101.0, 100.0], [101.0, 101.0]],
            ],
        };
        assert_eq!(centroid(&geometry), Some(Coordinate { lng: 1.0, lat: 1.0 }));
    }

    #[test]
    fn multipolygon_uses_first_polygon_only() {
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]]],
                vec![vec![[50.0, 50.0], [52.0, 50.0], [52.0, 52.0]]],
            ],
        };
        assert_eq!(centroid(&geometry), Some(Coordinate { lng: 1.0, lat: 1.0 }));
    }

    #[test]
    fn linestring_is_unplaceable() {
        let geometry = Geometry::LineString {
            coordinates: vec![[0.0, 0.0], [1.0, 1.0]],
        };
        assert_eq!(centroid(&geometry), None);
    }

    #[test]
    fn unsupported_is_unplaceable() {
        assert_eq!(centroid(&Geometry::Unsupported), None);
    }

    #[test]
    fn empty_outer_ring_is_unplaceable() {
        let polygon = Geometry::Polygon { coordinates: vec![vec![]] };
        assert_eq!(centroid(&polygon), None);
        let empty = Geometry::Polygon { coordinates: vec![] };
        assert_eq!(centroid(&empty), None);
        let multi = Geometry::MultiPolygon { coordinates: vec![vec![]] };
        assert_eq!(centroid(&multi), None);
    }
}
